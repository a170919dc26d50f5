use std::cell::RefCell;
use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::NaiveDate;
use holical_core::controller::{Action, IndexPanel, TodaySource, ViewController, ViewMode, ViewState};
use holical_core::density::DensityTier;
use holical_core::holiday::{Country, Holiday};
use holical_core::render::Renderer;
use holical_core::source::HolidaySource;

#[derive(Default)]
struct FakeSource {
    holidays: BTreeMap<(String, i32), Vec<Holiday>>,
    countries: Option<Vec<Country>>,
    calls: RefCell<Vec<(String, i32)>>,
}

impl HolidaySource for FakeSource {
    async fn list_holidays(&self, country: &str, year: i32) -> anyhow::Result<Vec<Holiday>> {
        self.calls.borrow_mut().push((country.to_string(), year));
        self.holidays
            .get(&(country.to_string(), year))
            .cloned()
            .ok_or_else(|| anyhow!("connection refused"))
    }

    async fn list_countries(&self) -> anyhow::Result<Vec<Country>> {
        self.countries.clone().ok_or_else(|| anyhow!("connection refused"))
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn source() -> FakeSource {
    let mut holidays = BTreeMap::new();
    holidays.insert(
        ("IN".to_string(), 2024),
        vec![
            Holiday::new(ymd(2024, 1, 1), "New Year"),
            Holiday::new(ymd(2024, 1, 26), "Republic Day"),
            Holiday::new(ymd(2024, 4, 10), "Eid"),
            Holiday::new(ymd(2024, 4, 10), "Local Festival"),
        ],
    );
    FakeSource {
        holidays,
        countries: Some(vec![Country {
            country_code: "IN".to_string(),
            name: "India".to_string(),
        }]),
        calls: RefCell::new(vec![]),
    }
}

fn controller(month: u32) -> ViewController {
    let state = ViewState::new(2024, "IN", ViewMode::Monthly, month).expect("state");
    ViewController::new(state, TodaySource::Fixed(ymd(2024, 6, 1))).expect("controller")
}

#[tokio::test]
async fn refresh_then_filter_changes() {
    let source = source();
    let mut ctl = controller(1);

    ctl.load_countries(&source).await;
    assert_eq!(ctl.countries()[0].name, "India");

    assert!(ctl.refresh(&source).await.expect("refresh"));
    let IndexPanel::Monthly(group) = &ctl.view().index else {
        panic!("expected monthly index");
    };
    let names: Vec<&str> = group.holidays.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["New Year", "Republic Day"]);

    ctl.apply(Action::SetMonthFilter(4), &source).await.expect("month");
    ctl.apply(Action::SetViewMode(ViewMode::Quarterly), &source)
        .await
        .expect("view");
    assert_eq!(source.calls.borrow().len(), 1);

    let april = ctl
        .view()
        .months
        .iter()
        .find(|m| m.month == 4)
        .expect("april grid");
    let eid_week = april
        .weeks
        .iter()
        .find(|w| w.days.iter().any(|d| d.date.day() == 10))
        .expect("eid week");
    assert_eq!(eid_week.tier, DensityTier::Single);
    let eid_day = eid_week
        .days
        .iter()
        .find(|d| d.date.day() == 10)
        .expect("apr 10");
    assert_eq!(eid_day.holidays.len(), 2);
}

#[tokio::test]
async fn failed_fetch_leaves_usable_empty_calendar() {
    let source = source();
    let mut ctl = controller(1);
    ctl.refresh(&source).await.expect("refresh");
    assert_eq!(ctl.holidays().len(), 4);

    ctl.apply(Action::SetCountry("XX".to_string()), &source)
        .await
        .expect("country");
    assert!(ctl.holidays().is_empty());
    assert!(ctl.view().months[0]
        .weeks
        .iter()
        .all(|w| w.tier == DensityTier::None));
    assert_eq!(
        *source.calls.borrow(),
        vec![("IN".to_string(), 2024), ("XX".to_string(), 2024)]
    );

    let empty = FakeSource::default();
    ctl.load_countries(&empty).await;
    assert!(ctl.countries().is_empty());
}

#[tokio::test]
async fn activation_loads_countries_for_the_header() {
    let source = source();
    let mut ctl = controller(1);
    ctl.load_countries(&source).await;
    ctl.refresh(&source).await.expect("refresh");

    let mut out = Vec::new();
    Renderer::plain()
        .write_view(&mut out, ctl.view(), ctl.countries())
        .expect("render");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("India (IN) 2024 (Monthly)\n"));
}
