use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

impl Holiday {
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            local_name: None,
        }
    }

    /// Month and day only; the index is always scoped to one fetched year.
    fn falls_on(&self, date: CalendarDate) -> bool {
        self.date.month() == date.month() && self.date.day() == date.day()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub country_code: String,
    pub name: String,
}

/// Read-only view over the holiday list of the current (country, year)
/// selection. Source order is preserved by every query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayIndex {
    holidays: Vec<Holiday>,
}

impl HolidayIndex {
    pub fn new(holidays: Vec<Holiday>) -> Self {
        Self { holidays }
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    pub fn holidays_on(&self, date: CalendarDate) -> Vec<&Holiday> {
        self.holidays.iter().filter(|h| h.falls_on(date)).collect()
    }

    pub fn has_holiday_on(&self, date: CalendarDate) -> bool {
        self.holidays.iter().any(|h| h.falls_on(date))
    }

    pub fn holidays_in_month(&self, month: u32) -> Vec<&Holiday> {
        self.holidays
            .iter()
            .filter(|h| h.date.month() == month)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Holiday, HolidayIndex};
    use crate::calendar::CalendarDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn india_2024() -> HolidayIndex {
        HolidayIndex::new(vec![
            Holiday::new(ymd(2024, 1, 1), "New Year"),
            Holiday::new(ymd(2024, 1, 26), "Republic Day"),
            Holiday::new(ymd(2024, 4, 10), "Eid"),
            Holiday::new(ymd(2024, 4, 10), "Local Festival"),
            Holiday::new(ymd(2024, 8, 15), "Independence Day"),
        ])
    }

    #[test]
    fn month_query_keeps_source_order() {
        let index = india_2024();
        let names: Vec<&str> = index
            .holidays_in_month(1)
            .into_iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["New Year", "Republic Day"]);
        assert!(index.holidays_in_month(2).is_empty());
    }

    #[test]
    fn month_query_is_idempotent() {
        let index = india_2024();
        assert_eq!(index.holidays_in_month(4), index.holidays_in_month(4));
    }

    #[test]
    fn day_query_returns_every_holiday_on_that_day() {
        let index = india_2024();
        let date = CalendarDate::from_ymd(2024, 4, 10).expect("date");
        let names: Vec<&str> = index
            .holidays_on(date)
            .into_iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["Eid", "Local Festival"]);

        let quiet = CalendarDate::from_ymd(2024, 4, 11).expect("date");
        assert!(index.holidays_on(quiet).is_empty());
        assert!(!index.has_holiday_on(quiet));
    }

    #[test]
    fn day_query_ignores_year_component() {
        let index = india_2024();
        let date = CalendarDate::from_ymd(2025, 8, 15).expect("date");
        assert!(index.has_holiday_on(date));
    }

    #[test]
    fn decodes_source_payload() {
        let raw = r#"[
            {"date":"2024-01-01","name":"New Year","localName":"Naya Saal","countryCode":"IN"},
            {"date":"2024-01-26","name":"Republic Day"}
        ]"#;
        let holidays: Vec<Holiday> = serde_json::from_str(raw).expect("decode");
        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].date, ymd(2024, 1, 1));
        assert_eq!(holidays[0].local_name.as_deref(), Some("Naya Saal"));
        assert_eq!(holidays[1].local_name, None);
    }
}
