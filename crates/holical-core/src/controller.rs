use std::fmt;
use std::str::FromStr;

use anyhow::{
  anyhow,
  ensure
};
use chrono::{
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::aggregate::{
  Aggregator,
  MonthHolidayGroup,
  QuarterHolidayGroup,
  quarter_months,
  quarter_of
};
use crate::calendar::{
  CalendarDate,
  ensure_month,
  ensure_year,
  month_name,
  partition_month
};
use crate::density::{
  DensityTier,
  classify
};
use crate::holiday::{
  Country,
  Holiday,
  HolidayIndex
};
use crate::source::HolidaySource;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  Monthly,
  Quarterly
}

impl ViewMode {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Monthly => "monthly",
      | Self::Quarterly => "quarterly"
    }
  }

  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Self::Monthly => "Monthly",
      | Self::Quarterly => "Quarterly"
    }
  }

  #[must_use]
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "monthly" | "month" => {
        Some(Self::Monthly)
      }
      | "quarterly" | "quarter" => {
        Some(Self::Quarterly)
      }
      | _ => None
    }
  }
}

impl FromStr for ViewMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(s).ok_or_else(|| {
      anyhow!(
        "unknown view mode {s:?}: \
         expected monthly or quarterly"
      )
    })
  }
}

impl fmt::Display for ViewMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

/// Where "today" is read from when
/// marking day cells.
#[derive(Debug, Clone, Copy)]
pub enum TodaySource {
  Local,
  Zone(Tz),
  Fixed(NaiveDate)
}

impl TodaySource {
  #[must_use]
  pub fn from_timezone(
    timezone: Option<Tz>
  ) -> Self {
    timezone
      .map(Self::Zone)
      .unwrap_or(Self::Local)
  }

  #[must_use]
  pub fn today(self) -> NaiveDate {
    match self {
      | Self::Local => {
        chrono::Local::now().date_naive()
      }
      | Self::Zone(tz) => {
        Utc::now()
          .with_timezone(&tz)
          .date_naive()
      }
      | Self::Fixed(date) => date
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct ViewState {
  pub year:         i32,
  pub country:      String,
  pub view_mode:    ViewMode,
  pub month_filter: u32
}

impl ViewState {
  pub fn new(
    year: i32,
    country: &str,
    view_mode: ViewMode,
    month_filter: u32
  ) -> anyhow::Result<Self> {
    ensure_month(month_filter)?;
    ensure_year(year)?;
    Ok(Self {
      year,
      country: normalize_country(
        country
      )?,
      view_mode,
      month_filter
    })
  }
}

fn normalize_country(
  raw: &str
) -> anyhow::Result<String> {
  let code = raw.trim();
  ensure!(
    !code.is_empty(),
    "country code cannot be empty"
  );
  Ok(code.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  SetYear(i32),
  SetCountry(String),
  SetMonthFilter(u32),
  SetViewMode(ViewMode)
}

/// A holiday fetch the caller must
/// perform and hand back through
/// [`ViewController::complete_holidays`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub token:   u64,
  pub country: String,
  pub year:    i32
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct DayCell {
  pub date:     CalendarDate,
  pub holidays: Vec<Holiday>,
  pub is_today: bool
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct WeekRow {
  pub leading_blanks: u32,
  pub days:           Vec<DayCell>,
  pub tier:           DensityTier
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct MonthGrid {
  pub month: u32,
  pub name:  &'static str,
  pub weeks: Vec<WeekRow>
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IndexPanel {
  Monthly(MonthHolidayGroup),
  Quarterly(QuarterHolidayGroup)
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct CalendarView {
  pub state:  ViewState,
  pub months: Vec<MonthGrid>,
  pub index:  IndexPanel
}

fn build_month_grid(
  year: i32,
  month: u32,
  index: &HolidayIndex,
  today: NaiveDate
) -> anyhow::Result<MonthGrid> {
  let weeks = partition_month(
    year, month
  )?
  .into_iter()
  .map(|week| {
    let days = week
      .days()
      .iter()
      .map(|date| {
        DayCell {
          date:     *date,
          holidays: index
            .holidays_on(*date)
            .into_iter()
            .cloned()
            .collect(),
          is_today: date.is_today(today)
        }
      })
      .collect();
    WeekRow {
      leading_blanks: week
        .leading_blanks(),
      days,
      tier: classify(&week, index)
    }
  })
  .collect();

  Ok(MonthGrid {
    month,
    name: month_name(month)?,
    weeks
  })
}

/// Derives every displayed structure
/// from one state and one holiday list.
pub fn build_view(
  state: &ViewState,
  index: &HolidayIndex,
  today: NaiveDate
) -> anyhow::Result<CalendarView> {
  let aggregator = Aggregator::new(index);
  let (months, panel) = match state
    .view_mode
  {
    | ViewMode::Monthly => {
      (
        vec![state.month_filter],
        IndexPanel::Monthly(
          aggregator.by_month(
            state.month_filter
          )?
        )
      )
    }
    | ViewMode::Quarterly => {
      let quarter =
        quarter_of(state.month_filter)?;
      (
        quarter_months(quarter)?
          .to_vec(),
        IndexPanel::Quarterly(
          aggregator
            .by_quarter(quarter)?
        )
      )
    }
  };

  let months = months
    .into_iter()
    .map(|month| {
      build_month_grid(
        state.year, month, index, today
      )
    })
    .collect::<anyhow::Result<Vec<_>>>(
    )?;

  Ok(CalendarView {
    state: state.clone(),
    months,
    index: panel
  })
}

type Listener = Box<dyn FnMut(&CalendarView)>;

pub struct ViewController {
  state:          ViewState,
  holidays:       HolidayIndex,
  countries:      Vec<Country>,
  today:          TodaySource,
  latest_request: u64,
  view:           CalendarView,
  listeners:      Vec<Listener>
}

impl ViewController {
  pub fn new(
    state: ViewState,
    today: TodaySource
  ) -> anyhow::Result<Self> {
    let holidays = HolidayIndex::default();
    let view = build_view(
      &state,
      &holidays,
      today.today()
    )?;
    Ok(Self {
      state,
      holidays,
      countries: vec![],
      today,
      latest_request: 0,
      view,
      listeners: vec![]
    })
  }

  #[must_use]
  pub fn state(&self) -> &ViewState {
    &self.state
  }

  #[must_use]
  pub fn view(&self) -> &CalendarView {
    &self.view
  }

  #[must_use]
  pub fn holidays(
    &self
  ) -> &HolidayIndex {
    &self.holidays
  }

  #[must_use]
  pub fn countries(&self) -> &[Country] {
    &self.countries
  }

  pub fn subscribe<F>(
    &mut self,
    listener: F
  ) where
    F: FnMut(&CalendarView) + 'static
  {
    self.listeners.push(Box::new(
      listener
    ));
  }

  /// Issues a fetch for the current
  /// (country, year). Any request issued
  /// earlier becomes stale.
  pub fn request_holidays(
    &mut self
  ) -> FetchRequest {
    self.latest_request += 1;
    let request = FetchRequest {
      token:   self.latest_request,
      country: self.state.country.clone(),
      year:    self.state.year
    };
    debug!(
      token = request.token,
      country = %request.country,
      year = request.year,
      "issued holiday request"
    );
    request
  }

  #[must_use]
  pub fn is_current(
    &self,
    request: &FetchRequest
  ) -> bool {
    request.token == self.latest_request
  }

  /// Validates the action and derives
  /// the next view before touching any
  /// state; a rejected action leaves the
  /// controller exactly as it was.
  #[tracing::instrument(skip(self))]
  pub fn dispatch(
    &mut self,
    action: Action
  ) -> anyhow::Result<Option<FetchRequest>>
  {
    let mut next = self.state.clone();
    let refetch = match action {
      | Action::SetYear(year) => {
        ensure_year(year)?;
        next.year = year;
        true
      }
      | Action::SetCountry(raw) => {
        next.country =
          normalize_country(&raw)?;
        true
      }
      | Action::SetMonthFilter(month) => {
        ensure_month(month)?;
        next.month_filter = month;
        false
      }
      | Action::SetViewMode(mode) => {
        next.view_mode = mode;
        false
      }
    };

    if next == self.state {
      return Ok(None);
    }

    if !refetch {
      let view = build_view(
        &next,
        &self.holidays,
        self.today.today()
      )?;
      self.state = next;
      self.commit(view);
      return Ok(None);
    }

    let holidays = HolidayIndex::default();
    let view = build_view(
      &next,
      &holidays,
      self.today.today()
    )?;
    self.state = next;
    self.holidays = holidays;
    let request = self.request_holidays();
    self.commit(view);
    Ok(Some(request))
  }

  /// Applies a fetch result. Returns
  /// `false` when the response belongs
  /// to a superseded request and was
  /// dropped. A failed fetch leaves the
  /// calendar empty.
  #[tracing::instrument(skip(self, result), fields(token = request.token))]
  pub fn complete_holidays(
    &mut self,
    request: &FetchRequest,
    result: anyhow::Result<Vec<Holiday>>
  ) -> anyhow::Result<bool> {
    if !self.is_current(request) {
      debug!(
        latest = self.latest_request,
        "discarding stale holiday \
         response"
      );
      return Ok(false);
    }

    let holidays = match result {
      | Ok(holidays) => {
        info!(
          country = %request.country,
          year = request.year,
          count = holidays.len(),
          "loaded holidays"
        );
        HolidayIndex::new(holidays)
      }
      | Err(error) => {
        warn!(
          country = %request.country,
          year = request.year,
          error = %format!("{error:#}"),
          "holiday fetch failed; showing \
           empty calendar"
        );
        HolidayIndex::default()
      }
    };
    let view = build_view(
      &self.state,
      &holidays,
      self.today.today()
    )?;
    self.holidays = holidays;
    self.commit(view);
    Ok(true)
  }

  pub fn complete_countries(
    &mut self,
    result: anyhow::Result<Vec<Country>>
  ) {
    self.countries = match result {
      | Ok(countries) => {
        info!(
          count = countries.len(),
          "loaded country list"
        );
        countries
      }
      | Err(error) => {
        warn!(
          error = %format!("{error:#}"),
          "country fetch failed; using \
           empty list"
        );
        vec![]
      }
    };
  }

  pub async fn refresh<S>(
    &mut self,
    source: &S
  ) -> anyhow::Result<bool>
  where
    S: HolidaySource + ?Sized
  {
    let request = self.request_holidays();
    self.fetch_and_complete(source, request)
      .await
  }

  pub async fn apply<S>(
    &mut self,
    action: Action,
    source: &S
  ) -> anyhow::Result<()>
  where
    S: HolidaySource + ?Sized
  {
    if let Some(request) =
      self.dispatch(action)?
    {
      self
        .fetch_and_complete(
          source, request
        )
        .await?;
    }
    Ok(())
  }

  pub async fn load_countries<S>(
    &mut self,
    source: &S
  ) where
    S: HolidaySource + ?Sized
  {
    let result =
      source.list_countries().await;
    self.complete_countries(result);
  }

  async fn fetch_and_complete<S>(
    &mut self,
    source: &S,
    request: FetchRequest
  ) -> anyhow::Result<bool>
  where
    S: HolidaySource + ?Sized
  {
    let result = source
      .list_holidays(
        &request.country,
        request.year
      )
      .await;
    self.complete_holidays(&request, result)
  }

  fn commit(
    &mut self,
    view: CalendarView
  ) {
    self.view = view;
    for listener in &mut self.listeners {
      listener(&self.view);
    }
  }
}
