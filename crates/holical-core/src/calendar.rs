use std::fmt;

use anyhow::{
  anyhow,
  ensure
};
use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::Serialize;
use tracing::trace;

pub const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

/// Column headers for a Sunday-first grid.
pub const WEEKDAY_LABELS: [&str; 7] = [
  "Sun", "Mon", "Tue", "Wed", "Thu",
  "Fri", "Sat"
];

pub fn ensure_month(
  month: u32
) -> anyhow::Result<()> {
  ensure!(
    (1..=12).contains(&month),
    "invalid month {month}: expected \
     1-12"
  );
  Ok(())
}

/// Every month of `year` must be
/// representable, not just January.
pub fn ensure_year(
  year: i32
) -> anyhow::Result<()> {
  first_day_of_month(year, 1)?;
  last_day_of_month(year, 12)?;
  Ok(())
}

pub fn month_name(
  month: u32
) -> anyhow::Result<&'static str> {
  ensure_month(month)?;
  Ok(MONTH_NAMES[(month - 1) as usize])
}

/// A plain (year, month, day) value
/// without any timezone attached.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> anyhow::Result<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self)
    .ok_or_else(|| {
      anyhow!(
        "invalid calendar date \
         {year:04}-{month:02}-{day:02}"
      )
    })
  }

  #[must_use]
  pub fn naive(self) -> NaiveDate {
    self.0
  }

  #[must_use]
  pub fn year(self) -> i32 {
    self.0.year()
  }

  #[must_use]
  pub fn month(self) -> u32 {
    self.0.month()
  }

  #[must_use]
  pub fn day(self) -> u32 {
    self.0.day()
  }

  /// 0 = Sunday .. 6 = Saturday.
  #[must_use]
  pub fn day_of_week(self) -> u32 {
    self
      .0
      .weekday()
      .num_days_from_sunday()
  }

  #[must_use]
  pub fn is_saturday(self) -> bool {
    self.0.weekday() == Weekday::Sat
  }

  #[must_use]
  pub fn is_today(
    self,
    today: NaiveDate
  ) -> bool {
    self.0 == today
  }
}

impl From<NaiveDate> for CalendarDate {
  fn from(date: NaiveDate) -> Self {
    Self(date)
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format("%Y-%m-%d")
    )
  }
}

/// A contiguous run of days inside one
/// month, closed on Saturday or on the
/// month's last day.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
#[serde(transparent)]
pub struct Week {
  days: Vec<CalendarDate>
}

impl Week {
  #[must_use]
  pub fn days(&self) -> &[CalendarDate] {
    &self.days
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.days.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.days.is_empty()
  }

  #[must_use]
  pub fn first(
    &self
  ) -> Option<CalendarDate> {
    self.days.first().copied()
  }

  #[must_use]
  pub fn last(
    &self
  ) -> Option<CalendarDate> {
    self.days.last().copied()
  }

  /// Number of blank cells before the
  /// first day in a Sunday-first grid.
  #[must_use]
  pub fn leading_blanks(&self) -> u32 {
    self
      .first()
      .map(CalendarDate::day_of_week)
      .unwrap_or(0)
  }
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> anyhow::Result<NaiveDate> {
  ensure_month(month)?;
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .ok_or_else(|| {
    anyhow!(
      "year {year} is outside the \
       supported calendar range"
    )
  })
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> anyhow::Result<NaiveDate> {
  let first =
    first_day_of_month(year, month)?;
  if month == 12 {
    return first
      .with_day(31)
      .ok_or_else(|| {
        anyhow!(
          "invalid end of December \
           {year}"
        )
      });
  }

  first_day_of_month(year, month + 1)
    .ok()
    .and_then(|next| next.pred_opt())
    .ok_or_else(|| {
      anyhow!(
        "cannot resolve last day of \
         {year:04}-{month:02}"
      )
    })
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> anyhow::Result<u32> {
  Ok(
    last_day_of_month(year, month)?
      .day()
  )
}

#[tracing::instrument(level = "trace")]
pub fn partition_month(
  year: i32,
  month: u32
) -> anyhow::Result<Vec<Week>> {
  let first =
    first_day_of_month(year, month)?;
  let last =
    last_day_of_month(year, month)?;

  let mut weeks = Vec::with_capacity(6);
  let mut buffer =
    Vec::with_capacity(7);
  for day in first
    .iter_days()
    .take_while(|day| *day <= last)
  {
    let date = CalendarDate::from(day);
    buffer.push(date);
    if date.is_saturday() || day == last
    {
      weeks.push(Week {
        days: std::mem::take(
          &mut buffer
        )
      });
    }
  }

  trace!(
    year,
    month,
    weeks = weeks.len(),
    "partitioned month"
  );
  Ok(weeks)
}
