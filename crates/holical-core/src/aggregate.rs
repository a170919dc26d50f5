use anyhow::ensure;
use serde::Serialize;

use crate::calendar::{
  ensure_month,
  month_name
};
use crate::holiday::{
  Holiday,
  HolidayIndex
};

pub const QUARTER_MONTHS: [[u32; 3]; 4] = [
  [1, 2, 3],
  [4, 5, 6],
  [7, 8, 9],
  [10, 11, 12]
];

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct MonthHolidayGroup {
  pub month:    u32,
  pub name:     &'static str,
  pub holidays: Vec<Holiday>
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct QuarterHolidayGroup {
  pub quarter: u32,
  pub months:  [MonthHolidayGroup; 3]
}

/// Selecting any month displays the
/// whole quarter it belongs to.
pub fn quarter_of(
  month: u32
) -> anyhow::Result<u32> {
  ensure_month(month)?;
  Ok(month.div_ceil(3))
}

pub fn quarter_months(
  quarter: u32
) -> anyhow::Result<[u32; 3]> {
  ensure!(
    (1..=4).contains(&quarter),
    "invalid quarter {quarter}: \
     expected 1-4"
  );
  Ok(QUARTER_MONTHS[(quarter - 1) as usize])
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
  index: &'a HolidayIndex
}

impl<'a> Aggregator<'a> {
  pub fn new(
    index: &'a HolidayIndex
  ) -> Self {
    Self { index }
  }

  pub fn by_month(
    &self,
    month: u32
  ) -> anyhow::Result<MonthHolidayGroup>
  {
    let name = month_name(month)?;
    let holidays = self
      .index
      .holidays_in_month(month)
      .into_iter()
      .cloned()
      .collect();
    Ok(MonthHolidayGroup {
      month,
      name,
      holidays
    })
  }

  pub fn by_quarter(
    &self,
    quarter: u32
  ) -> anyhow::Result<QuarterHolidayGroup>
  {
    let [first, second, third] =
      quarter_months(quarter)?;
    Ok(QuarterHolidayGroup {
      quarter,
      months: [
        self.by_month(first)?,
        self.by_month(second)?,
        self.by_month(third)?
      ]
    })
  }
}
