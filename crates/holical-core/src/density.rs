use serde::Serialize;

use crate::calendar::{
  CalendarDate,
  Week
};
use crate::holiday::HolidayIndex;

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
#[serde(rename_all = "lowercase")]
pub enum DensityTier {
  None,
  Single,
  Multiple
}

impl DensityTier {
  #[must_use]
  pub fn from_holiday_days(
    count: usize
  ) -> Self {
    match count {
      | 0 => Self::None,
      | 1 => Self::Single,
      | _ => Self::Multiple
    }
  }

  #[must_use]
  pub fn legend(
    self
  ) -> Option<&'static str> {
    match self {
      | Self::None => None,
      | Self::Single => {
        Some("1 holiday in week")
      }
      | Self::Multiple => Some(
        "More than 1 holiday in week"
      )
    }
  }
}

pub trait HolidayLookup {
  fn has_holiday_on(
    &self,
    date: CalendarDate
  ) -> bool;
}

impl HolidayLookup for HolidayIndex {
  fn has_holiday_on(
    &self,
    date: CalendarDate
  ) -> bool {
    HolidayIndex::has_holiday_on(
      self, date
    )
  }
}

/// Counts holiday-bearing days, not
/// holidays: two holidays on one day
/// still count once.
#[must_use]
pub fn holiday_day_count<L>(
  week: &Week,
  lookup: &L
) -> usize
where
  L: HolidayLookup + ?Sized
{
  week
    .days()
    .iter()
    .filter(|day| {
      lookup.has_holiday_on(**day)
    })
    .count()
}

#[must_use]
pub fn classify<L>(
  week: &Week,
  lookup: &L
) -> DensityTier
where
  L: HolidayLookup + ?Sized
{
  DensityTier::from_holiday_days(
    holiday_day_count(week, lookup)
  )
}
