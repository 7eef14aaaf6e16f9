//! Date ranges and the named presets offered for picking them.

use chrono::{Datelike, Months, NaiveDate};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::api::QueryParams;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
  #[error("range start {start} is after its end {end}")]
  Inverted { start: NaiveDate, end: NaiveDate },
}

/// An inclusive span of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
  start: NaiveDate,
  end: NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
    if start > end {
      return Err(RangeError::Inverted { start, end });
    }
    Ok(Self { start, end })
  }

  /// Build a range from optional bounds.
  ///
  /// Returns `Ok(None)` while either bound is still unset.
  pub fn from_bounds(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Option<Self>, RangeError> {
    match (start, end) {
      (Some(start), Some(end)) => Self::new(start, end).map(Some),
      _ => Ok(None),
    }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn end(&self) -> NaiveDate {
    self.end
  }

  /// `happen_after` / `happen_before` parameters for this range
  pub fn query_params(&self) -> QueryParams {
    let mut query = QueryParams::new();
    query.insert("happen_after", self.start.format("%Y-%m-%d").to_string());
    query.insert("happen_before", self.end.format("%Y-%m-%d").to_string());
    query
  }
}

impl fmt::Display for DateRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}", self.start, self.end)
  }
}

/// Named ranges relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
  #[default]
  ThisMonth,
  LastMonth,
  ThisYear,
}

impl RangePreset {
  pub fn label(self) -> &'static str {
    match self {
      Self::ThisMonth => "This month",
      Self::LastMonth => "Last month",
      Self::ThisYear => "This year",
    }
  }

  /// Resolve to concrete dates, `today` being the anchor
  pub fn resolve(self, today: NaiveDate) -> DateRange {
    let month_start = today.with_day(1).unwrap_or(today);
    let (start, end) = match self {
      Self::ThisMonth => (month_start, last_day_of_month(month_start)),
      Self::LastMonth => {
        let start = month_start
          .checked_sub_months(Months::new(1))
          .unwrap_or(month_start);
        (start, last_day_of_month(start))
      }
      Self::ThisYear => (
        NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
      ),
    };
    DateRange { start, end }
  }
}

fn last_day_of_month(month_start: NaiveDate) -> NaiveDate {
  month_start
    .checked_add_months(Months::new(1))
    .and_then(|next| next.pred_opt())
    .unwrap_or(month_start)
}
