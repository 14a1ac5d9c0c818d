//! Calendar-day bucketing for attendance timestamps.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which clock decides where one attendance day ends and the next begins.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayBoundary {
  /// The server's local time zone.
  #[default]
  Local,
  Utc,
}

impl DayBoundary {
  /// The calendar date `at` falls on.
  pub fn day_of(self, at: DateTime<Utc>) -> NaiveDate {
    match self {
      Self::Local => at.with_timezone(&Local).date_naive(),
      Self::Utc => at.date_naive(),
    }
  }

  /// Wall-clock time of `at` as `HH:MM:SS`.
  pub fn time_of(self, at: DateTime<Utc>) -> String {
    match self {
      Self::Local => at.with_timezone(&Local).format("%H:%M:%S").to_string(),
      Self::Utc => at.format("%H:%M:%S").to_string(),
    }
  }

  pub fn today(self) -> NaiveDate { self.day_of(Utc::now()) }
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn parse_day(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn utc_boundary_truncates_to_date() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
    assert_eq!(
      DayBoundary::Utc.day_of(at),
      NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    );
    assert_eq!(DayBoundary::Utc.time_of(at), "23:59:59");
  }

  #[test]
  fn boundary_parses_from_config_strings() {
    assert_eq!("utc".parse::<DayBoundary>().unwrap(), DayBoundary::Utc);
    assert_eq!("local".parse::<DayBoundary>().unwrap(), DayBoundary::Local);
    assert!("mars".parse::<DayBoundary>().is_err());
  }

  #[test]
  fn parse_day_accepts_iso_dates_only() {
    assert_eq!(
      parse_day("2024-01-31"),
      NaiveDate::from_ymd_opt(2024, 1, 31)
    );
    assert!(parse_day("31/01/2024").is_none());
    assert!(parse_day("2024-02-30").is_none());
  }
}
