//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that text order
//! matches time order. Days are stored as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rollcall_core::{event::AttendanceEvent, subject::Subject};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_day(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str =
  "id, scan_token, name, registration_number, email, qr_code";

pub fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
  Ok(Subject {
    id:                  row.get(0)?,
    scan_token:          row.get(1)?,
    name:                row.get(2)?,
    registration_number: row.get(3)?,
    email:               row.get(4)?,
    qr_code:             row.get(5)?,
  })
}

pub const EVENT_COLUMNS: &str =
  "scan_token, subject_id, name, registration_number, email, occurred_at, day";

/// Raw strings read directly from an `attendance` row.
pub struct RawEvent {
  pub scan_token:          String,
  pub subject_id:          String,
  pub name:                String,
  pub registration_number: Option<String>,
  pub email:               String,
  pub occurred_at:         String,
  pub day:                 String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      scan_token:          row.get(0)?,
      subject_id:          row.get(1)?,
      name:                row.get(2)?,
      registration_number: row.get(3)?,
      email:               row.get(4)?,
      occurred_at:         row.get(5)?,
      day:                 row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      scan_token:          self.scan_token,
      subject_id:          self.subject_id,
      name:                self.name,
      registration_number: self.registration_number,
      email:               self.email,
      occurred_at:         decode_dt(&self.occurred_at)?,
      day:                 decode_day(&self.day)?,
    })
  }
}
