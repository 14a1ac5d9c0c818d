//! Attendance events: one row per subject per day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::subject::Subject;

/// A recorded instance of a subject being marked present.
///
/// The subject's fields are copied at mark time so reads never need a join,
/// and so reports still render after the subject set is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
  #[serde(rename = "qrId")]
  pub scan_token:          String,
  #[serde(rename = "studentId")]
  pub subject_id:          String,
  pub name:                String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registration_number: Option<String>,
  pub email:               String,
  #[serde(rename = "timestamp")]
  pub occurred_at:         DateTime<Utc>,
  /// Idempotency key together with `scan_token`.
  #[serde(rename = "date")]
  pub day:                 NaiveDate,
}

impl AttendanceEvent {
  /// Snapshot `subject` into a new event.
  pub fn for_subject(
    subject: &Subject,
    occurred_at: DateTime<Utc>,
    day: NaiveDate,
  ) -> Self {
    Self {
      scan_token: subject.scan_token.clone(),
      subject_id: subject.id.clone(),
      name: subject.name.clone(),
      registration_number: subject.registration_number.clone(),
      email: subject.email.clone(),
      occurred_at,
      day,
    }
  }
}

/// Sort newest first: by day, then by timestamp.
pub fn sort_newest_first(events: &mut [AttendanceEvent]) {
  events.sort_by(|a, b| {
    b.day
      .cmp(&a.day)
      .then_with(|| b.occurred_at.cmp(&a.occurred_at))
  });
}
