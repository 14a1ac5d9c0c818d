//! Marking attendance: at most one event per subject per day.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  Error, Result, day::DayBoundary, event::AttendanceEvent, store::RecordStore,
  subject::Subject,
};

/// The result of a successful mark.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkOutcome {
  /// `true` if the subject was already marked for that day and nothing was
  /// written.
  pub already_marked: bool,
  pub subject:        Subject,
}

/// Record that the subject behind `scan_token` was present.
///
/// The day is taken from `timestamp` (default: now) under `boundary`. A
/// second mark on the same day writes nothing and reports
/// `already_marked`, including when a concurrent request wins the insert.
pub async fn mark_attendance<S>(
  store: &S,
  boundary: DayBoundary,
  scan_token: &str,
  timestamp: Option<DateTime<Utc>>,
) -> Result<MarkOutcome>
where
  S: RecordStore,
{
  let scan_token = scan_token.trim();
  if scan_token.is_empty() {
    return Err(Error::Validation("qrId is required".into()));
  }

  let subject = store
    .find_subject_by_token(scan_token)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(scan_token.to_owned()))?;

  let occurred_at = timestamp.unwrap_or_else(Utc::now);
  let day = boundary.day_of(occurred_at);

  let existing = store
    .find_event(scan_token, day)
    .await
    .map_err(Error::store)?;
  if existing.is_some() {
    debug!(subject = %subject.id, %day, "already marked");
    return Ok(MarkOutcome { already_marked: true, subject });
  }

  let event = AttendanceEvent::for_subject(&subject, occurred_at, day);
  let inserted = store.append_event(event).await.map_err(Error::store)?;
  if inserted {
    info!(subject = %subject.id, %day, "attendance marked");
  } else {
    debug!(subject = %subject.id, %day, "lost insert race; already marked");
  }

  Ok(MarkOutcome { already_marked: !inserted, subject })
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, NaiveDate, TimeZone as _};

  use super::*;
  use crate::memory::MemoryStore;

  fn alice() -> Subject {
    Subject {
      id:                  "id-alice".into(),
      scan_token:          "tok-alice".into(),
      name:                "Alice Johnson".into(),
      registration_number: Some("REG001".into()),
      email:               "alice.johnson@student.edu".into(),
      qr_code:             None,
    }
  }

  async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.replace_all_subjects(vec![alice()]).await.unwrap();
    store
  }

  #[tokio::test]
  async fn second_mark_same_day_is_idempotent() {
    let store = seeded().await;
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    let first = mark_attendance(&store, DayBoundary::Utc, "tok-alice", Some(at))
      .await
      .unwrap();
    assert!(!first.already_marked);
    assert_eq!(first.subject.name, "Alice Johnson");

    let later = at + Duration::hours(3);
    let second =
      mark_attendance(&store, DayBoundary::Utc, "tok-alice", Some(later))
        .await
        .unwrap();
    assert!(second.already_marked);

    let events = store.list_events(None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].occurred_at, at);
    assert_eq!(events[0].day, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!(events[0].subject_id, "id-alice");
    assert_eq!(events[0].registration_number.as_deref(), Some("REG001"));
  }

  #[tokio::test]
  async fn next_day_gets_a_new_event() {
    let store = seeded().await;
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap();

    mark_attendance(&store, DayBoundary::Utc, "tok-alice", Some(at))
      .await
      .unwrap();
    let next = mark_attendance(
      &store,
      DayBoundary::Utc,
      "tok-alice",
      Some(at + Duration::hours(2)),
    )
    .await
    .unwrap();

    assert!(!next.already_marked);
    assert_eq!(store.count_events().await.unwrap(), 2);
  }

  #[tokio::test]
  async fn unknown_token_is_not_found_and_writes_nothing() {
    let store = seeded().await;
    let err = mark_attendance(&store, DayBoundary::Utc, "nope", None)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NotFound(t) if t == "nope"));
    assert_eq!(store.count_events().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn blank_token_is_a_validation_error() {
    let store = seeded().await;
    let err = mark_attendance(&store, DayBoundary::Utc, "  ", None)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[tokio::test]
  async fn default_timestamp_uses_today() {
    let store = seeded().await;
    mark_attendance(&store, DayBoundary::Local, "tok-alice", None)
      .await
      .unwrap();
    let events = store.list_events(None).await.unwrap();
    // A run straddling midnight may see either day.
    let today = DayBoundary::Local.today();
    assert!(events[0].day == today || events[0].day == today.pred_opt().unwrap());
  }

  #[tokio::test]
  async fn concurrent_marks_write_one_event() {
    let store = seeded().await;
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    let (a, b) = tokio::join!(
      mark_attendance(&store, DayBoundary::Utc, "tok-alice", Some(at)),
      mark_attendance(&store, DayBoundary::Utc, "tok-alice", Some(at)),
    );
    let marked = [a.unwrap(), b.unwrap()];

    assert_eq!(marked.iter().filter(|m| !m.already_marked).count(), 1);
    assert_eq!(store.count_events().await.unwrap(), 1);
  }
}
