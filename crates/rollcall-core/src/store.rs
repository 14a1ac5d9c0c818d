//! The `RecordStore` trait.
//!
//! Implemented by the storage backends (`rollcall-store-sqlite`,
//! `rollcall-store-json`, and [`MemoryStore`](crate::memory::MemoryStore)).
//! The import pipeline, the attendance marker and the API layer depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{event::AttendanceEvent, subject::Subject};

/// Abstraction over a Rollcall persistence backend.
///
/// Subjects are only ever written in bulk. Events are append-only and unique
/// per `(scan_token, day)`.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// All subjects, in the order they were imported.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Resolve a subject by the token embedded in its QR code.
  fn find_subject_by_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// Delete every subject and every event, then insert `subjects`.
  ///
  /// Backends that support transactions perform this atomically.
  fn replace_all_subjects(
    &self,
    subjects: Vec<Subject>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Events newest first, optionally restricted to a single day.
  fn list_events(
    &self,
    day: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + '_;

  /// The event recorded for `token` on `day`, if any.
  fn find_event<'a>(
    &'a self,
    token: &'a str,
    day: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + 'a;

  /// Append `event` unless one already exists for its `(scan_token, day)`.
  ///
  /// Returns `true` if the event was written. The existence check and the
  /// write are a single atomic step.
  fn append_event(
    &self,
    event: AttendanceEvent,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn count_subjects(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn count_events(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Sorted, de-duplicated scan tokens that have at least one event.
  fn distinct_tokens_with_events(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Remove all subjects and events.
  fn clear_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
