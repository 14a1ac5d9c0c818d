//! Read-side aggregates: the CSV attendance report and summary statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result, day::DayBoundary, event::AttendanceEvent, store::RecordStore,
};

const BOM: char = '\u{feff}';
const CSV_HEADER: [&str; 6] =
  ["Student ID", "Name", "Registration Number", "Email", "Date", "Time"];

// ─── CSV ─────────────────────────────────────────────────────────────────────

fn csv_quote(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
  fields
    .into_iter()
    .map(csv_quote)
    .collect::<Vec<_>>()
    .join(",")
}

/// Render `events` as a spreadsheet-friendly CSV document.
///
/// The output starts with a UTF-8 byte-order mark and quotes every field.
pub fn render_csv(events: &[AttendanceEvent], boundary: DayBoundary) -> String {
  let mut out = String::new();
  out.push(BOM);
  out.push_str(&csv_line(CSV_HEADER));

  for e in events {
    let date = e.day.format("%Y-%m-%d").to_string();
    let time = boundary.time_of(e.occurred_at);
    out.push('\n');
    out.push_str(&csv_line([
      e.subject_id.as_str(),
      e.name.as_str(),
      e.registration_number.as_deref().unwrap_or(""),
      e.email.as_str(),
      date.as_str(),
      time.as_str(),
    ]));
  }

  out
}

/// The full attendance history as CSV, newest first.
///
/// Fails with [`Error::NoRecords`] when there is nothing to export.
pub async fn attendance_csv<S>(store: &S, boundary: DayBoundary) -> Result<String>
where
  S: RecordStore,
{
  let events = store.list_events(None).await.map_err(Error::store)?;
  if events.is_empty() {
    return Err(Error::NoRecords);
  }
  Ok(render_csv(&events, boundary))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_students:           usize,
  pub total_attendance_records: usize,
  /// Subjects with at least one event.
  pub unique_scanned_count:     usize,
}

pub async fn stats<S>(store: &S) -> Result<Stats>
where
  S: RecordStore,
{
  Ok(Stats {
    total_students:           store.count_subjects().await.map_err(Error::store)?,
    total_attendance_records: store.count_events().await.map_err(Error::store)?,
    unique_scanned_count:     store
      .distinct_tokens_with_events()
      .await
      .map_err(Error::store)?
      .len(),
  })
}

/// Attendance totals for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendance {
  pub student_id:          String,
  pub qr_id:               String,
  pub name:                String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub registration_number: Option<String>,
  pub email:               String,
  pub days_present:        usize,
  pub last_seen:           Option<DateTime<Utc>>,
}

/// One entry per current subject, in import order.
pub async fn subject_breakdown<S>(store: &S) -> Result<Vec<SubjectAttendance>>
where
  S: RecordStore,
{
  let subjects = store.list_subjects().await.map_err(Error::store)?;
  let events = store.list_events(None).await.map_err(Error::store)?;

  let mut per_token: HashMap<&str, (usize, DateTime<Utc>)> = HashMap::new();
  for e in &events {
    per_token
      .entry(e.scan_token.as_str())
      .and_modify(|(n, last)| {
        *n += 1;
        *last = (*last).max(e.occurred_at);
      })
      .or_insert((1, e.occurred_at));
  }

  Ok(
    subjects
      .into_iter()
      .map(|s| {
        let (days_present, last_seen) = per_token
          .get(s.scan_token.as_str())
          .map_or((0, None), |(n, last)| (*n, Some(*last)));
        SubjectAttendance {
          student_id: s.id,
          qr_id: s.scan_token,
          name: s.name,
          registration_number: s.registration_number,
          email: s.email,
          days_present,
          last_seen,
        }
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone as _};

  use super::*;
  use crate::{memory::MemoryStore, subject::Subject};

  fn subject(n: u32) -> Subject {
    Subject {
      id:                  format!("id-{n}"),
      scan_token:          format!("tok-{n}"),
      name:                format!("Student {n}"),
      registration_number: None,
      email:               format!("s{n}@x.edu"),
      qr_code:             None,
    }
  }

  fn event(s: &Subject, day: u32, hour: u32) -> AttendanceEvent {
    let at = Utc.with_ymd_and_hms(2024, 5, day, hour, 15, 0).unwrap();
    AttendanceEvent::for_subject(s, at, at.date_naive())
  }

  #[test]
  fn csv_starts_with_bom_and_escapes_quotes() {
    let mut s = subject(1);
    s.name = "Ann \"Nan\" O'Neil, Jr.".into();
    s.registration_number = Some("REG001".into());
    let csv = render_csv(&[event(&s, 2, 8)], DayBoundary::Utc);

    assert!(csv.starts_with('\u{feff}'));
    let mut lines = csv.trim_start_matches('\u{feff}').lines();
    assert_eq!(
      lines.next().unwrap(),
      r#""Student ID","Name","Registration Number","Email","Date","Time""#
    );
    assert_eq!(
      lines.next().unwrap(),
      r#""id-1","Ann ""Nan"" O'Neil, Jr.","REG001","s1@x.edu","2024-05-02","08:15:00""#
    );
    assert!(lines.next().is_none());
  }

  #[test]
  fn missing_registration_number_renders_empty() {
    let csv = render_csv(&[event(&subject(1), 2, 8)], DayBoundary::Utc);
    assert!(csv.contains(r#""Student 1","","s1@x.edu""#));
  }

  #[tokio::test]
  async fn empty_history_has_no_report() {
    let store = MemoryStore::new();
    let err = attendance_csv(&store, DayBoundary::Utc).await.unwrap_err();
    assert!(matches!(err, Error::NoRecords));
  }

  #[tokio::test]
  async fn report_lists_newest_first() {
    let store = MemoryStore::new();
    let (a, b) = (subject(1), subject(2));
    store
      .replace_all_subjects(vec![a.clone(), b.clone()])
      .await
      .unwrap();
    store.append_event(event(&a, 1, 9)).await.unwrap();
    store.append_event(event(&b, 3, 9)).await.unwrap();
    store.append_event(event(&a, 3, 10)).await.unwrap();

    let csv = attendance_csv(&store, DayBoundary::Utc).await.unwrap();
    let dates: Vec<_> = csv
      .lines()
      .skip(1)
      .map(|l| l.split(',').nth(4).unwrap().to_owned())
      .collect();
    assert_eq!(dates, ["\"2024-05-03\"", "\"2024-05-03\"", "\"2024-05-01\""]);
    assert!(csv.lines().nth(1).unwrap().starts_with("\"id-1\""));
  }

  #[tokio::test]
  async fn stats_count_subjects_events_and_scanned() {
    let store = MemoryStore::new();
    let (a, b, c) = (subject(1), subject(2), subject(3));
    store
      .replace_all_subjects(vec![a.clone(), b.clone(), c])
      .await
      .unwrap();
    store.append_event(event(&a, 1, 9)).await.unwrap();
    store.append_event(event(&a, 2, 9)).await.unwrap();
    store.append_event(event(&b, 2, 9)).await.unwrap();

    assert_eq!(
      stats(&store).await.unwrap(),
      Stats {
        total_students:           3,
        total_attendance_records: 3,
        unique_scanned_count:     2,
      }
    );
  }

  #[tokio::test]
  async fn breakdown_covers_every_subject() {
    let store = MemoryStore::new();
    let (a, b) = (subject(1), subject(2));
    store
      .replace_all_subjects(vec![a.clone(), b.clone()])
      .await
      .unwrap();
    store.append_event(event(&a, 1, 9)).await.unwrap();
    store.append_event(event(&a, 4, 11)).await.unwrap();

    let rows = subject_breakdown(&store).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].days_present, 2);
    assert_eq!(
      rows[0].last_seen.unwrap().date_naive(),
      NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
    );
    assert_eq!(rows[1].days_present, 0);
    assert!(rows[1].last_seen.is_none());
  }
}
