//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use rollcall_core::{
  event::AttendanceEvent, store::RecordStore, subject::Subject,
};
use tracing::debug;

use crate::{
  Result,
  encode::{
    EVENT_COLUMNS, RawEvent, SUBJECT_COLUMNS, encode_day, encode_dt,
    subject_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self, sql: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let subjects = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], subject_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(subjects)
  }

  async fn find_subject_by_token(&self, token: &str) -> Result<Option<Subject>> {
    let token = token.to_owned();

    let subject = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE scan_token = ?1"),
              rusqlite::params![token],
              subject_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(subject)
  }

  async fn replace_all_subjects(&self, subjects: Vec<Subject>) -> Result<()> {
    let n = subjects.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM attendance", [])?;
        tx.execute("DELETE FROM subjects", [])?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO subjects ({SUBJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ))?;
          for s in &subjects {
            stmt.execute(rusqlite::params![
              s.id,
              s.scan_token,
              s.name,
              s.registration_number,
              s.email,
              s.qr_code,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(subjects = n, "subject set replaced");
    Ok(())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events(&self, day: Option<NaiveDate>) -> Result<Vec<AttendanceEvent>> {
    let day_str = day.map(encode_day);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(d) = day_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM attendance
             WHERE day = ?1
             ORDER BY day DESC, occurred_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![d], RawEvent::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM attendance
             ORDER BY day DESC, occurred_at DESC"
          ))?;
          stmt
            .query_map([], RawEvent::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn find_event(
    &self,
    token: &str,
    day: NaiveDate,
  ) -> Result<Option<AttendanceEvent>> {
    let token = token.to_owned();
    let day_str = encode_day(day);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {EVENT_COLUMNS} FROM attendance
                 WHERE scan_token = ?1 AND day = ?2"
              ),
              rusqlite::params![token, day_str],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn append_event(&self, event: AttendanceEvent) -> Result<bool> {
    let occurred_at = encode_dt(event.occurred_at);
    let day = encode_day(event.day);

    let inserted = self
      .conn
      .call(move |conn| {
        // UNIQUE (scan_token, day) makes this the idempotency check.
        let n = conn.execute(
          &format!(
            "INSERT INTO attendance ({EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (scan_token, day) DO NOTHING"
          ),
          rusqlite::params![
            event.scan_token,
            event.subject_id,
            event.name,
            event.registration_number,
            event.email,
            occurred_at,
            day,
          ],
        )?;
        Ok(n == 1)
      })
      .await?;
    Ok(inserted)
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn count_subjects(&self) -> Result<usize> {
    self.count("SELECT COUNT(*) FROM subjects").await
  }

  async fn count_events(&self) -> Result<usize> {
    self.count("SELECT COUNT(*) FROM attendance").await
  }

  async fn distinct_tokens_with_events(&self) -> Result<Vec<String>> {
    let tokens = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT scan_token FROM attendance ORDER BY scan_token",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tokens)
  }

  async fn clear_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM attendance", [])?;
        tx.execute("DELETE FROM subjects", [])?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
