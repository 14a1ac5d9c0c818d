//! [`MemoryStore`]: a process-local [`RecordStore`].
//!
//! Nothing survives a restart. Used by tests throughout the workspace and by
//! the server's `memory` backend.

use std::{collections::BTreeSet, convert::Infallible, sync::Arc};

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::{
  event::{AttendanceEvent, sort_newest_first},
  store::RecordStore,
  subject::Subject,
};

#[derive(Default)]
struct State {
  subjects: Vec<Subject>,
  events:   Vec<AttendanceEvent>,
}

/// An in-memory record store.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl RecordStore for MemoryStore {
  type Error = Infallible;

  async fn list_subjects(&self) -> Result<Vec<Subject>, Infallible> {
    Ok(self.state.lock().await.subjects.clone())
  }

  async fn find_subject_by_token(
    &self,
    token: &str,
  ) -> Result<Option<Subject>, Infallible> {
    let state = self.state.lock().await;
    Ok(state.subjects.iter().find(|s| s.scan_token == token).cloned())
  }

  async fn replace_all_subjects(
    &self,
    subjects: Vec<Subject>,
  ) -> Result<(), Infallible> {
    let mut state = self.state.lock().await;
    state.events.clear();
    state.subjects = subjects;
    Ok(())
  }

  async fn list_events(
    &self,
    day: Option<NaiveDate>,
  ) -> Result<Vec<AttendanceEvent>, Infallible> {
    let state = self.state.lock().await;
    let mut events: Vec<_> = state
      .events
      .iter()
      .filter(|e| day.is_none_or(|d| e.day == d))
      .cloned()
      .collect();
    sort_newest_first(&mut events);
    Ok(events)
  }

  async fn find_event(
    &self,
    token: &str,
    day: NaiveDate,
  ) -> Result<Option<AttendanceEvent>, Infallible> {
    let state = self.state.lock().await;
    Ok(
      state
        .events
        .iter()
        .find(|e| e.scan_token == token && e.day == day)
        .cloned(),
    )
  }

  async fn append_event(&self, event: AttendanceEvent) -> Result<bool, Infallible> {
    let mut state = self.state.lock().await;
    let taken = state
      .events
      .iter()
      .any(|e| e.scan_token == event.scan_token && e.day == event.day);
    if taken {
      return Ok(false);
    }
    state.events.push(event);
    Ok(true)
  }

  async fn count_subjects(&self) -> Result<usize, Infallible> {
    Ok(self.state.lock().await.subjects.len())
  }

  async fn count_events(&self) -> Result<usize, Infallible> {
    Ok(self.state.lock().await.events.len())
  }

  async fn distinct_tokens_with_events(&self) -> Result<Vec<String>, Infallible> {
    let state = self.state.lock().await;
    let tokens: BTreeSet<_> =
      state.events.iter().map(|e| e.scan_token.clone()).collect();
    Ok(tokens.into_iter().collect())
  }

  async fn clear_all(&self) -> Result<(), Infallible> {
    let mut state = self.state.lock().await;
    state.subjects.clear();
    state.events.clear();
    Ok(())
  }
}
