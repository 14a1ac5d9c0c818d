//! [`JsonStore`]: the flat-file implementation of [`RecordStore`].

use std::{
  collections::BTreeSet,
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::NaiveDate;
use rollcall_core::{
  event::{AttendanceEvent, sort_newest_first},
  store::RecordStore,
  subject::Subject,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Error, Result};

const SUBJECTS_FILE: &str = "subjects.json";
const EVENTS_FILE: &str = "attendance.json";

// ─── File helpers ────────────────────────────────────────────────────────────

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_path_buf(), source }
}

/// Read a JSON array from `path`; a missing file reads as empty.
async fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
  let bytes = match tokio::fs::read(path).await {
    Ok(b) => b,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(io_err(path)(e)),
  };
  serde_json::from_slice(&bytes).map_err(|source| Error::Json {
    path: path.to_path_buf(),
    source,
  })
}

/// Replace `path` with `items`, via a sibling temp file and a rename.
async fn save<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
  let bytes = serde_json::to_vec_pretty(items).map_err(|source| Error::Json {
    path: path.to_path_buf(),
    source,
  })?;
  let tmp = path.with_extension("json.tmp");
  tokio::fs::write(&tmp, bytes).await.map_err(io_err(&tmp))?;
  tokio::fs::rename(&tmp, path).await.map_err(io_err(path))?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

struct State {
  subjects: Vec<Subject>,
  events:   Vec<AttendanceEvent>,
}

/// A record store persisted as JSON files in a directory.
///
/// All mutations serialise through one async mutex, so the
/// check-then-append of [`RecordStore::append_event`] is atomic within the
/// process. Clones share state.
#[derive(Clone)]
pub struct JsonStore {
  dir:   Arc<PathBuf>,
  state: Arc<Mutex<State>>,
}

impl JsonStore {
  /// Open (or create) a store rooted at `dir`.
  pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;

    let subjects = load(&dir.join(SUBJECTS_FILE)).await?;
    let events = load(&dir.join(EVENTS_FILE)).await?;

    Ok(Self {
      dir:   Arc::new(dir),
      state: Arc::new(Mutex::new(State { subjects, events })),
    })
  }

  fn subjects_path(&self) -> PathBuf { self.dir.join(SUBJECTS_FILE) }

  fn events_path(&self) -> PathBuf { self.dir.join(EVENTS_FILE) }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for JsonStore {
  type Error = Error;

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    Ok(self.state.lock().await.subjects.clone())
  }

  async fn find_subject_by_token(&self, token: &str) -> Result<Option<Subject>> {
    let state = self.state.lock().await;
    Ok(state.subjects.iter().find(|s| s.scan_token == token).cloned())
  }

  async fn replace_all_subjects(&self, subjects: Vec<Subject>) -> Result<()> {
    let mut state = self.state.lock().await;
    // Events first: a crash in between leaves old subjects with no history
    // rather than new subjects with stale history.
    save::<AttendanceEvent>(&self.events_path(), &[]).await?;
    state.events.clear();
    save(&self.subjects_path(), &subjects).await?;
    debug!(subjects = subjects.len(), "subject set replaced");
    state.subjects = subjects;
    Ok(())
  }

  async fn list_events(&self, day: Option<NaiveDate>) -> Result<Vec<AttendanceEvent>> {
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
  ) -> Result<Option<AttendanceEvent>> {
    let state = self.state.lock().await;
    Ok(
      state
        .events
        .iter()
        .find(|e| e.scan_token == token && e.day == day)
        .cloned(),
    )
  }

  async fn append_event(&self, event: AttendanceEvent) -> Result<bool> {
    let mut state = self.state.lock().await;
    if state
      .events
      .iter()
      .any(|e| e.scan_token == event.scan_token && e.day == event.day)
    {
      return Ok(false);
    }

    state.events.push(event);
    if let Err(e) = save(&self.events_path(), &state.events).await {
      state.events.pop();
      return Err(e);
    }
    Ok(true)
  }

  async fn count_subjects(&self) -> Result<usize> {
    Ok(self.state.lock().await.subjects.len())
  }

  async fn count_events(&self) -> Result<usize> {
    Ok(self.state.lock().await.events.len())
  }

  async fn distinct_tokens_with_events(&self) -> Result<Vec<String>> {
    let state = self.state.lock().await;
    let tokens: BTreeSet<_> =
      state.events.iter().map(|e| e.scan_token.clone()).collect();
    Ok(tokens.into_iter().collect())
  }

  async fn clear_all(&self) -> Result<()> {
    let mut state = self.state.lock().await;
    save::<AttendanceEvent>(&self.events_path(), &[]).await?;
    state.events.clear();
    save::<Subject>(&self.subjects_path(), &[]).await?;
    state.subjects.clear();
    Ok(())
  }
}
