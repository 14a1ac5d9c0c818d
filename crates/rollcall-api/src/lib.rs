//! JSON REST API for Rollcall.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rollcall_core::store::RecordStore`]. CORS, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(state))
//! ```

pub mod attendance;
pub mod data;
pub mod error;
pub mod reports;
pub mod students;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use rollcall_core::{
  day::DayBoundary,
  import::{CodeGenerator, IdScheme},
  store::RecordStore,
};

pub use error::ApiError;

/// Default cap on an upload request body: 50 MiB.
pub const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Behaviour knobs fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
  pub id_scheme:    IdScheme,
  pub day_boundary: DayBoundary,
  pub upload_limit: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      id_scheme:    IdScheme::default(),
      day_boundary: DayBoundary::default(),
      upload_limit: DEFAULT_UPLOAD_LIMIT,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub generator: Arc<dyn CodeGenerator>,
  pub settings:  Settings,
}

// Manual impl: cloning the `Arc`s must not require `S: Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      generator: Arc::clone(&self.generator),
      settings:  self.settings,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  let upload_limit = state.settings.upload_limit;

  Router::new()
    // Import
    .route(
      "/upload",
      post(upload::handler::<S>).layer(DefaultBodyLimit::max(upload_limit)),
    )
    // Students
    .route("/students", get(students::list::<S>))
    .route("/student/{qr_id}", get(students::get_one::<S>))
    // Attendance
    .route(
      "/attendance",
      get(attendance::list::<S>).post(attendance::mark::<S>),
    )
    .route("/attendance/{date}", get(attendance::by_date::<S>))
    // Reporting
    .route("/stats", get(reports::stats::<S>))
    .route("/stats/students", get(reports::breakdown::<S>))
    .route("/report", get(reports::csv::<S>))
    // Maintenance
    .route("/data", delete(data::clear::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
