//! Handlers for `/attendance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance` | Body: [`MarkBody`]; idempotent per day |
//! | `GET`  | `/attendance` | All records, newest first |
//! | `GET`  | `/attendance/:date` | Records for one `YYYY-MM-DD` day |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use rollcall_core::{
  attendance::mark_attendance, day::parse_day, event::AttendanceEvent,
  store::RecordStore, subject::Subject,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Mark ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /attendance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkBody {
  /// The scanned or typed-in token.
  #[serde(default)]
  pub qr_id:     String,
  /// When the scan happened; defaults to the time of the request.
  pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkResponse {
  pub success:        bool,
  pub message:        &'static str,
  pub already_marked: bool,
  pub student:        Subject,
}

/// `POST /attendance`: body: `{"qrId":"...","timestamp":"..."}`.
pub async fn mark<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<MarkBody>, JsonRejection>,
) -> Result<Json<MarkResponse>, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body?;
  let outcome = mark_attendance(
    &*state.store,
    state.settings.day_boundary,
    &body.qr_id,
    body.timestamp,
  )
  .await
  .map_err(|e| ApiError::from(e).on_store("Error marking attendance"))?;

  let message = if outcome.already_marked {
    "Already marked for today"
  } else {
    "Attendance marked successfully"
  };

  Ok(Json(MarkResponse {
    success: true,
    message,
    already_marked: outcome.already_marked,
    student: outcome.subject,
  }))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /attendance`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<AttendanceEvent>>, ApiError>
where
  S: RecordStore,
{
  let events = state
    .store
    .list_events(None)
    .await
    .map_err(ApiError::store("Error fetching attendance"))?;
  Ok(Json(events))
}

/// `GET /attendance/:date`
pub async fn by_date<S>(
  State(state): State<AppState<S>>,
  Path(date): Path<String>,
) -> Result<Json<Vec<AttendanceEvent>>, ApiError>
where
  S: RecordStore,
{
  let day = parse_day(&date).ok_or_else(|| {
    ApiError::BadRequest(format!("invalid date {date:?}; expected YYYY-MM-DD"))
  })?;

  let events = state
    .store
    .list_events(Some(day))
    .await
    .map_err(ApiError::store("Error fetching attendance"))?;
  Ok(Json(events))
}
