//! Handlers for the student roster.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | Every subject, QR image included |
//! | `GET`  | `/student/:qr_id` | 404 if the token is unknown |

use axum::{
  Json,
  extract::{Path, State},
};
use rollcall_core::{store::RecordStore, subject::Subject};

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: RecordStore,
{
  let subjects = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::store("Error fetching students"))?;
  Ok(Json(subjects))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /student/:qr_id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(qr_id): Path<String>,
) -> Result<Json<Subject>, ApiError>
where
  S: RecordStore,
{
  let subject = state
    .store
    .find_subject_by_token(&qr_id)
    .await
    .map_err(ApiError::store("Error fetching student"))?
    .ok_or_else(|| ApiError::NotFound("QR code not found".into()))?;
  Ok(Json(subject))
}
