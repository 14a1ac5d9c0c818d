//! Handler for `DELETE /data`.

use axum::{Json, extract::State};
use rollcall_core::store::RecordStore;
use serde_json::{Value, json};
use tracing::warn;

use crate::{AppState, error::ApiError};

/// `DELETE /data`: drop every student and every attendance record.
pub async fn clear<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: RecordStore,
{
  state
    .store
    .clear_all()
    .await
    .map_err(ApiError::store("Error clearing data"))?;

  warn!("all students and attendance records cleared");
  Ok(Json(json!({ "success": true, "message": "All data cleared" })))
}
