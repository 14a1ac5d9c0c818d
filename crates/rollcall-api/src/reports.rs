//! Read-only reporting endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stats` | Headline counts |
//! | `GET`  | `/stats/students` | Per-student attendance totals |
//! | `GET`  | `/report` | CSV download; 400 when there are no records |

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use rollcall_core::{
  report::{self, Stats, SubjectAttendance},
  store::RecordStore,
};

use crate::{AppState, error::ApiError};

/// `GET /stats`
pub async fn stats<S>(State(state): State<AppState<S>>) -> Result<Json<Stats>, ApiError>
where
  S: RecordStore,
{
  let stats = report::stats(&*state.store)
    .await
    .map_err(|e| ApiError::from(e).on_store("Error fetching stats"))?;
  Ok(Json(stats))
}

/// `GET /stats/students`
pub async fn breakdown<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<SubjectAttendance>>, ApiError>
where
  S: RecordStore,
{
  let breakdown = report::subject_breakdown(&*state.store)
    .await
    .map_err(|e| ApiError::from(e).on_store("Error fetching stats"))?;
  Ok(Json(breakdown))
}

/// `GET /report`: `attendance_report_<today>.csv`.
pub async fn csv<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let boundary = state.settings.day_boundary;
  let body = report::attendance_csv(&*state.store, boundary)
    .await
    .map_err(|e| ApiError::from(e).on_store("Error generating report"))?;
  let disposition = format!(
    "attachment; filename=attendance_report_{}.csv",
    boundary.today().format("%Y-%m-%d")
  );

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    body,
  ))
}
