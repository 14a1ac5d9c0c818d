//! Handler for `POST /upload`.
//!
//! Accepts a multipart form whose `file` field holds a spreadsheet, and
//! replaces the whole roster with its rows.

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
};
use rollcall_core::{import::import_subjects, store::RecordStore};
use serde::Serialize;
use tracing::info;

use crate::{AppState, error::ApiError};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub success: bool,
  pub message: String,
  pub count:   usize,
}

/// Pull the bytes of the `file` field out of the form, if present.
async fn file_bytes(
  mut form: Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, ApiError> {
  while let Some(field) = form
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed upload: {e}")))?
  {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    let filename = field.file_name().map(str::to_owned);
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("malformed upload: {e}")))?;
    return Ok(Some((filename, bytes.to_vec())));
  }
  Ok(None)
}

/// `POST /upload`: multipart, field `file`.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  form: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError>
where
  S: RecordStore,
{
  let no_file = || ApiError::BadRequest("No file uploaded".into());

  let form = form.map_err(|_| no_file())?;
  let (filename, bytes) = file_bytes(form).await?.ok_or_else(no_file)?;

  let rows = rollcall_sheet::read_rows(&bytes).map_err(|e| {
    ApiError::Internal("Error processing file".into(), Box::new(e))
  })?;
  info!(
    file = filename.as_deref().unwrap_or("<unnamed>"),
    rows = rows.len(),
    "upload parsed"
  );

  let summary = import_subjects(
    &*state.store,
    &*state.generator,
    state.settings.id_scheme,
    &rows,
  )
  .await
  .map_err(|e| ApiError::from(e).on_store("Error processing file"))?;

  Ok(Json(UploadResponse {
    success: true,
    message: format!("{} students imported successfully", summary.imported),
    count:   summary.imported,
  }))
}
