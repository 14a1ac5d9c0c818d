//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  /// A failure the client cannot fix; `0` is the message shown to it.
  #[error("{0}")]
  Internal(String, #[source] Box<dyn std::error::Error + Send + Sync>),

  /// A backend failure; `0` is the fixed message shown to the client.
  #[error("{0}")]
  Store(&'static str, #[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error behind a fixed client-facing `message`.
  pub fn store<E>(message: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| ApiError::Store(message, Box::new(e))
  }

  /// Replace the client-facing message of a store failure.
  pub fn on_store(self, message: &'static str) -> Self {
    match self {
      ApiError::Store(_, source) => ApiError::Store(message, source),
      other => other,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<rollcall_core::Error> for ApiError {
  fn from(e: rollcall_core::Error) -> Self {
    use rollcall_core::Error as E;
    match e {
      E::NotFound(_) => ApiError::NotFound(e.to_string()),
      E::Validation(m) => ApiError::BadRequest(m),
      E::NoRecords => ApiError::BadRequest(e.to_string()),
      E::Store(inner) => ApiError::Store("Internal server error", inner),
      E::Encoding(_) => {
        ApiError::Internal("Error generating QR code".into(), Box::new(e))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Internal(m, source) => {
        error!(error = %source, "{m}");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
      ApiError::Store(m, source) => {
        error!(error = %source, "store failure: {m}");
        (StatusCode::INTERNAL_SERVER_ERROR, (*m).to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
