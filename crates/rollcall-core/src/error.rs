//! Error types for `rollcall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No subject carries the given scan token.
  #[error("QR code not found")]
  NotFound(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("No attendance records")]
  NoRecords,

  #[error("encoding error: {0}")]
  Encoding(String),

  /// A backend failure, boxed so the core stays backend-agnostic.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
