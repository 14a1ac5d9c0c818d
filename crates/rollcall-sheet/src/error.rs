//! Error types for the spreadsheet reader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("empty upload")]
  Empty,

  #[error("not a recognised spreadsheet (expected xlsx, xls, ods or UTF-8 CSV)")]
  UnknownFormat,

  #[error("workbook has no worksheets")]
  NoWorksheet,

  #[error("workbook error: {0}")]
  Workbook(#[from] calamine::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
