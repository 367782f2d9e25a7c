//! Error type for `kohort-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("tab not found: {0:?}")]
  TabNotFound(String),

  #[error("tab already exists: {0:?}")]
  TabExists(String),

  /// More values were supplied than the target range has columns.
  #[error("{width} values do not fit in {range}")]
  RangeOverflow { range: String, width: usize },
}

impl kohort_core::sheet::SheetError for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;
