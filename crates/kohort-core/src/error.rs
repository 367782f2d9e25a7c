//! Error types for `kohort-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid A1 range {range:?}: {reason}")]
  InvalidRange { range: String, reason: &'static str },

  #[error("column index {0} is outside the addressable range")]
  ColumnOutOfRange(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
