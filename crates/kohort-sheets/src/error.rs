//! Error type for `kohort-sheets`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No access token is configured. Raised before any request is sent.
  #[error("not signed in: no access token configured")]
  Unauthenticated,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-2xx status.
  #[error("{call} returned {status}: {body}")]
  Status {
    call:   &'static str,
    status: u16,
    body:   String,
  },

  #[error("invalid api base url {0:?}")]
  InvalidBaseUrl(String),

  #[error("unexpected response from {call}: {reason}")]
  UnexpectedResponse { call: &'static str, reason: String },

  #[error(transparent)]
  Core(#[from] kohort_core::Error),
}

impl Error {
  /// HTTP 401/403 from the service means the token was rejected.
  pub fn is_auth_failure(&self) -> bool {
    matches!(self, Error::Unauthenticated)
      || matches!(self, Error::Status { status: 401 | 403, .. })
  }
}

impl kohort_core::sheet::SheetError for Error {
  fn is_unauthenticated(&self) -> bool { matches!(self, Error::Unauthenticated) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
