//! Error type for `kohort-registry`.

use serde::Serialize;
use thiserror::Error;

use kohort_core::{
  ident::TransactionId,
  sheet::SheetError,
  tab::Tab,
};

/// The coarse category of an [`Error`], for callers that only need to decide
/// how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Unauthenticated,
  NotFound,
  Remote,
  Validation,
}

#[derive(Debug, Error)]
pub enum Error {
  /// No signed-in account was supplied.
  #[error("not signed in")]
  NotSignedIn,

  /// The backend refused the call for lack of a credential.
  #[error("not authenticated: {0}")]
  Unauthenticated(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("no relation owned by this user has transaction id {0}")]
  RelationNotFound(TransactionId),

  #[error("no ANC visit owned by this user has transaction id {0}")]
  AncVisitNotFound(TransactionId),

  #[error("no identity owned by this user has transaction id {0}")]
  MotherNotFound(TransactionId),

  #[error("{tab}: {field} is required")]
  MissingField { tab: Tab, field: &'static str },

  #[error("encounter has no data in any of its four sections")]
  EmptyEncounter,

  #[error(
    "identity already recorded for {mother_name} ({year}) at row {row}; \
     check the existing entry instead of adding it again"
  )]
  DuplicateIdentity {
    mother_name: String,
    year:        String,
    row:         u32,
  },
}

impl Error {
  /// Wrap a backend error, keeping missing credentials distinguishable.
  pub(crate) fn store<E: SheetError>(err: E) -> Self {
    if err.is_unauthenticated() {
      Error::Unauthenticated(Box::new(err))
    } else {
      Error::Store(Box::new(err))
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::NotSignedIn | Error::Unauthenticated(_) => ErrorKind::Unauthenticated,
      Error::Store(_) => ErrorKind::Remote,
      Error::RelationNotFound(_) | Error::AncVisitNotFound(_) | Error::MotherNotFound(_) => {
        ErrorKind::NotFound
      }
      Error::MissingField { .. } | Error::EmptyEncounter | Error::DuplicateIdentity { .. } => {
        ErrorKind::Validation
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
