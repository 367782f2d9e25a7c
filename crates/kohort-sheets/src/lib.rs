//! Hosted spreadsheet backend: a [`SheetStore`](kohort_core::sheet::SheetStore)
//! over the Google Sheets v4 REST API.
//!
//! Every call carries a bearer token obtained by an external sign-in flow.
//! Nothing is retried, batched or rate-limited; a failed request surfaces as
//! an [`Error`] and leaves the spreadsheet as it was after the last
//! successful call.

mod client;
mod wire;

pub mod error;

pub use client::{SheetsClient, SheetsConfig, DEFAULT_API_BASE, DEFAULT_USERINFO_URL};
pub use error::{Error, Result};

#[cfg(test)]
mod fake;
#[cfg(test)]
mod tests;
