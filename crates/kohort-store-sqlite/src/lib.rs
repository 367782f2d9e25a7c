//! SQLite backend for the kohort sheet store.
//!
//! Models a spreadsheet as a table of non-empty cells keyed by
//! `(tab, row, col)`, with the same row semantics as the hosted API: cleared
//! rows stay in place, appends land after the last non-empty row of the
//! range's columns, and reads trim trailing empty cells.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod grid;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteSheetStore;
