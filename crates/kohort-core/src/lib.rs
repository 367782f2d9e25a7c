//! Core types and trait definitions for the kohort registry.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! describes the spreadsheet layout (tabs, columns, A1 ranges), the named
//! record types and their row codecs, the synthetic identifiers that link
//! rows together, and the [`sheet::SheetStore`] abstraction every backend
//! implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod ident;
pub mod range;
pub mod record;
pub mod relation;
pub mod sheet;
pub mod tab;

pub use error::{Error, Result};
