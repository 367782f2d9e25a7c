//! The `SheetStore` trait: the raw read/write/append/clear contract over
//! named ranges of one spreadsheet.
//!
//! The trait is implemented by `kohort-sheets` (the hosted Sheets API) and
//! `kohort-store-sqlite` (a local grid with the same row semantics). Higher
//! layers depend on this abstraction only.

use std::future::Future;

use crate::range::A1Range;

/// Cell values, row-major. Rows may be ragged: trailing empty cells are
/// omitted, and a cleared row inside a range reads back as an empty vector.
pub type Grid = Vec<Vec<String>>;

/// Errors raised by a [`SheetStore`] backend.
pub trait SheetError: std::error::Error + Send + Sync + 'static {
  /// True when the call failed because no credential was available.
  fn is_unauthenticated(&self) -> bool { false }
}

/// Abstraction over a spreadsheet backend.
///
/// No method retries. A failed call leaves whatever earlier calls did in
/// place; callers that issue several calls must cope with partial effects.
pub trait SheetStore: Send + Sync {
  type Error: SheetError;

  /// Read every row of `range` from its first row through the last row that
  /// holds any value.
  fn read(&self, range: A1Range) -> impl Future<Output = Result<Grid, Self::Error>> + Send + '_;

  /// Overwrite cells starting at the range's top-left corner.
  fn write(
    &self,
    range: A1Range,
    values: Grid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append rows after the last non-empty row within the range's columns.
  /// Returns the range that was actually written.
  fn append(
    &self,
    range: A1Range,
    values: Grid,
  ) -> impl Future<Output = Result<A1Range, Self::Error>> + Send + '_;

  /// Empty every cell in `range`. Rows are not removed.
  fn clear(&self, range: A1Range) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Titles of every tab, in spreadsheet order.
  fn tab_titles(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Add an empty tab.
  fn create_tab<'a>(
    &'a self,
    title: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// A row with no non-whitespace cell; what a cleared record looks like.
pub fn is_blank_row(cells: &[String]) -> bool { cells.iter().all(|c| c.trim().is_empty()) }

/// The last non-empty cell: the owner key of a record row.
pub fn last_filled(cells: &[String]) -> Option<&str> {
  cells
    .iter()
    .rev()
    .map(|c| c.trim())
    .find(|c| !c.is_empty())
}

/// Pair each data row with its 1-based sheet row number, skipping the header
/// row and any blank rows.
pub fn data_rows(grid: &Grid) -> impl Iterator<Item = (u32, &[String])> {
  grid
    .iter()
    .enumerate()
    .skip(1)
    .map(|(i, cells)| (i as u32 + 1, cells.as_slice()))
    .filter(|(_, cells)| !is_blank_row(cells))
}
