//! Owner-key indexes over a freshly read tab.
//!
//! Built from one read and used for the lookups that follow it. An index is
//! never cached across calls: appends may land on rows that an earlier delete
//! cleared, so row numbers are only trusted within one operation.

use std::collections::HashMap;

use kohort_core::sheet::{data_rows, last_filled, Grid};

/// Owner key to the 1-based rows that carry it, in sheet order.
#[derive(Debug, Default)]
pub struct OwnerIndex {
  rows: HashMap<String, Vec<u32>>,
}

impl OwnerIndex {
  /// Index by each row's last non-empty cell.
  pub fn trailing(grid: &Grid) -> Self {
    Self::build(grid, last_filled)
  }

  /// Index by each row's first cell.
  pub fn leading(grid: &Grid) -> Self {
    Self::build(grid, |cells| {
      cells.first().map(|c| c.trim()).filter(|c| !c.is_empty())
    })
  }

  fn build(grid: &Grid, key: impl Fn(&[String]) -> Option<&str>) -> Self {
    let mut rows: HashMap<String, Vec<u32>> = HashMap::new();
    for (row, cells) in data_rows(grid) {
      if let Some(k) = key(cells) {
        rows.entry(k.to_string()).or_default().push(row);
      }
    }
    Self { rows }
  }

  /// Rows carrying `key`, ascending.
  pub fn rows(&self, key: &str) -> &[u32] {
    self.rows.get(key).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn contains(&self, key: &str) -> bool { self.rows.contains_key(key) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grid(rows: &[&[&str]]) -> Grid {
    rows
      .iter()
      .map(|r| r.iter().map(|c| c.to_string()).collect())
      .collect()
  }

  #[test]
  fn trailing_index_skips_header_and_blank_rows() {
    let g = grid(&[
      &["a", "id_trx"],
      &["x", "TRX1"],
      &[],
      &["y", "TRX2", ""],
      &["z", "TRX1"],
    ]);
    let index = OwnerIndex::trailing(&g);
    assert_eq!(index.rows("TRX1"), &[2, 5]);
    assert_eq!(index.rows("TRX2"), &[4]);
    assert!(index.rows("id_trx").is_empty());
    assert!(!index.contains("TRX3"));
  }

  #[test]
  fn leading_index_reads_first_column_only() {
    let g = grid(&[&["id_trx", "date", "id_trx"], &["TRX1", "d", "TRX9"]]);
    let index = OwnerIndex::leading(&g);
    assert_eq!(index.rows("TRX1"), &[2]);
    assert!(index.rows("TRX9").is_empty());
  }
}
