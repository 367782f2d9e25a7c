//! Conversions between stored cells and row-major grids.

use kohort_core::{range::A1Range, sheet::Grid};

use crate::{Error, Result};

/// One stored, non-empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cell {
  pub row:   u32,
  pub col:   u32,
  pub value: String,
}

/// Build a grid anchored at the range's top-left corner from cells sorted by
/// row, then column. Rows with no stored cell come back as empty vectors and
/// trailing empty cells are never produced.
pub(crate) fn assemble(range: &A1Range, cells: Vec<Cell>) -> Grid {
  let start = range.start_row();
  let mut grid = Grid::new();
  for cell in cells {
    let r = (cell.row - start) as usize;
    let c = (cell.col - range.first_col) as usize;
    if grid.len() <= r {
      grid.resize_with(r + 1, Vec::new);
    }
    let row = &mut grid[r];
    if row.len() <= c {
      row.resize(c + 1, String::new());
    }
    row[c] = cell.value;
  }
  grid
}

/// Lay `values` out as cells starting at `(row, first_col)`. Empty strings
/// are kept so the writer can delete whatever was there.
pub(crate) fn flatten(row: u32, first_col: u32, values: &Grid) -> Vec<Cell> {
  values
    .iter()
    .enumerate()
    .flat_map(|(i, cells)| {
      cells.iter().enumerate().map(move |(j, value)| Cell {
        row:   row + i as u32,
        col:   first_col + j as u32,
        value: value.clone(),
      })
    })
    .collect()
}

/// Reject rows wider than the range.
pub(crate) fn check_width(range: &A1Range, values: &Grid) -> Result<()> {
  match values.iter().map(Vec::len).max() {
    Some(width) if width > range.width() as usize => Err(Error::RangeOverflow {
      range: range.to_string(),
      width,
    }),
    _ => Ok(()),
  }
}

/// The range an append starting at `start` actually covered.
pub(crate) fn written_range(range: &A1Range, start: u32, values: &Grid) -> A1Range {
  let width = values.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;
  let height = values.len().max(1) as u32;
  A1Range {
    tab:       range.tab.clone(),
    first_col: range.first_col,
    last_col:  range.first_col + width - 1,
    first_row: Some(start),
    last_row:  Some(start + height - 1),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cell(row: u32, col: u32, value: &str) -> Cell { Cell { row, col, value: value.into() } }

  #[test]
  fn assemble_keeps_gaps_aligned() {
    let range = A1Range::columns("T", 1, 4);
    let grid = assemble(&range, vec![cell(1, 1, "h"), cell(3, 2, "x"), cell(3, 4, "y")]);
    assert_eq!(grid, vec![vec!["h".to_string()], vec![], vec![
      String::new(),
      "x".into(),
      String::new(),
      "y".into()
    ]]);
  }

  #[test]
  fn assemble_offsets_by_range_origin() {
    let range = A1Range::row("T", 2, 3, 5);
    let grid = assemble(&range, vec![cell(5, 3, "v")]);
    assert_eq!(grid, vec![vec![String::new(), "v".into()]]);
  }

  #[test]
  fn written_range_spans_widest_row() {
    let range = A1Range::columns("Nifas", 1, 702);
    let values = vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into(), "e".into()]];
    assert_eq!(written_range(&range, 7, &values).to_string(), "Nifas!A7:C8");
  }

  #[test]
  fn check_width_rejects_overflow() {
    let range = A1Range::row("User", 1, 2, 2);
    assert!(check_width(&range, &vec![vec!["a".into(), "b".into()]]).is_ok());
    assert!(matches!(
      check_width(&range, &vec![vec!["a".into(), "b".into(), "c".into()]]),
      Err(Error::RangeOverflow { width: 3, .. })
    ));
  }
}
