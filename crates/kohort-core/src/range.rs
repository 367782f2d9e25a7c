//! A1-notation ranges (`Relasi!A2:D2`, `Identitas!A:ZZ`).
//!
//! Columns and rows are 1-based, as in the spreadsheet UI. A range without
//! row numbers spans every row of its columns.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// Highest addressable column (`ZZZ`).
pub const MAX_COLUMN: u32 = 18_278;

/// Column used as the right edge when a whole row must be cleared.
pub const WIDE_COLUMN: u32 = 702; // ZZ

/// Convert a 1-based column index into its letter form (`1 → A`, `27 → AA`).
pub fn column_letters(index: u32) -> Result<String> {
  if index == 0 || index > MAX_COLUMN {
    return Err(Error::ColumnOutOfRange(index));
  }
  let mut n = index;
  let mut letters = Vec::with_capacity(3);
  while n > 0 {
    let rem = (n - 1) % 26;
    letters.push(b'A' + rem as u8);
    n = (n - 1) / 26;
  }
  Ok(letters.iter().rev().map(|&b| b as char).collect())
}

/// Parse column letters (case-insensitive) into a 1-based index.
pub fn column_index(letters: &str) -> Option<u32> {
  if letters.is_empty() || letters.len() > 3 {
    return None;
  }
  let mut index: u32 = 0;
  for c in letters.chars() {
    if !c.is_ascii_alphabetic() {
      return None;
    }
    index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
  }
  (index <= MAX_COLUMN).then_some(index)
}

// ─── A1Range ─────────────────────────────────────────────────────────────────

/// A rectangular range on one tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct A1Range {
  pub tab:       String,
  pub first_col: u32,
  pub last_col:  u32,
  /// `None` means "from the first row".
  pub first_row: Option<u32>,
  /// `None` means "through the last row".
  pub last_row:  Option<u32>,
}

impl A1Range {
  /// Whole columns, e.g. `Identitas!A:ZZ`.
  pub fn columns(tab: impl Into<String>, first_col: u32, last_col: u32) -> Self {
    Self {
      tab: tab.into(),
      first_col,
      last_col,
      first_row: None,
      last_row: None,
    }
  }

  /// A single row across the given columns, e.g. `Relasi!A7:D7`.
  pub fn row(tab: impl Into<String>, first_col: u32, last_col: u32, row: u32) -> Self {
    Self {
      tab: tab.into(),
      first_col,
      last_col,
      first_row: Some(row),
      last_row: Some(row),
    }
  }

  /// Number of columns covered.
  pub fn width(&self) -> u32 { self.last_col.saturating_sub(self.first_col) + 1 }

  /// The first row covered (1 when open-ended).
  pub fn start_row(&self) -> u32 { self.first_row.unwrap_or(1) }
}

fn needs_quoting(tab: &str) -> bool {
  !tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for A1Range {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if needs_quoting(&self.tab) {
      write!(f, "'{}'!", self.tab.replace('\'', "''"))?;
    } else {
      write!(f, "{}!", self.tab)?;
    }
    let first = column_letters(self.first_col).map_err(|_| fmt::Error)?;
    let last = column_letters(self.last_col).map_err(|_| fmt::Error)?;
    let first_row = self.first_row.map(|r| r.to_string()).unwrap_or_default();
    let last_row = self.last_row.map(|r| r.to_string()).unwrap_or_default();
    write!(f, "{first}{first_row}:{last}{last_row}")
  }
}

/// Split `'My Tab'!A1:B2` or `Tab!A1:B2` into the unquoted tab and the cells.
fn split_tab(input: &str) -> Option<(String, &str)> {
  if let Some(rest) = input.strip_prefix('\'') {
    let mut tab = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
      if c == '\'' {
        if matches!(chars.peek(), Some((_, '\''))) {
          tab.push('\'');
          chars.next();
          continue;
        }
        let after = &rest[i + 1..];
        return after.strip_prefix('!').map(|cells| (tab, cells));
      }
      tab.push(c);
    }
    None
  } else {
    let (tab, cells) = input.rsplit_once('!')?;
    Some((tab.to_string(), cells))
  }
}

/// Parse `AB12` into `(28, Some(12))`; `AB` into `(28, None)`.
fn parse_cell(cell: &str) -> Option<(u32, Option<u32>)> {
  let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
  let (letters, digits) = cell.split_at(split);
  let col = column_index(letters)?;
  let row = if digits.is_empty() {
    None
  } else {
    match digits.parse::<u32>() {
      Ok(0) | Err(_) => return None,
      Ok(r) => Some(r),
    }
  };
  Some((col, row))
}

impl FromStr for A1Range {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = |reason| Error::InvalidRange { range: s.to_string(), reason };

    let (tab, cells) = split_tab(s.trim()).ok_or_else(|| invalid("missing tab name"))?;
    if tab.is_empty() {
      return Err(invalid("empty tab name"));
    }

    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (first_col, first_row) = parse_cell(start).ok_or_else(|| invalid("bad start cell"))?;
    let (last_col, last_row) = parse_cell(end).ok_or_else(|| invalid("bad end cell"))?;

    if last_col < first_col {
      return Err(invalid("columns are reversed"));
    }
    if let (Some(a), Some(b)) = (first_row, last_row)
      && b < a
    {
      return Err(invalid("rows are reversed"));
    }

    Ok(Self { tab, first_col, last_col, first_row, last_row })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn column_letters_round_trip_edges() {
    let edges = [(1, "A"), (26, "Z"), (27, "AA"), (52, "AZ"), (702, "ZZ"), (703, "AAA")];
    for (index, letters) in edges {
      assert_eq!(column_letters(index).unwrap(), letters);
      assert_eq!(column_index(letters), Some(index));
    }
    assert!(column_letters(0).is_err());
    assert_eq!(column_index("a"), Some(1));
    assert_eq!(column_index("A1"), None);
  }

  #[test]
  fn display_whole_columns_and_single_row() {
    assert_eq!(A1Range::columns("Identitas", 1, WIDE_COLUMN).to_string(), "Identitas!A:ZZ");
    assert_eq!(A1Range::row("Relasi", 1, 4, 7).to_string(), "Relasi!A7:D7");
  }

  #[test]
  fn display_quotes_tab_with_spaces() {
    let r = A1Range::row("Data Ibu's", 1, 2, 3);
    assert_eq!(r.to_string(), "'Data Ibu''s'!A3:B3");
    assert_eq!(r.to_string().parse::<A1Range>().unwrap(), r);
  }

  #[test]
  fn parse_updated_range_from_append_response() {
    let r: A1Range = "Pemeriksaan!A12:N12".parse().unwrap();
    assert_eq!(r.tab, "Pemeriksaan");
    assert_eq!((r.first_col, r.last_col), (1, 14));
    assert_eq!((r.first_row, r.last_row), (Some(12), Some(12)));
  }

  #[test]
  fn parse_single_cell() {
    let r: A1Range = "User!B3".parse().unwrap();
    assert_eq!((r.first_col, r.last_col, r.first_row, r.last_row), (2, 2, Some(3), Some(3)));
  }

  #[test]
  fn parse_rejects_garbage() {
    assert!("A1:B2".parse::<A1Range>().is_err());
    assert!("Tab!1:2".parse::<A1Range>().is_err());
    assert!("Tab!B1:A1".parse::<A1Range>().is_err());
    assert!("Tab!A0:B1".parse::<A1Range>().is_err());
  }
}
