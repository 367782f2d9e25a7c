//! [`SqliteSheetStore`], the SQLite implementation of [`SheetStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, Transaction};
use tracing::debug;

use kohort_core::{
  range::A1Range,
  sheet::{Grid, SheetStore},
};

use crate::{
  grid::{assemble, check_width, flatten, written_range, Cell},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A spreadsheet held in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSheetStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSheetStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` in a transaction, failing with [`Error::TabNotFound`] when the
  /// tab does not exist.
  async fn with_tab<T, F>(&self, tab: String, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>, &str) -> rusqlite::Result<T> + Send + 'static,
  {
    let name = tab.clone();
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !tab_exists(&tx, &name)? {
          return Ok(None);
        }
        let out = f(&tx, &name)?;
        tx.commit()?;
        Ok(Some(out))
      })
      .await?;
    out.ok_or(Error::TabNotFound(tab))
  }
}

fn tab_exists(conn: &rusqlite::Connection, tab: &str) -> rusqlite::Result<bool> {
  let found = conn
    .query_row("SELECT 1 FROM tabs WHERE name = ?1", rusqlite::params![tab], |_| Ok(true))
    .optional()?;
  Ok(found.unwrap_or(false))
}

/// Upsert non-empty cells and delete the ones being set to empty.
fn write_cells(conn: &rusqlite::Connection, tab: &str, cells: &[Cell]) -> rusqlite::Result<()> {
  let mut upsert = conn.prepare_cached(
    "INSERT INTO cells (tab, row, col, value) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (tab, row, col) DO UPDATE SET value = excluded.value",
  )?;
  let mut delete =
    conn.prepare_cached("DELETE FROM cells WHERE tab = ?1 AND row = ?2 AND col = ?3")?;
  for cell in cells {
    if cell.value.is_empty() {
      delete.execute(rusqlite::params![tab, cell.row, cell.col])?;
    } else {
      upsert.execute(rusqlite::params![tab, cell.row, cell.col, cell.value])?;
    }
  }
  Ok(())
}

// ─── SheetStore impl ─────────────────────────────────────────────────────────

impl SheetStore for SqliteSheetStore {
  type Error = Error;

  async fn read(&self, range: A1Range) -> Result<Grid> {
    let q = range.clone();
    let cells = self
      .with_tab(range.tab.clone(), move |tx, tab| {
        let mut stmt = tx.prepare(
          "SELECT row, col, value FROM cells
           WHERE tab = ?1
             AND row >= ?2 AND (?3 IS NULL OR row <= ?3)
             AND col BETWEEN ?4 AND ?5
           ORDER BY row, col",
        )?;
        let cells = stmt
          .query_map(
            rusqlite::params![tab, q.start_row(), q.last_row, q.first_col, q.last_col],
            |r| {
              Ok(Cell {
                row:   r.get(0)?,
                col:   r.get(1)?,
                value: r.get(2)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cells)
      })
      .await?;

    debug!(%range, cells = cells.len(), "read range");
    Ok(assemble(&range, cells))
  }

  async fn write(&self, range: A1Range, values: Grid) -> Result<()> {
    check_width(&range, &values)?;
    let cells = flatten(range.start_row(), range.first_col, &values);
    self
      .with_tab(range.tab.clone(), move |tx, tab| write_cells(tx, tab, &cells))
      .await?;
    debug!(%range, rows = values.len(), "wrote range");
    Ok(())
  }

  async fn append(&self, range: A1Range, values: Grid) -> Result<A1Range> {
    check_width(&range, &values)?;
    let q = range.clone();
    let written = self
      .with_tab(range.tab.clone(), move |tx, tab| {
        let last: Option<u32> = tx.query_row(
          "SELECT MAX(row) FROM cells WHERE tab = ?1 AND col BETWEEN ?2 AND ?3",
          rusqlite::params![tab, q.first_col, q.last_col],
          |r| r.get(0),
        )?;
        let start = last.map_or(1, |row| row + 1).max(q.start_row());
        write_cells(tx, tab, &flatten(start, q.first_col, &values))?;
        Ok(written_range(&q, start, &values))
      })
      .await?;

    debug!(range = %written, "appended rows");
    Ok(written)
  }

  async fn clear(&self, range: A1Range) -> Result<()> {
    let q = range.clone();
    let removed = self
      .with_tab(range.tab.clone(), move |tx, tab| {
        tx.execute(
          "DELETE FROM cells
           WHERE tab = ?1
             AND row >= ?2 AND (?3 IS NULL OR row <= ?3)
             AND col BETWEEN ?4 AND ?5",
          rusqlite::params![tab, q.start_row(), q.last_row, q.first_col, q.last_col],
        )
      })
      .await?;
    debug!(%range, removed, "cleared range");
    Ok(())
  }

  async fn tab_titles(&self) -> Result<Vec<String>> {
    let titles = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM tabs ORDER BY position")?;
        let titles = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
      })
      .await?;
    Ok(titles)
  }

  async fn create_tab<'a>(&'a self, title: &'a str) -> Result<()> {
    let name = title.to_string();
    let created = self
      .conn
      .call(move |conn| {
        if tab_exists(conn, &name)? {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO tabs (name, position)
           VALUES (?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM tabs))",
          rusqlite::params![name],
        )?;
        Ok(true)
      })
      .await?;
    if !created {
      return Err(Error::TabExists(title.to_string()));
    }
    debug!(title, "created tab");
    Ok(())
  }
}
