//! SQL schema for the SQLite sheet store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tabs (
    name      TEXT PRIMARY KEY,
    position  INTEGER NOT NULL
);

-- Only non-empty cells are stored. Clearing a cell deletes its row here.
CREATE TABLE IF NOT EXISTS cells (
    tab    TEXT    NOT NULL REFERENCES tabs(name),
    row    INTEGER NOT NULL,   -- 1-based
    col    INTEGER NOT NULL,   -- 1-based
    value  TEXT    NOT NULL,
    PRIMARY KEY (tab, row, col)
);

PRAGMA user_version = 1;
";
