//! Owned reads and appends for any record type.
//!
//! A dependent row belongs to a user when its owner key (the trailing cell)
//! is one of the user's relation ids (identity rows) or transaction ids
//! (everything else). ANC rows also carry the transaction id in their first
//! cell, and either end counts.

use serde::Serialize;
use tracing::{debug, info};

use kohort_core::{
  record::{decode_row, encode_row, Record, Stored},
  relation::{Relation, UserRow},
  sheet::{data_rows, last_filled, SheetStore},
  tab::{OwnerKind, Tab},
};

use crate::{Error, Registry, Result, Session};

/// A raw row of any tab, as returned by [`Registry::owned_rows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
  pub row:   u32,
  pub cells: Vec<String>,
}

pub(crate) fn validate<R: Record>(record: &R) -> Result<()> {
  match record.missing_required() {
    Some(field) => Err(Error::MissingField { tab: R::TAB, field }),
    None => Ok(()),
  }
}

impl<S: SheetStore> Registry<S> {
  /// Every non-empty row of `R`'s tab owned by the session's user.
  pub async fn read_owned<R: Record>(&self, session: &Session) -> Result<Vec<Stored<R>>> {
    let grid = self
      .store
      .read(R::TAB.full_range())
      .await
      .map_err(Error::store)?;
    let kind = R::TAB.owner_kind().unwrap_or(OwnerKind::Transaction);
    let rows: Vec<Stored<R>> = data_rows(&grid)
      .filter_map(|(row, cells)| decode_row::<R>(row, cells))
      .filter(|stored| {
        session.owns(kind, &stored.owner_key)
          || stored.lead_key.as_deref().is_some_and(|k| session.owns(kind, k))
      })
      .collect();
    debug!(tab = R::TAB.title(), count = rows.len(), "read owned rows");
    Ok(rows)
  }

  /// Mint a relation for `record` and append it under the new owner key.
  pub async fn append_owned<R: Record>(
    &self,
    session: &mut Session,
    record: &R,
  ) -> Result<Stored<R>> {
    validate(record)?;
    let relation = self.create_relation(session).await?;
    self.append_with_relation(session, &relation, record).await
  }

  /// Append `record` under an existing relation owned by the session.
  pub async fn append_with_relation<R: Record>(
    &self,
    session: &Session,
    relation: &Relation,
    record: &R,
  ) -> Result<Stored<R>> {
    if !session.owns_transaction(relation.id_trx.as_str()) {
      return Err(Error::RelationNotFound(relation.id_trx.clone()));
    }
    let owner_key = match R::TAB.owner_kind() {
      Some(OwnerKind::Relation) => relation.id.as_str(),
      _ => relation.id_trx.as_str(),
    };
    let cells = encode_row(record, owner_key);
    let written = self
      .store
      .append(R::TAB.layout_range(), vec![cells])
      .await
      .map_err(Error::store)?;
    let row = written.start_row();
    info!(tab = R::TAB.title(), row, owner = owner_key, "appended row");
    Ok(Stored {
      row,
      owner_key: owner_key.to_string(),
      lead_key: R::TAB.has_leading_key().then(|| owner_key.to_string()),
      record: record.clone(),
    })
  }

  /// The session user's raw rows of any tab: their own `User` row, their
  /// relations, or the dependent rows they own.
  pub async fn owned_rows(&self, session: &Session, tab: Tab) -> Result<Vec<RawRow>> {
    let grid = self
      .store
      .read(tab.full_range())
      .await
      .map_err(Error::store)?;
    let owned = |cells: &[String]| match tab {
      Tab::Users => UserRow::from_cells(cells).is_some_and(|u| &u.user_id == session.user_id()),
      Tab::Relation => {
        Relation::from_cells(cells).is_some_and(|r| &r.user_id == session.user_id())
      }
      _ => {
        let kind = tab.owner_kind().unwrap_or(OwnerKind::Transaction);
        let leading = cells.first().filter(|_| tab.has_leading_key());
        last_filled(cells).is_some_and(|k| session.owns(kind, k))
          || leading.is_some_and(|k| session.owns(kind, k.trim()))
      }
    };
    Ok(
      data_rows(&grid)
        .filter(|(_, cells)| owned(cells))
        .map(|(row, cells)| RawRow { row, cells: cells.to_vec() })
        .collect(),
    )
  }
}
