//! Users and relations: the join rows that give other rows an owner.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  ident::{RelationId, TransactionId, UserId},
  sheet::is_blank_row,
};

/// The signed-in account, as reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub email: String,
}

impl Account {
  pub fn new(email: impl Into<String>) -> Self { Self { email: email.into() } }
}

/// One row of the `User` tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
  pub user_id: UserId,
  pub email:   String,
}

impl UserRow {
  pub fn to_cells(&self) -> Vec<String> {
    vec![self.user_id.to_string(), self.email.clone()]
  }

  pub fn from_cells(cells: &[String]) -> Option<Self> {
    if is_blank_row(cells) {
      return None;
    }
    let user_id = cells.first().filter(|c| !c.is_empty())?;
    Some(Self {
      user_id: UserId::new(user_id.as_str()),
      email:   cells.get(1).cloned().unwrap_or_default(),
    })
  }
}

/// One row of the `Relasi` tab: links a user to a relation id and a
/// transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
  pub id:         RelationId,
  pub id_trx:     TransactionId,
  pub user_id:    UserId,
  /// Kept as the raw cell text; rows written by older clients use ISO 8601
  /// with milliseconds.
  pub created_at: String,
}

impl Relation {
  /// Mint a fresh relation for `user_id`. Nothing is persisted.
  pub fn mint(user_id: UserId) -> Self {
    Self::mint_at(user_id, Utc::now())
  }

  pub fn mint_at(user_id: UserId, at: DateTime<Utc>) -> Self {
    Self {
      id: RelationId::generate(),
      id_trx: TransactionId::generate(),
      user_id,
      created_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
  }

  pub fn to_cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.id_trx.to_string(),
      self.user_id.to_string(),
      self.created_at.clone(),
    ]
  }

  /// Rows missing either identifier are not relations and decode to `None`.
  pub fn from_cells(cells: &[String]) -> Option<Self> {
    if is_blank_row(cells) {
      return None;
    }
    let cell = |i: usize| cells.get(i).map(|c| c.trim()).unwrap_or_default();
    if cell(0).is_empty() || cell(1).is_empty() {
      return None;
    }
    Some(Self {
      id:         RelationId::new(cell(0)),
      id_trx:     TransactionId::new(cell(1)),
      user_id:    UserId::new(cell(2)),
      created_at: cell(3).to_string(),
    })
  }
}

/// A relation together with the sheet row it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRelation {
  pub row:      u32,
  pub relation: Relation,
}
