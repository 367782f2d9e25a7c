//! The acting user's view of the relation set.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use kohort_core::{
  ident::{RelationId, TransactionId, UserId},
  relation::{Account, Relation, StoredRelation},
  tab::OwnerKind,
};

/// A signed-in user together with every relation they own.
///
/// Built once by [`Registry::open_session`](crate::Registry::open_session)
/// and kept current as relations are created and deleted through it.
/// Relations written by another client since then are only picked up by
/// [`Registry::refresh`](crate::Registry::refresh).
#[derive(Debug, Clone)]
pub struct Session {
  account:   Account,
  user_id:   UserId,
  relations: BTreeMap<u32, Relation>,
  by_id:     HashMap<RelationId, u32>,
  by_trx:    HashMap<TransactionId, u32>,
}

impl Session {
  pub(crate) fn new(account: Account, user_id: UserId, relations: Vec<StoredRelation>) -> Self {
    let mut session = Self {
      account,
      user_id,
      relations: BTreeMap::new(),
      by_id: HashMap::new(),
      by_trx: HashMap::new(),
    };
    session.replace(relations);
    session
  }

  pub(crate) fn replace(&mut self, relations: Vec<StoredRelation>) {
    self.relations.clear();
    self.by_id.clear();
    self.by_trx.clear();
    for stored in relations {
      self.insert(stored);
    }
  }

  pub(crate) fn insert(&mut self, stored: StoredRelation) {
    let StoredRelation { row, relation } = stored;
    self.by_id.insert(relation.id.clone(), row);
    self.by_trx.insert(relation.id_trx.clone(), row);
    self.relations.insert(row, relation);
  }

  pub(crate) fn remove(&mut self, id_trx: &TransactionId) -> Option<Relation> {
    let row = self.by_trx.remove(id_trx)?;
    let relation = self.relations.remove(&row)?;
    self.by_id.remove(&relation.id);
    Some(relation)
  }

  pub fn account(&self) -> &Account { &self.account }

  pub fn user_id(&self) -> &UserId { &self.user_id }

  /// Owned relations in sheet order.
  pub fn relations(&self) -> Vec<StoredRelation> {
    self
      .relations
      .iter()
      .map(|(&row, relation)| StoredRelation { row, relation: relation.clone() })
      .collect()
  }

  pub fn relation_count(&self) -> usize { self.relations.len() }

  pub fn relation_by_id(&self, id: &str) -> Option<StoredRelation> {
    self.lookup(self.by_id.get(&RelationId::new(id)).copied())
  }

  pub fn relation_by_trx(&self, id_trx: &str) -> Option<StoredRelation> {
    self.lookup(self.by_trx.get(&TransactionId::new(id_trx)).copied())
  }

  fn lookup(&self, row: Option<u32>) -> Option<StoredRelation> {
    let row = row?;
    let relation = self.relations.get(&row)?.clone();
    Some(StoredRelation { row, relation })
  }

  pub fn owns_transaction(&self, id_trx: &str) -> bool {
    self.by_trx.contains_key(&TransactionId::new(id_trx))
  }

  pub fn owns_relation(&self, id: &str) -> bool { self.by_id.contains_key(&RelationId::new(id)) }

  /// Whether `key` is an owner key this user holds for rows of `kind`.
  pub fn owns(&self, kind: OwnerKind, key: &str) -> bool {
    match kind {
      OwnerKind::Relation => self.owns_relation(key),
      OwnerKind::Transaction => self.owns_transaction(key),
    }
  }

  pub fn summary(&self) -> SessionSummary {
    SessionSummary {
      email:     self.account.email.clone(),
      user_id:   self.user_id.clone(),
      relations: self.relation_count(),
    }
  }
}

/// What `whoami` prints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
  pub email:     String,
  pub user_id:   UserId,
  pub relations: usize,
}
