//! Save flows: identity, encounter and ANC visit.
//!
//! These sit on top of [`repo`](crate::repo) and add what a data-entry form
//! needs: field validation, duplicate suppression for identities and the
//! choice of which relation a new row hangs off.

use std::collections::{HashMap, HashSet};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kohort_core::{
  ident::{RelationId, TransactionId},
  record::{
    AncVisit, DeliveryRecord, ExamRecord, IdentityRecord, LabRecord, PostpartumRecord, Record,
    Stored,
  },
  relation::Relation,
  sheet::SheetStore,
  tab::Tab,
};

use crate::{repo::validate, Error, Registry, Result, Session};

// ─── Types ───────────────────────────────────────────────────────────────────

/// The four sections entered together for one antenatal encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounter {
  pub exam:       ExamRecord,
  pub lab:        LabRecord,
  pub delivery:   DeliveryRecord,
  pub postpartum: PostpartumRecord,
}

impl Encounter {
  pub fn is_blank(&self) -> bool {
    self.exam.is_blank()
      && self.lab.is_blank()
      && self.delivery.is_blank()
      && self.postpartum.is_blank()
  }
}

/// Which relation an encounter's rows are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterTarget {
  /// Mint a fresh relation for this encounter alone.
  New,
  /// Attach to a mother already recorded through her identity's relation.
  Mother(TransactionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedRow {
  pub tab: Tab,
  pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedEncounter {
  pub id_trx:      TransactionId,
  pub relation_id: RelationId,
  pub rows:        Vec<SavedRow>,
}

/// An entry of the mother directory: one identity and the transaction id
/// that ANC visits and linked encounters reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mother {
  pub id_trx:      TransactionId,
  pub relation_id: RelationId,
  pub mother_name: String,
  pub nik:         String,
  pub year:        String,
  /// Row of the identity in `Identitas`.
  pub row:         u32,
}

/// Every owned row of the four encounter tabs sharing one transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterView {
  pub id_trx:     TransactionId,
  pub exam:       Vec<Stored<ExamRecord>>,
  pub lab:        Vec<Stored<LabRecord>>,
  pub delivery:   Vec<Stored<DeliveryRecord>>,
  pub postpartum: Vec<Stored<PostpartumRecord>>,
}

impl EncounterView {
  fn new(id_trx: TransactionId) -> Self {
    Self {
      id_trx,
      exam: Vec::new(),
      lab: Vec::new(),
      delivery: Vec::new(),
      postpartum: Vec::new(),
    }
  }
}

/// Group rows by owner key, creating views in order of first appearance.
fn group<R>(
  views: &mut Vec<EncounterView>,
  slots: &mut HashMap<String, usize>,
  rows: Vec<Stored<R>>,
  pick: fn(&mut EncounterView) -> &mut Vec<Stored<R>>,
) {
  for stored in rows {
    let slot = *slots.entry(stored.owner_key.clone()).or_insert_with(|| {
      views.push(EncounterView::new(TransactionId::new(stored.owner_key.as_str())));
      views.len() - 1
    });
    pick(&mut views[slot]).push(stored);
  }
}

// ─── Operations ──────────────────────────────────────────────────────────────

impl<S: SheetStore> Registry<S> {
  /// The first of the user's identities with the same duplicate key as
  /// `record`, if any. Other users' identities are never considered.
  pub async fn find_duplicate_identity(
    &self,
    session: &Session,
    record: &IdentityRecord,
  ) -> Result<Option<Stored<IdentityRecord>>> {
    let key = record.duplicate_key();
    let existing = self.read_owned::<IdentityRecord>(session).await?;
    Ok(existing.into_iter().find(|stored| stored.record.duplicate_key() == key))
  }

  /// Validate, check for a duplicate, then append the identity under a new
  /// relation. An empty `recorded_at` is filled with the current time.
  ///
  /// The duplicate check and the append are separate calls; a second client
  /// saving the same mother in between is not detected.
  pub async fn save_identity(
    &self,
    session: &mut Session,
    mut record: IdentityRecord,
  ) -> Result<Stored<IdentityRecord>> {
    validate(&record)?;
    if let Some(existing) = self.find_duplicate_identity(session, &record).await? {
      warn!(row = existing.row, "rejected duplicate identity");
      return Err(Error::DuplicateIdentity {
        mother_name: existing.record.mother_name,
        year:        existing.record.year,
        row:         existing.row,
      });
    }
    if record.recorded_at.trim().is_empty() {
      record.recorded_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    }
    self.append_owned(session, &record).await
  }

  /// The user's mothers: identities whose relation the session owns, one
  /// entry per transaction id, in sheet order.
  pub async fn list_mothers(&self, session: &Session) -> Result<Vec<Mother>> {
    let identities = self.read_owned::<IdentityRecord>(session).await?;
    let mut seen = HashSet::new();
    let mut mothers = Vec::new();
    for stored in identities {
      let Some(owner) = session.relation_by_id(&stored.owner_key) else {
        continue;
      };
      let Relation { id, id_trx, .. } = owner.relation;
      if !seen.insert(id_trx.clone()) {
        continue;
      }
      mothers.push(Mother {
        id_trx,
        relation_id: id,
        mother_name: stored.record.mother_name,
        nik: stored.record.nik,
        year: stored.record.year,
        row: stored.row,
      });
    }
    Ok(mothers)
  }

  async fn find_mother(&self, session: &Session, id_trx: &TransactionId) -> Result<Relation> {
    let known = self
      .list_mothers(session)
      .await?
      .iter()
      .any(|m| &m.id_trx == id_trx);
    session
      .relation_by_trx(id_trx.as_str())
      .filter(|_| known)
      .map(|stored| stored.relation)
      .ok_or_else(|| Error::MotherNotFound(id_trx.clone()))
  }

  /// Append an encounter's four rows under one transaction id.
  ///
  /// The rows are appended one tab at a time. If one append fails the
  /// earlier rows stay; deleting by the returned transaction id removes them.
  pub async fn save_encounter(
    &self,
    session: &mut Session,
    target: EncounterTarget,
    encounter: &Encounter,
  ) -> Result<SavedEncounter> {
    if encounter.is_blank() {
      return Err(Error::EmptyEncounter);
    }
    validate(&encounter.exam)?;
    validate(&encounter.lab)?;
    validate(&encounter.delivery)?;
    validate(&encounter.postpartum)?;

    let relation = match target {
      EncounterTarget::New => self.create_relation(session).await?,
      EncounterTarget::Mother(id_trx) => self.find_mother(session, &id_trx).await?,
    };

    let rows = vec![
      self.append_with_relation(session, &relation, &encounter.exam).await?.row,
      self.append_with_relation(session, &relation, &encounter.lab).await?.row,
      self.append_with_relation(session, &relation, &encounter.delivery).await?.row,
      self.append_with_relation(session, &relation, &encounter.postpartum).await?.row,
    ];
    let rows = [ExamRecord::TAB, LabRecord::TAB, DeliveryRecord::TAB, PostpartumRecord::TAB]
      .into_iter()
      .zip(rows)
      .map(|(tab, row)| SavedRow { tab, row })
      .collect();

    info!(id_trx = %relation.id_trx, "saved encounter");
    Ok(SavedEncounter { id_trx: relation.id_trx, relation_id: relation.id, rows })
  }

  /// Append an ANC visit for a previously recorded mother, reusing her
  /// transaction id.
  pub async fn save_anc_visit(
    &self,
    session: &Session,
    mother: &TransactionId,
    visit: &AncVisit,
  ) -> Result<Stored<AncVisit>> {
    validate(visit)?;
    let relation = self.find_mother(session, mother).await?;
    self.append_with_relation(session, &relation, visit).await
  }

  /// The user's encounter rows grouped by transaction id.
  pub async fn list_encounters(&self, session: &Session) -> Result<Vec<EncounterView>> {
    let mut views = Vec::new();
    let mut slots = HashMap::new();
    group(&mut views, &mut slots, self.read_owned::<ExamRecord>(session).await?, |v| &mut v.exam);
    group(&mut views, &mut slots, self.read_owned::<LabRecord>(session).await?, |v| &mut v.lab);
    group(&mut views, &mut slots, self.read_owned::<DeliveryRecord>(session).await?, |v| {
      &mut v.delivery
    });
    group(&mut views, &mut slots, self.read_owned::<PostpartumRecord>(session).await?, |v| {
      &mut v.postpartum
    });
    Ok(views)
  }
}
