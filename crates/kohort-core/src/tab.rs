//! The fixed tab layout of the backing spreadsheet.
//!
//! Tab titles are those of the production spreadsheet and must not change.
//! Row 1 of every tab is a header row; data starts on row 2.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
  range::{A1Range, WIDE_COLUMN},
  record::{
    AncVisit, DeliveryRecord, ExamRecord, IdentityRecord, LabRecord, PostpartumRecord, Record,
  },
};

/// Which relation identifier a tab's rows carry as their owner key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
  /// `Relasi.id`, carried by identity rows.
  Relation,
  /// `Relasi.id_trx`, carried by every encounter-level row.
  Transaction,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
  #[strum(to_string = "User")]
  Users,
  #[strum(to_string = "Relasi")]
  Relation,
  #[strum(to_string = "Identitas")]
  Identity,
  #[strum(to_string = "Pemeriksaan")]
  Exam,
  #[strum(to_string = "Laboratorium")]
  Lab,
  #[strum(to_string = "Persalinan")]
  Delivery,
  #[strum(to_string = "Nifas")]
  Postpartum,
  #[strum(to_string = "ANC")]
  Anc,
}

/// The four tabs cleared together when an encounter is deleted, in the order
/// the delete visits them.
pub const ENCOUNTER_TABS: [Tab; 4] = [Tab::Exam, Tab::Lab, Tab::Delivery, Tab::Postpartum];

fn owned(columns: &[&'static str], owner: &'static str) -> Vec<&'static str> {
  let mut header = columns.to_vec();
  header.push(owner);
  header
}

impl Tab {
  /// Sheet title as it appears in the spreadsheet.
  pub fn title(self) -> &'static str { self.into() }

  pub fn owner_kind(self) -> Option<OwnerKind> {
    match self {
      Tab::Users | Tab::Relation => None,
      Tab::Identity => Some(OwnerKind::Relation),
      _ => Some(OwnerKind::Transaction),
    }
  }

  /// ANC rows repeat their transaction id in the first column.
  pub fn has_leading_key(self) -> bool { matches!(self, Tab::Anc) }

  /// Header row written when the tab is provisioned.
  pub fn header(self) -> Vec<&'static str> {
    match self {
      Tab::Users => vec!["user_id", "email"],
      Tab::Relation => vec!["id", "id_trx", "user_id", "created_at"],
      Tab::Identity => owned(IdentityRecord::COLUMNS, "relation_id"),
      Tab::Exam => owned(ExamRecord::COLUMNS, "id_trx"),
      Tab::Lab => owned(LabRecord::COLUMNS, "id_trx"),
      Tab::Delivery => owned(DeliveryRecord::COLUMNS, "id_trx"),
      Tab::Postpartum => owned(PostpartumRecord::COLUMNS, "id_trx"),
      Tab::Anc => {
        let mut header = vec!["id_trx"];
        header.extend_from_slice(AncVisit::COLUMNS);
        header.push("id_trx");
        header
      }
    }
  }

  /// Number of columns in the fixed layout.
  pub fn width(self) -> u32 { self.header().len() as u32 }

  /// The fixed-layout columns, e.g. `Relasi!A:D`.
  pub fn layout_range(self) -> A1Range { A1Range::columns(self.title(), 1, self.width()) }

  /// Every column a row could reach, e.g. `Identitas!A:ZZ`.
  pub fn full_range(self) -> A1Range { A1Range::columns(self.title(), 1, WIDE_COLUMN) }

  /// One complete row, used to clear a record in place.
  pub fn row_range(self, row: u32) -> A1Range {
    let last = match self {
      Tab::Relation | Tab::Users => self.width(),
      _ => WIDE_COLUMN,
    };
    A1Range::row(self.title(), 1, last, row)
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn titles_match_the_production_spreadsheet() {
    let titles: Vec<_> = Tab::iter().map(Tab::title).collect();
    assert_eq!(
      titles,
      ["User", "Relasi", "Identitas", "Pemeriksaan", "Laboratorium", "Persalinan", "Nifas", "ANC"]
    );
    assert_eq!("Relasi".parse::<Tab>().unwrap(), Tab::Relation);
  }

  #[test]
  fn owner_column_is_last_in_every_header() {
    assert_eq!(Tab::Identity.header().last(), Some(&"relation_id"));
    for tab in ENCOUNTER_TABS {
      assert_eq!(tab.header().last(), Some(&"id_trx"), "{tab}");
    }
    let anc = Tab::Anc.header();
    assert_eq!(anc.first(), Some(&"id_trx"));
    assert_eq!(anc.last(), Some(&"id_trx"));
  }

  #[test]
  fn relation_rows_clear_only_their_own_columns() {
    assert_eq!(Tab::Relation.row_range(9).to_string(), "Relasi!A9:D9");
    assert_eq!(Tab::Exam.row_range(3).to_string(), "Pemeriksaan!A3:ZZ3");
  }

  #[test]
  fn layout_widths() {
    assert_eq!(Tab::Identity.width(), 14);
    assert_eq!(Tab::Exam.width(), 14);
    assert_eq!(Tab::Lab.width(), 11);
    assert_eq!(Tab::Delivery.width(), 8);
    assert_eq!(Tab::Postpartum.width(), 10);
    assert_eq!(Tab::Anc.width(), 11);
  }
}
