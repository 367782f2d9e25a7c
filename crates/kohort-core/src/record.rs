//! Named-field record types and their flat-row codecs.
//!
//! A sheet row is a list of strings identified only by position. Each record
//! type here fixes that order once, in [`Record::COLUMNS`], and everything
//! else addresses fields by name. The owner key (relation id or transaction
//! id) is not part of the record; it is appended by [`encode_row`] and split
//! off again by [`decode_row`].

use serde::{Deserialize, Serialize};

use crate::{
  sheet::{is_blank_row, last_filled},
  tab::Tab,
};

/// A domain record stored one-per-row in a dependent tab.
pub trait Record: Clone + Send + Sync + 'static {
  const TAB: Tab;
  /// Domain columns in sheet order, excluding owner keys.
  const COLUMNS: &'static [&'static str];
  /// Columns that must be non-empty for the record to be saved.
  const REQUIRED: &'static [&'static str];

  fn to_cells(&self) -> Vec<String>;

  /// Missing trailing cells decode as empty strings.
  fn from_cells(cells: &[String]) -> Self;

  /// `(column, value)` pairs in sheet order.
  fn fields(&self) -> Vec<(&'static str, String)> {
    Self::COLUMNS.iter().copied().zip(self.to_cells()).collect()
  }

  /// The first required column that is empty, if any.
  fn missing_required(&self) -> Option<&'static str> {
    self
      .fields()
      .into_iter()
      .find(|(name, value)| Self::REQUIRED.contains(name) && value.trim().is_empty())
      .map(|(name, _)| name)
  }

  fn is_blank(&self) -> bool { self.to_cells().iter().all(|c| c.trim().is_empty()) }
}

macro_rules! sheet_record {
  (
    $(#[$meta:meta])*
    $name:ident in $tab:ident, required [$($req:ident),*] {
      $($(#[$fmeta:meta])* $field:ident),* $(,)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct $name {
      $($(#[$fmeta])* pub $field: String,)*
    }

    impl Record for $name {
      const TAB: Tab = Tab::$tab;
      const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];
      const REQUIRED: &'static [&'static str] = &[$(stringify!($req)),*];

      fn to_cells(&self) -> Vec<String> { vec![$(self.$field.clone()),*] }

      fn from_cells(cells: &[String]) -> Self {
        let mut cells = cells.iter();
        Self { $($field: cells.next().cloned().unwrap_or_default(),)* }
      }
    }
  };
}

sheet_record! {
  /// A mother's identity (`Identitas`). Owned through `Relasi.id`.
  IdentityRecord in Identity, required [year, mother_name] {
    /// National identity number.
    nik,
    year,
    mother_name,
    spouse_name,
    address,
    financing_source,
    financing_number,
    mother_age,
    hamlet,
    regency,
    subdistrict,
    village,
    /// RFC 3339 timestamp; filled at save time when left empty.
    recorded_at,
  }
}

sheet_record! {
  /// Antenatal examination (`Pemeriksaan`).
  ExamRecord in Exam, required [] {
    /// Gravida / para / abortus status.
    gpa_status,
    pregnancy_interval,
    /// HPHT.
    last_menstrual_period,
    estimated_due_date,
    height,
    /// LILA.
    upper_arm_circumference,
    td_immunization_status,
    td_injection,
    tb_screening,
    mental_health_screening,
    counseling,
    complications,
    case_management,
  }
}

sheet_record! {
  /// Laboratorium results.
  LabRecord in Lab, required [] {
    hemoglobin,
    blood_group,
    urine_protein,
    urine_glucose,
    hiv,
    syphilis,
    hbsag,
    tb_microscopy,
    malaria,
    other,
  }
}

sheet_record! {
  /// Persalinan.
  DeliveryRecord in Delivery, required [] {
    delivery_date,
    place,
    method,
    attendant,
    birth_weight_over_2500,
    birth_weight_under_2500,
    complications,
  }
}

sheet_record! {
  /// Nifas: postpartum visits (KF1–KF4) and family planning.
  PostpartumRecord in Postpartum, required [] {
    kf1,
    kf2,
    kf3,
    kf4,
    family_planning_date,
    family_planning_method,
    case_date,
    intervention,
    notes,
  }
}

sheet_record! {
  /// One antenatal-care visit. The transaction id is written both before and
  /// after these columns.
  AncVisit in Anc, required [visit_date] {
    visit_date,
    weight,
    height,
    blood_pressure,
    gestational_age,
    fetal_heart_rate,
    fundal_height,
    fetal_station,
    visit_number,
  }
}

// ─── Duplicate key ───────────────────────────────────────────────────────────

/// The tuple that identifies "the same mother" for duplicate suppression.
///
/// Components are lower-cased with surrounding whitespace removed and inner
/// runs of whitespace collapsed to one space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DuplicateKey {
  pub year:        String,
  pub mother_name: String,
  pub spouse_name: String,
  pub village:     String,
  pub subdistrict: String,
}

fn normalize(value: &str) -> String {
  value
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

impl IdentityRecord {
  pub fn duplicate_key(&self) -> DuplicateKey {
    DuplicateKey {
      year:        normalize(&self.year),
      mother_name: normalize(&self.mother_name),
      spouse_name: normalize(&self.spouse_name),
      village:     normalize(&self.village),
      subdistrict: normalize(&self.subdistrict),
    }
  }
}

// ─── Row codec ───────────────────────────────────────────────────────────────

/// A record read back from its tab, with its position and owner key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stored<R> {
  /// 1-based sheet row.
  pub row:       u32,
  /// Trailing owner key (relation id for identities, transaction id otherwise).
  pub owner_key: String,
  /// Leading key; only ANC rows carry one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lead_key:  Option<String>,
  pub record:    R,
}

/// Lay out `record` as a sheet row: `[key] + fields + [key]` for tabs with a
/// leading key, `fields + [key]` otherwise.
pub fn encode_row<R: Record>(record: &R, owner_key: &str) -> Vec<String> {
  let mut row = Vec::with_capacity(R::COLUMNS.len() + 2);
  if R::TAB.has_leading_key() {
    row.push(owner_key.to_string());
  }
  row.extend(record.to_cells());
  row.push(owner_key.to_string());
  row
}

/// Decode one raw row. Blank rows (cleared in place) decode to `None`.
pub fn decode_row<R: Record>(row: u32, cells: &[String]) -> Option<Stored<R>> {
  if is_blank_row(cells) {
    return None;
  }
  let owner_key = last_filled(cells).unwrap_or_default().to_string();
  let (lead_key, body) = if R::TAB.has_leading_key() {
    let lead = cells.first().cloned().filter(|c| !c.trim().is_empty());
    (lead, cells.get(1..).unwrap_or_default())
  } else {
    (None, cells)
  };
  let body = &body[..body.len().min(R::COLUMNS.len())];
  Some(Stored { row, owner_key, lead_key, record: R::from_cells(body) })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cells(values: &[&str]) -> Vec<String> { values.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn identity_row_carries_relation_id_last() {
    let identity = IdentityRecord {
      nik: "3201".into(),
      year: "2024".into(),
      mother_name: "Siti".into(),
      ..Default::default()
    };
    let row = encode_row(&identity, "ID123456abc");
    assert_eq!(row.len(), 14);
    assert_eq!(row[0], "3201");
    assert_eq!(row[13], "ID123456abc");
  }

  #[test]
  fn anc_row_carries_transaction_id_at_both_ends() {
    let visit = AncVisit { visit_date: "2024-05-01".into(), ..Default::default() };
    let row = encode_row(&visit, "TRX1");
    assert_eq!(row.first().map(String::as_str), Some("TRX1"));
    assert_eq!(row.last().map(String::as_str), Some("TRX1"));
    assert_eq!(row[1], "2024-05-01");

    let stored = decode_row::<AncVisit>(4, &row).unwrap();
    assert_eq!(stored.lead_key.as_deref(), Some("TRX1"));
    assert_eq!(stored.owner_key, "TRX1");
    assert_eq!(stored.record, visit);
  }

  #[test]
  fn decode_tolerates_short_rows() {
    // The Sheets API drops trailing empty cells.
    let stored = decode_row::<LabRecord>(2, &cells(&["11.2", "O"])).unwrap();
    assert_eq!(stored.record.hemoglobin, "11.2");
    assert_eq!(stored.record.blood_group, "O");
    assert_eq!(stored.record.other, "");
  }

  #[test]
  fn decode_skips_cleared_rows() {
    assert!(decode_row::<ExamRecord>(3, &[]).is_none());
    assert!(decode_row::<ExamRecord>(3, &cells(&["", "  ", ""])).is_none());
  }

  #[test]
  fn decode_does_not_read_owner_key_as_a_field() {
    let mut row = cells(&["d", "p", "m", "a", "1", "0", "none"]);
    row.push("TRX9".into());
    let stored = decode_row::<DeliveryRecord>(5, &row).unwrap();
    assert_eq!(stored.record.complications, "none");
    assert_eq!(stored.owner_key, "TRX9");
  }

  #[test]
  fn duplicate_key_ignores_case_and_whitespace() {
    let a = IdentityRecord {
      year: "2024".into(),
      mother_name: "Siti  Aminah".into(),
      spouse_name: "Budi".into(),
      village: "Sukamaju".into(),
      subdistrict: "Cibeunying".into(),
      ..Default::default()
    };
    let b = IdentityRecord {
      year: " 2024 ".into(),
      mother_name: "  siti aminah".into(),
      spouse_name: "BUDI".into(),
      village: "sukamaju ".into(),
      subdistrict: "CIBEUNYING".into(),
      nik: "different".into(),
      ..Default::default()
    };
    assert_eq!(a.duplicate_key(), b.duplicate_key());
  }

  #[test]
  fn required_fields_are_reported_by_name() {
    let identity = IdentityRecord { year: "2024".into(), ..Default::default() };
    assert_eq!(identity.missing_required(), Some("mother_name"));
    assert_eq!(AncVisit::default().missing_required(), Some("visit_date"));
    assert_eq!(ExamRecord::default().missing_required(), None);
  }
}
