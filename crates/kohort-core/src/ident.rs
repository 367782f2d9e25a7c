//! Synthetic identifiers that link rows across tabs.
//!
//! The spreadsheet has no keys of its own. Every link between rows is one of
//! these strings, generated client-side:
//!
//! | Kind | Format |
//! |------|--------|
//! | [`RelationId`]    | `ID`  + last 6 digits of epoch millis + 3 base-36 chars |
//! | [`TransactionId`] | `TRX` + last 6 digits of epoch millis + 3 base-36 chars |
//! | [`UserId`]        | epoch millis + 9 base-36 chars |
//!
//! Uniqueness is advisory: two ids minted in the same millisecond collide
//! with probability 1 / 36³.

use std::fmt;

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      /// Wrap an identifier read back from a sheet cell.
      pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

      pub fn as_str(&self) -> &str { &self.0 }

      pub fn into_inner(self) -> String { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
    }

    impl AsRef<str> for $name {
      fn as_ref(&self) -> &str { &self.0 }
    }

    impl From<&str> for $name {
      fn from(value: &str) -> Self { Self(value.to_string()) }
    }
  };
}

string_id!(
  /// Identifies one signed-in account in the `User` tab.
  UserId
);
string_id!(
  /// `Relasi.id`, the owner key stored in the trailing column of identity rows.
  RelationId
);
string_id!(
  /// `Relasi.id_trx`; groups one encounter's rows across the dependent tabs.
  TransactionId
);

/// Append `n` random base-36 characters to `out`.
fn push_base36(out: &mut String, n: usize, rng: &mut impl RngCore) {
  for _ in 0..n {
    let idx = (rng.next_u32() % 36) as usize;
    out.push(BASE36[idx] as char);
  }
}

/// `prefix` + last six digits of `millis` + three base-36 characters.
fn short_id(prefix: &str, millis: i64, rng: &mut impl RngCore) -> String {
  let digits = millis.unsigned_abs().to_string();
  let tail = &digits[digits.len().saturating_sub(6)..];
  let mut id = String::with_capacity(prefix.len() + 9);
  id.push_str(prefix);
  id.push_str(tail);
  push_base36(&mut id, 3, rng);
  id
}

impl RelationId {
  pub fn generate() -> Self { Self(short_id("ID", Utc::now().timestamp_millis(), &mut OsRng)) }
}

impl TransactionId {
  pub fn generate() -> Self { Self(short_id("TRX", Utc::now().timestamp_millis(), &mut OsRng)) }
}

impl UserId {
  pub fn generate() -> Self {
    let mut id = Utc::now().timestamp_millis().to_string();
    push_base36(&mut id, 9, &mut OsRng);
    Self(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Counter(u32);

  impl RngCore for Counter {
    fn next_u32(&mut self) -> u32 {
      self.0 += 1;
      self.0
    }
    fn next_u64(&mut self) -> u64 { self.next_u32() as u64 }
    fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      dest.fill(0);
      Ok(())
    }
  }

  #[test]
  fn short_id_keeps_last_six_millis_digits() {
    let id = short_id("TRX", 1_717_171_234_567, &mut Counter(9));
    assert_eq!(id, "TRX234567abc");
  }

  #[test]
  fn short_id_with_few_digits_keeps_all_of_them() {
    let id = short_id("ID", 42, &mut Counter(0));
    assert_eq!(id, "ID42123");
  }

  #[test]
  fn generated_ids_have_expected_shape() {
    let trx = TransactionId::generate();
    assert!(trx.as_str().starts_with("TRX"));
    assert_eq!(trx.as_str().len(), 12);

    let rel = RelationId::generate();
    assert!(rel.as_str().starts_with("ID"));
    assert_eq!(rel.as_str().len(), 11);
    assert!(rel.as_str()[2..8].chars().all(|c| c.is_ascii_digit()));

    let user = UserId::generate();
    assert!(user.as_str().len() >= 22);
    assert!(user.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
  }
}
