//! Client tests against the in-process fake Sheets service.

use kohort_core::{
  range::A1Range,
  sheet::{Grid, SheetStore},
};
use kohort_store_sqlite::SqliteSheetStore;

use crate::{
  fake::{self, Fake, EMAIL},
  Error, SheetsClient, SheetsConfig,
};

async fn client() -> (SheetsClient, Fake) {
  let store = SqliteSheetStore::open_in_memory().await.unwrap();
  store.create_tab("Relasi").await.unwrap();
  let (config, fake) = fake::spawn(store).await;
  (SheetsClient::new(config).unwrap(), fake)
}

fn rows(values: &[&[&str]]) -> Grid {
  values
    .iter()
    .map(|row| row.iter().map(|c| c.to_string()).collect())
    .collect()
}

fn relasi() -> A1Range { A1Range::columns("Relasi", 1, 4) }

// ─── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_token_fails_before_any_request() {
  let (_, first) = client().await;
  let (mut config, fake) = fake::spawn(first.store.clone()).await;
  config.access_token = None;
  let unsigned = SheetsClient::new(config).unwrap();

  let err = unsigned.read(relasi()).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  assert!(matches!(unsigned.append(relasi(), rows(&[&["x"]])).await, Err(Error::Unauthenticated)));
  assert!(matches!(unsigned.account_email().await, Err(Error::Unauthenticated)));
  assert_eq!(fake.hits(), 0);
}

#[tokio::test]
async fn rejected_token_surfaces_status() {
  let (_, fake) = client().await;
  let (mut config, other) = fake::spawn(fake.store.clone()).await;
  config.access_token = Some("expired".into());
  let client = SheetsClient::new(config).unwrap();

  let err = client.read(relasi()).await.unwrap_err();
  assert!(matches!(err, Error::Status { status: 401, .. }), "{err}");
  assert!(err.is_auth_failure());
  assert_eq!(other.hits(), 1);
}

#[tokio::test]
async fn unknown_spreadsheet_is_a_remote_error() {
  let (_, fake) = client().await;
  let (mut config, _) = fake::spawn(fake.store.clone()).await;
  config.spreadsheet_id = "missing".into();
  let client = SheetsClient::new(config).unwrap();
  let err = client.tab_titles().await.unwrap_err();
  assert!(matches!(err, Error::Status { status: 404, .. }));
}

#[test]
fn base_url_must_be_hierarchical() {
  let mut config = SheetsConfig::new("x", Some("t".into()));
  config.api_base = "mailto:nobody".into();
  assert!(matches!(SheetsClient::new(config), Err(Error::InvalidBaseUrl(_))));
}

// ─── Values ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_returns_the_written_range() {
  let (client, _) = client().await;
  let header = client
    .append(relasi(), rows(&[&["id", "id_trx", "user_id", "created_at"]]))
    .await
    .unwrap();
  assert_eq!(header.to_string(), "Relasi!A1:D1");

  let row = client.append(relasi(), rows(&[&["ID1", "TRX1", "u1", "t"]])).await.unwrap();
  assert_eq!(row.first_row, Some(2));
}

#[tokio::test]
async fn read_write_clear_round_trip() {
  let (client, _) = client().await;
  client
    .append(relasi(), rows(&[&["h"], &["ID1", "TRX1"], &["ID2", "TRX2"]]))
    .await
    .unwrap();
  client
    .write(A1Range::row("Relasi", 3, 3, 3), rows(&[&["u1"]]))
    .await
    .unwrap();
  client.clear(A1Range::row("Relasi", 1, 4, 2)).await.unwrap();

  // A cleared row inside the data keeps its position.
  let grid = client.read(relasi()).await.unwrap();
  assert_eq!(grid, rows(&[&["h"], &[], &["ID2", "TRX2", "u1"]]));

  // A cleared last row is trimmed.
  client.clear(A1Range::row("Relasi", 1, 4, 3)).await.unwrap();
  assert_eq!(client.read(relasi()).await.unwrap(), rows(&[&["h"]]));
}

#[tokio::test]
async fn tab_names_with_spaces_survive_the_url() {
  let (client, _) = client().await;
  client.create_tab("Data Ibu").await.unwrap();
  let range = A1Range::columns("Data Ibu", 1, 2);
  client.append(range.clone(), rows(&[&["a", "b"]])).await.unwrap();
  assert_eq!(client.read(range).await.unwrap(), rows(&[&["a", "b"]]));
}

// ─── Metadata ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tabs_can_be_listed_and_created() {
  let (client, _) = client().await;
  client.create_tab("User").await.unwrap();
  assert_eq!(client.tab_titles().await.unwrap(), vec!["Relasi", "User"]);

  let err = client.create_tab("User").await.unwrap_err();
  assert!(matches!(err, Error::Status { status: 400, .. }));
}

#[tokio::test]
async fn account_email_comes_from_userinfo() {
  let (client, _) = client().await;
  assert_eq!(client.account_email().await.unwrap(), EMAIL);
}
