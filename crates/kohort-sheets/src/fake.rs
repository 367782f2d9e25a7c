//! In-process fake of the Sheets v4 endpoints, backed by the SQLite grid.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use axum::{
  extract::{Path, State},
  http::{header, HeaderMap, StatusCode},
  routing::get,
  Json, Router,
};
use serde_json::{json, Value};

use kohort_core::{range::A1Range, sheet::SheetStore};
use kohort_store_sqlite::SqliteSheetStore;

use crate::{wire::ValueRange, SheetsConfig};

pub(crate) const TOKEN: &str = "test-token";
pub(crate) const SPREADSHEET: &str = "sheet-1";
pub(crate) const EMAIL: &str = "bidan@example.org";

#[derive(Clone)]
pub(crate) struct Fake {
  pub store: SqliteSheetStore,
  /// Requests received, authorised or not.
  pub hits:  Arc<AtomicUsize>,
}

impl Fake {
  pub fn hits(&self) -> usize { self.hits.load(Ordering::SeqCst) }
}

type Reply = Result<Json<Value>, (StatusCode, String)>;

fn authorize(
  fake: &Fake,
  id: Option<&str>,
  headers: &HeaderMap,
) -> Result<(), (StatusCode, String)> {
  fake.hits.fetch_add(1, Ordering::SeqCst);
  let expected = format!("Bearer {TOKEN}");
  if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
    return Err((StatusCode::UNAUTHORIZED, "request had invalid credentials".into()));
  }
  if id.is_some_and(|id| id != SPREADSHEET) {
    return Err((StatusCode::NOT_FOUND, "requested entity was not found".into()));
  }
  Ok(())
}

fn bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
  (StatusCode::BAD_REQUEST, err.to_string())
}

async fn get_values(
  State(fake): State<Fake>,
  Path((id, range)): Path<(String, String)>,
  headers: HeaderMap,
) -> Reply {
  authorize(&fake, Some(&id), &headers)?;
  let range: A1Range = range.parse().map_err(bad_request)?;
  let grid = fake.store.read(range.clone()).await.map_err(bad_request)?;
  let body = ValueRange::from_grid(range.to_string(), grid);
  Ok(Json(serde_json::to_value(body).unwrap()))
}

async fn put_values(
  State(fake): State<Fake>,
  Path((id, range)): Path<(String, String)>,
  headers: HeaderMap,
  Json(body): Json<ValueRange>,
) -> Reply {
  authorize(&fake, Some(&id), &headers)?;
  let range: A1Range = range.parse().map_err(bad_request)?;
  fake
    .store
    .write(range.clone(), body.into_grid())
    .await
    .map_err(bad_request)?;
  Ok(Json(json!({ "updatedRange": range.to_string() })))
}

/// `values/{range}:append` and `values/{range}:clear`.
async fn post_values(
  State(fake): State<Fake>,
  Path((id, target)): Path<(String, String)>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Reply {
  authorize(&fake, Some(&id), &headers)?;
  if let Some(range) = target.strip_suffix(":append") {
    let range: A1Range = range.parse().map_err(bad_request)?;
    let body: ValueRange = serde_json::from_value(body).map_err(bad_request)?;
    let written = fake
      .store
      .append(range, body.into_grid())
      .await
      .map_err(bad_request)?;
    return Ok(Json(json!({ "updates": { "updatedRange": written.to_string() } })));
  }
  if let Some(range) = target.strip_suffix(":clear") {
    let range: A1Range = range.parse().map_err(bad_request)?;
    fake.store.clear(range.clone()).await.map_err(bad_request)?;
    return Ok(Json(json!({ "clearedRange": range.to_string() })));
  }
  Err((StatusCode::NOT_FOUND, format!("no such method: {target}")))
}

async fn metadata(State(fake): State<Fake>, Path(id): Path<String>, headers: HeaderMap) -> Reply {
  authorize(&fake, Some(&id), &headers)?;
  let titles = fake.store.tab_titles().await.map_err(bad_request)?;
  let sheets: Vec<Value> = titles
    .into_iter()
    .map(|title| json!({ "properties": { "title": title } }))
    .collect();
  Ok(Json(json!({ "sheets": sheets })))
}

async fn batch_update(
  State(fake): State<Fake>,
  Path(target): Path<String>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Reply {
  let id = target.strip_suffix(":batchUpdate").unwrap_or(&target);
  authorize(&fake, Some(id), &headers)?;
  let title = body["requests"][0]["addSheet"]["properties"]["title"]
    .as_str()
    .ok_or_else(|| bad_request("only addSheet is supported"))?;
  fake.store.create_tab(title).await.map_err(bad_request)?;
  Ok(Json(json!({ "spreadsheetId": SPREADSHEET, "replies": [{}] })))
}

async fn userinfo(State(fake): State<Fake>, headers: HeaderMap) -> Reply {
  authorize(&fake, None, &headers)?;
  Ok(Json(json!({ "id": "1", "email": EMAIL, "verified_email": true })))
}

/// Serve the fake on an ephemeral port and return a config pointing at it.
pub(crate) async fn spawn(store: SqliteSheetStore) -> (SheetsConfig, Fake) {
  let fake = Fake { store, hits: Arc::default() };
  let app = Router::new()
    .route("/v4/spreadsheets/{id}", get(metadata).post(batch_update))
    .route(
      "/v4/spreadsheets/{id}/values/{range}",
      get(get_values).put(put_values).post(post_values),
    )
    .route("/oauth2/v2/userinfo", get(userinfo))
    .with_state(fake.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  let mut config = SheetsConfig::new(SPREADSHEET, Some(TOKEN.into()));
  config.api_base = format!("http://{addr}/v4/spreadsheets");
  config.userinfo_url = format!("http://{addr}/oauth2/v2/userinfo");
  (config, fake)
}
