//! [`SheetsClient`], the hosted implementation of [`SheetStore`].

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info};

use kohort_core::{
  range::A1Range,
  sheet::{Grid, SheetStore},
};

use crate::{
  wire::{AppendResponse, Spreadsheet, UserInfo, ValueRange},
  Error, Result,
};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Connection settings for one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
  pub api_base:       String,
  pub spreadsheet_id: String,
  /// OAuth bearer token. `None` makes every call fail with
  /// [`Error::Unauthenticated`].
  pub access_token:   Option<String>,
  pub userinfo_url:   String,
  pub timeout:        Duration,
}

impl SheetsConfig {
  pub fn new(spreadsheet_id: impl Into<String>, access_token: Option<String>) -> Self {
    Self {
      api_base: DEFAULT_API_BASE.to_string(),
      spreadsheet_id: spreadsheet_id.into(),
      access_token,
      userinfo_url: DEFAULT_USERINFO_URL.to_string(),
      timeout: Duration::from_secs(30),
    }
  }
}

/// Async client for the Sheets v4 values and metadata endpoints.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SheetsClient {
  http:   Client,
  base:   Url,
  config: SheetsConfig,
}

impl SheetsClient {
  pub fn new(config: SheetsConfig) -> Result<Self> {
    let base = Url::parse(&config.api_base)
      .ok()
      .filter(|url| !url.cannot_be_a_base())
      .ok_or_else(|| Error::InvalidBaseUrl(config.api_base.clone()))?;
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, base, config })
  }

  fn token(&self) -> Result<&str> {
    self
      .config
      .access_token
      .as_deref()
      .filter(|t| !t.is_empty())
      .ok_or(Error::Unauthenticated)
  }

  /// `{api_base}/{spreadsheet_id}{suffix}` followed by `segments`, each one
  /// percent-encoded as a single path segment.
  fn url(&self, suffix: &str, segments: &[&str]) -> Result<Url> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| Error::InvalidBaseUrl(self.config.api_base.clone()))?
      .pop_if_empty()
      .push(&format!("{}{suffix}", self.config.spreadsheet_id))
      .extend(segments);
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
    let token = self.token()?;
    Ok(self.http.request(method, url).bearer_auth(token))
  }

  async fn send<T: DeserializeOwned>(&self, call: &'static str, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { call, status: status.as_u16(), body });
    }
    Ok(resp.json().await?)
  }

  async fn send_json<B: Serialize, T: DeserializeOwned>(
    &self,
    call: &'static str,
    method: Method,
    url: Url,
    body: &B,
  ) -> Result<T> {
    let req = self.request(method, url)?.json(body);
    self.send(call, req).await
  }

  /// The signed-in account's email, from the OAuth userinfo endpoint.
  pub async fn account_email(&self) -> Result<String> {
    let url = Url::parse(&self.config.userinfo_url)
      .map_err(|_| Error::InvalidBaseUrl(self.config.userinfo_url.clone()))?;
    let req = self.request(Method::GET, url)?;
    let info: UserInfo = self.send("userinfo", req).await?;
    info
      .email
      .filter(|e| !e.is_empty())
      .ok_or(Error::UnexpectedResponse {
        call:   "userinfo",
        reason: "no email in response".into(),
      })
  }
}

// ─── SheetStore impl ─────────────────────────────────────────────────────────

impl SheetStore for SheetsClient {
  type Error = Error;

  async fn read(&self, range: A1Range) -> Result<Grid> {
    let a1 = range.to_string();
    let url = self.url("", &["values", a1.as_str()])?;
    let req = self.request(Method::GET, url)?;
    let body: ValueRange = self.send("values.get", req).await?;
    let grid = body.into_grid();
    debug!(range = %a1, rows = grid.len(), "read range");
    Ok(grid)
  }

  async fn write(&self, range: A1Range, values: Grid) -> Result<()> {
    let a1 = range.to_string();
    let rows = values.len();
    let mut url = self.url("", &["values", a1.as_str()])?;
    url.query_pairs_mut().append_pair("valueInputOption", "RAW");
    let body = ValueRange::from_grid(a1.clone(), values);
    let _: serde_json::Value = self.send_json("values.update", Method::PUT, url, &body).await?;
    info!(range = %a1, rows, "wrote range");
    Ok(())
  }

  async fn append(&self, range: A1Range, values: Grid) -> Result<A1Range> {
    let a1 = range.to_string();
    let mut url = self.url("", &["values", format!("{a1}:append").as_str()])?;
    url
      .query_pairs_mut()
      .append_pair("valueInputOption", "RAW")
      .append_pair("insertDataOption", "INSERT_ROWS");
    let body = ValueRange::from_grid(a1.clone(), values);
    let resp: AppendResponse = self.send_json("values.append", Method::POST, url, &body).await?;

    let updated = resp
      .updates
      .and_then(|u| u.updated_range)
      .ok_or(Error::UnexpectedResponse {
        call:   "values.append",
        reason: "no updatedRange in response".into(),
      })?;
    let written: A1Range = updated.parse()?;
    info!(range = %written, "appended rows");
    Ok(written)
  }

  async fn clear(&self, range: A1Range) -> Result<()> {
    let a1 = range.to_string();
    let url = self.url("", &["values", format!("{a1}:clear").as_str()])?;
    let _: serde_json::Value =
      self.send_json("values.clear", Method::POST, url, &json!({})).await?;
    info!(range = %a1, "cleared range");
    Ok(())
  }

  async fn tab_titles(&self) -> Result<Vec<String>> {
    let mut url = self.url("", &[])?;
    url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
    let req = self.request(Method::GET, url)?;
    let meta: Spreadsheet = self.send("spreadsheets.get", req).await?;
    Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
  }

  async fn create_tab<'a>(&'a self, title: &'a str) -> Result<()> {
    let url = self.url(":batchUpdate", &[])?;
    let body = json!({
      "requests": [{ "addSheet": { "properties": { "title": title } } }]
    });
    let _: serde_json::Value = self.send_json("batchUpdate", Method::POST, url, &body).await?;
    info!(title, "created tab");
    Ok(())
  }
}
