//! Request and response bodies of the Sheets v4 endpoints we call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kohort_core::sheet::Grid;

/// `ValueRange`: the body of values reads and writes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValueRange {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub range:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub major_dimension: Option<String>,
  /// Omitted by the service when the range holds no values.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub values:          Vec<Vec<Value>>,
}

impl ValueRange {
  pub fn from_grid(range: String, grid: Grid) -> Self {
    Self {
      range:           Some(range),
      major_dimension: Some("ROWS".into()),
      values:          grid
        .into_iter()
        .map(|row| row.into_iter().map(Value::String).collect())
        .collect(),
    }
  }

  pub fn into_grid(self) -> Grid {
    self
      .values
      .into_iter()
      .map(|row| row.into_iter().map(cell_text).collect())
      .collect()
  }
}

/// Render a cell as text. Formatted reads already return strings; numbers
/// and booleans only appear when a caller asks for unformatted values.
pub(crate) fn cell_text(value: Value) -> String {
  match value {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Response of `values:append`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppendResponse {
  #[serde(default)]
  pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateValuesResponse {
  #[serde(default)]
  pub updated_range: Option<String>,
}

/// Spreadsheet metadata, restricted to `sheets.properties.title`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Spreadsheet {
  #[serde(default)]
  pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SheetEntry {
  pub properties: SheetProperties,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SheetProperties {
  pub title: String,
}

/// OAuth userinfo; only the email is used.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct UserInfo {
  #[serde(default)]
  pub email: Option<String>,
}
