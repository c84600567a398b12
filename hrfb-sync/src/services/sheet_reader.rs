//! Spreadsheet reader
//!
//! Issues a single values read for the configured range and maps each data
//! row positionally into a [`SheetRow`]:
//!
//! | column | field                        |
//! |--------|------------------------------|
//! | A      | timestamp                    |
//! | B      | employee name                |
//! | C      | department                   |
//! | D–I    | six integer sub-scores       |
//! | J      | open comments                |
//!
//! The header row is checked against a versioned [`SheetSchema`] before any
//! data row is mapped, so a reordered sheet fails the pass instead of
//! silently landing scores in the wrong fields. Individual score cells stay
//! lenient: blank or non-numeric cells become 0.

use crate::error::FetchError;
use crate::types::{AccessToken, SheetSource};
use hrfb_common::SheetRow;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Column contract for the feedback sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSchema {
    pub version: u32,
    pub columns: &'static [&'static str],
}

pub const SHEET_SCHEMA_V1: SheetSchema = SheetSchema {
    version: 1,
    columns: &[
        "Timestamp",
        "Employee Name",
        "Department",
        "Satisfaction Score",
        "Happiness Index",
        "Team Dynamics Score",
        "Leadership Score",
        "Growth Opportunities Score",
        "Company Culture Score",
        "Open Comments",
    ],
};

impl SheetSchema {
    /// Check the header row; extra trailing columns are allowed
    pub fn validate_header(&self, header: &[String]) -> Result<(), FetchError> {
        for (idx, expected) in self.columns.iter().enumerate() {
            let found = header.get(idx).map(String::as_str).unwrap_or("");
            if normalize_header(found) != normalize_header(expected) {
                return Err(FetchError::SchemaMismatch {
                    version: self.version,
                    column: idx + 1,
                    position: column_letter(idx),
                    expected: (*expected).to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Lowercase alphanumerics only, so "Employee  Name:" matches "employee name"
fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Spreadsheet column letter for a zero-based index
fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_cell(cells: &[String], idx: usize) -> Option<String> {
    cells
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Lenient integer decoding: "7" → 7, "7.9" → 7, blank or garbage → 0
fn score_cell(cells: &[String], idx: usize) -> i32 {
    let raw = match cells.get(idx) {
        Some(raw) => raw.trim(),
        None => return 0,
    };
    if let Ok(value) = raw.parse::<i32>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i32,
        _ => {
            if !raw.is_empty() {
                tracing::debug!(column = %column_letter(idx), value = %raw, "Non-numeric score cell coerced to 0");
            }
            0
        }
    }
}

/// Map one data row positionally
pub fn map_row(cells: &[String]) -> SheetRow {
    SheetRow {
        timestamp: cells.first().map(|s| s.trim().to_string()).unwrap_or_default(),
        employee_name: text_cell(cells, 1),
        department: text_cell(cells, 2),
        satisfaction_score: score_cell(cells, 3),
        happiness_index: score_cell(cells, 4),
        team_dynamics_score: score_cell(cells, 5),
        leadership_score: score_cell(cells, 6),
        growth_opportunities_score: score_cell(cells, 7),
        company_culture_score: score_cell(cells, 8),
        open_comments: text_cell(cells, 9),
    }
}

/// Validate the header (when a schema is given), drop it, and map the rest
pub fn rows_from_values(
    values: &[Vec<Value>],
    schema: Option<&SheetSchema>,
) -> Result<Vec<SheetRow>, FetchError> {
    let mut rows = values
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };
    if let Some(schema) = schema {
        schema.validate_header(&header)?;
    }

    Ok(rows.map(|cells| map_row(&cells)).collect())
}

/// Google Sheets values reader
pub struct SheetsReader {
    http_client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    schema: Option<SheetSchema>,
}

impl SheetsReader {
    /// `schema` of `None` disables header validation
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        schema: Option<SheetSchema>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            schema,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with each part encoded
    pub fn values_url(&self) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequest(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", self.range.as_str()]);
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SheetSource for SheetsReader {
    async fn fetch(&self, token: &AccessToken) -> Result<Vec<SheetRow>, FetchError> {
        let url = self.values_url()?;
        tracing::debug!(range = %self.range, "Reading spreadsheet range");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let rows = rows_from_values(&range.values, self.schema.as_ref())?;
        tracing::info!(rows = rows.len(), "Fetched rows from spreadsheet");
        Ok(rows)
    }
}
