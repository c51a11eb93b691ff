//! Read-only access to a Google Sheets document.
//!
//! The retriever only ever needs three things from the remote document: the
//! list of sheet titles, a sheet's header row, and its data rows. Those are
//! exposed through [`DocumentClient`] so the retrieval logic can run against
//! an in-memory document in tests.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::auth::TokenSource;
use crate::config::Config;

/// Remote spreadsheet document.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Fetch the document's sheet list.
    async fn load_metadata(&self) -> Result<DocumentMetadata>;

    /// Fetch every populated cell of the sheet with this title.
    async fn load_sheet(&self, title: &str) -> Result<Sheet>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
}

impl DocumentMetadata {
    pub fn sheet_by_title(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets
            .iter()
            .map(|s| &s.properties)
            .find(|p| p.title == title)
    }
}

/// A sheet's values: the first row is the header, the rest are data rows.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    title: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn from_values(title: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        let mut values = values.into_iter();
        let header = values
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        Self {
            title: title.into(),
            header,
            rows: values.collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn header_values(&self) -> &[String] {
        &self.header
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header.iter().any(|h| h == column)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            header: &self.header,
            cells,
        })
    }
}

/// One data row, addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    header: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell under `column`. Trailing cells the API omitted read as `None`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.header.iter().position(|h| h == column)?;
        self.cells.get(index).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Sheets v4 REST client authenticated with a bearer token.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    api_url: Url,
    sheet_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleSheetsClient {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        sheet_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .with_context(|| format!("Invalid Google Sheets API URL: {}", api_url))?;
        if api_url.cannot_be_a_base() {
            bail!("Google Sheets API URL cannot be a base: {}", api_url);
        }

        Ok(Self {
            http,
            api_url,
            sheet_id: sheet_id.into(),
            tokens,
        })
    }

    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        Self::new(http, &config.sheets_api_url, config.sheet_id.clone(), tokens)
    }

    /// `{api_url}/v4/spreadsheets/{sheet_id}/{extra...}` with each segment escaped.
    fn endpoint(&self, extra: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Google Sheets API URL cannot be a base"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.sheet_id.as_str()])
            .extend(extra);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .context("Failed to send request to Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Google Sheets API error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Google Sheets response")
    }
}

/// A1 range covering a whole sheet. Quotes inside the title are doubled.
fn whole_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[async_trait]
impl DocumentClient for GoogleSheetsClient {
    async fn load_metadata(&self) -> Result<DocumentMetadata> {
        let url = self.endpoint(&[])?;
        let metadata: DocumentMetadata = self
            .get_json(url, &[("fields", "sheets.properties(sheetId,title)")])
            .await?;

        debug!("Document has {} sheets", metadata.sheets.len());
        Ok(metadata)
    }

    async fn load_sheet(&self, title: &str) -> Result<Sheet> {
        let range = whole_sheet_range(title);
        let url = self.endpoint(&["values", range.as_str()])?;
        let value_range: ValueRange = self
            .get_json(url, &[("majorDimension", "ROWS")])
            .await?;

        debug!("Loaded {} rows from sheet '{}'", value_range.values.len(), title);
        Ok(Sheet::from_values(title, value_range.values))
    }
}
