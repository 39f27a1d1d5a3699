//! Google Sheets store over the Sheets v4 REST API

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use zkform_common::SubmissionField;

use super::{align_row, row_from_cells, RecordStore, Row, StoreError, StoreProvider};

/// Opens stores against one Sheets API endpoint
#[derive(Clone)]
pub struct SheetsStoreProvider {
    inner: Arc<SheetsClient>,
}

struct SheetsClient {
    base_url: String,
    access_token: String,
    sheet_name: String,
    client: reqwest::Client,
}

impl SheetsStoreProvider {
    pub fn new(base_url: String, access_token: String, sheet_name: String) -> Self {
        Self {
            inner: Arc::new(SheetsClient {
                base_url: base_url.trim_end_matches('/').to_string(),
                access_token,
                sheet_name,
                client: reqwest::Client::new(),
            }),
        }
    }
}

impl StoreProvider for SheetsStoreProvider {
    fn open(&self, spreadsheet_id: &str, columns: Vec<String>) -> Arc<dyn RecordStore> {
        Arc::new(SheetsStore {
            spreadsheet_id: spreadsheet_id.to_string(),
            columns,
            client: self.inner.clone(),
        })
    }
}

#[derive(Serialize)]
struct ValueRange<'a> {
    values: Vec<&'a [String]>,
}

#[derive(Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// One worksheet of a Google spreadsheet
pub struct SheetsStore {
    spreadsheet_id: String,
    columns: Vec<String>,
    client: Arc<SheetsClient>,
}

impl SheetsStore {
    fn values_url(&self, range: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.client.base_url).map_err(|e| StoreError::Api {
            status: 0,
            message: format!("invalid Sheets API URL: {}", e),
        })?;

        url.path_segments_mut()
            .map_err(|_| StoreError::Api {
                status: 0,
                message: "Sheets API URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);

        Ok(url)
    }

    /// A1 range on the configured sheet; quotes in the name are doubled
    fn sheet_range(&self, cells: Option<&str>) -> String {
        let name = self.client.sheet_name.replace('\'', "''");
        match cells {
            Some(cells) => format!("'{}'!{}", name, cells),
            None => format!("'{}'", name),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn init(&self) -> Result<(), StoreError> {
        let url = self.values_url(&self.sheet_range(Some("1:1")))?;

        let response = self
            .client
            .client
            .put(url)
            .bearer_auth(&self.client.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&ValueRange {
                values: vec![self.columns.as_slice()],
            })
            .send()
            .await?;
        Self::check(response).await?;

        info!(
            "Header row written to spreadsheet {} ({} columns)",
            self.spreadsheet_id,
            self.columns.len()
        );
        Ok(())
    }

    async fn get(&self, column: &str, value: &str) -> Result<Option<Row>, StoreError> {
        let url = self.values_url(&self.sheet_range(None))?;

        let response = self
            .client
            .client
            .get(url)
            .bearer_auth(&self.client.access_token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;
        let range: ValueRangeResponse = Self::check(response).await?.json().await?;

        let mut rows = range.values.into_iter();
        let Some(header) = rows.next() else {
            return Ok(None);
        };
        let Some(index) = header.iter().position(|c| c == column) else {
            debug!("Column {} not in spreadsheet {}", column, self.spreadsheet_id);
            return Ok(None);
        };

        Ok(rows
            .find(|cells| cells.get(index).map(String::as_str) == Some(value))
            .map(|cells| row_from_cells(&header, &cells)))
    }

    async fn add(&self, fields: &[SubmissionField]) -> Result<(), StoreError> {
        let url = self.values_url(&format!("{}:append", self.sheet_range(Some("A1"))))?;
        let cells = align_row(&self.columns, fields);

        let response = self
            .client
            .client
            .post(url)
            .bearer_auth(&self.client.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRange {
                values: vec![cells.as_slice()],
            })
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Appended row to spreadsheet {}", self.spreadsheet_id);
        Ok(())
    }
}
