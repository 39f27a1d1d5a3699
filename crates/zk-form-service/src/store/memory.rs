//! In-process store for development and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use zkform_common::SubmissionField;

use super::{align_row, row_from_cells, RecordStore, Row, StoreError, StoreProvider};

#[derive(Debug, Default)]
struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Hands out stores sharing rows per spreadsheet id
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreProvider {
    sheets: Arc<std::sync::Mutex<HashMap<String, Arc<RwLock<Sheet>>>>>,
}

impl MemoryStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn sheet(&self, spreadsheet_id: &str) -> Arc<RwLock<Sheet>> {
        let mut sheets = self
            .sheets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sheets.entry(spreadsheet_id.to_string()).or_default().clone()
    }

    /// Snapshot of the rows written to `spreadsheet_id`
    pub async fn rows(&self, spreadsheet_id: &str) -> Vec<Row> {
        let sheet = self.sheet(spreadsheet_id);
        let sheet = sheet.read().await;
        sheet
            .rows
            .iter()
            .map(|cells| row_from_cells(&sheet.header, cells))
            .collect()
    }
}

impl StoreProvider for MemoryStoreProvider {
    fn open(&self, spreadsheet_id: &str, columns: Vec<String>) -> Arc<dyn RecordStore> {
        Arc::new(MemoryStore {
            spreadsheet_id: spreadsheet_id.to_string(),
            columns,
            sheet: self.sheet(spreadsheet_id),
        })
    }
}

/// Store backed by process memory
pub struct MemoryStore {
    spreadsheet_id: String,
    columns: Vec<String>,
    sheet: Arc<RwLock<Sheet>>,
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn init(&self) -> Result<(), StoreError> {
        self.sheet.write().await.header = self.columns.clone();
        Ok(())
    }

    async fn get(&self, column: &str, value: &str) -> Result<Option<Row>, StoreError> {
        let sheet = self.sheet.read().await;
        let Some(index) = sheet.header.iter().position(|c| c == column) else {
            return Ok(None);
        };

        Ok(sheet
            .rows
            .iter()
            .find(|cells| cells.get(index).map(String::as_str) == Some(value))
            .map(|cells| row_from_cells(&sheet.header, cells)))
    }

    async fn add(&self, fields: &[SubmissionField]) -> Result<(), StoreError> {
        let mut sheet = self.sheet.write().await;
        if sheet.header.is_empty() {
            return Err(StoreError::NotInitialized(self.spreadsheet_id.clone()));
        }

        let cells = align_row(&self.columns, fields);
        sheet.rows.push(cells);
        debug!(
            "Appended row {} to {}",
            sheet.rows.len(),
            self.spreadsheet_id
        );
        Ok(())
    }
}
