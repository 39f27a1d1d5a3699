//! Tabular record stores holding one row per submission
//!
//! A store is opened per request for one spreadsheet and a fixed column
//! set. Submitted fields are placed by column name; the store never adds
//! columns on its own.

pub mod init;
pub mod memory;
pub mod redis_store;
pub mod sheets;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use zkform_common::SubmissionField;

pub use init::StoreInitRegistry;
pub use memory::MemoryStoreProvider;
pub use redis_store::RedisStoreProvider;
pub use sheets::SheetsStoreProvider;

/// A stored row, keyed by column name
pub type Row = HashMap<String, String>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Row serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store is not initialized: {0}")]
    NotInitialized(String),
}

/// Persistent table of submissions
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn spreadsheet_id(&self) -> &str;

    /// Write the header row; run once per spreadsheet
    async fn init(&self) -> Result<(), StoreError>;

    /// First row whose `column` equals `value`
    async fn get(&self, column: &str, value: &str) -> Result<Option<Row>, StoreError>;

    /// Append one row
    async fn add(&self, fields: &[SubmissionField]) -> Result<(), StoreError>;
}

/// Opens stores for a spreadsheet id and column set
pub trait StoreProvider: Send + Sync {
    fn open(&self, spreadsheet_id: &str, columns: Vec<String>) -> Arc<dyn RecordStore>;
}

/// Lay `fields` out along `columns`
///
/// Later fields win over earlier ones with the same name. Fields without a
/// column are dropped; columns without a field stay empty.
pub fn align_row(columns: &[String], fields: &[SubmissionField]) -> Vec<String> {
    let mut by_name: HashMap<&str, &str> = HashMap::with_capacity(fields.len());
    for field in fields {
        by_name.insert(field.name.as_str(), field.value.as_str());
    }

    for field in fields {
        if !columns.iter().any(|c| c == &field.name) {
            debug!("Dropping field without column: {}", field.name);
        }
    }

    columns
        .iter()
        .map(|column| by_name.get(column.as_str()).unwrap_or(&"").to_string())
        .collect()
}

/// Pair header cells with row cells
pub fn row_from_cells(header: &[String], cells: &[String]) -> Row {
    header
        .iter()
        .enumerate()
        .map(|(i, column)| (column.clone(), cells.get(i).cloned().unwrap_or_default()))
        .collect()
}
