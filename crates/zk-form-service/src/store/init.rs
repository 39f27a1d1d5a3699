//! One-time schema initialization per spreadsheet

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::info;

use super::{RecordStore, StoreError};

/// Tracks which spreadsheets have had their header row written
///
/// Concurrent first requests for one spreadsheet share a single in-flight
/// `init`. A failed `init` leaves the entry unset so a later request retries.
#[derive(Debug, Default)]
pub struct StoreInitRegistry {
    cells: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl StoreInitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `store.init()` unless its spreadsheet was already initialized
    pub async fn ensure_initialized(&self, store: &dyn RecordStore) -> Result<(), StoreError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(store.spreadsheet_id().to_string())
                .or_default()
                .clone()
        };

        cell.get_or_try_init(|| async {
            info!("Initializing spreadsheet {}", store.spreadsheet_id());
            store.init().await
        })
        .await?;

        Ok(())
    }

    pub async fn is_initialized(&self, spreadsheet_id: &str) -> bool {
        self.cells
            .lock()
            .await
            .get(spreadsheet_id)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }
}
