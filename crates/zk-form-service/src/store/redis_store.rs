//! Redis store for self-hosted deployments
//!
//! Keys per spreadsheet id:
//! - `sheet:{id}:columns` list of header cells
//! - `sheet:{id}:rows` list of JSON-encoded rows
//! - `sheet:{id}:index:{column}` hash from cell value to row position

use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, info};
use zkform_common::SubmissionField;

use super::{align_row, row_from_cells, RecordStore, Row, StoreError, StoreProvider};

/// Opens stores sharing one Redis connection
#[derive(Clone)]
pub struct RedisStoreProvider {
    conn: ConnectionManager,
}

impl RedisStoreProvider {
    /// Connect to Redis
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)
            .context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }
}

impl StoreProvider for RedisStoreProvider {
    fn open(&self, spreadsheet_id: &str, columns: Vec<String>) -> Arc<dyn RecordStore> {
        Arc::new(RedisStore {
            spreadsheet_id: spreadsheet_id.to_string(),
            columns,
            conn: self.conn.clone(),
        })
    }
}

/// Store backed by Redis lists and hashes
pub struct RedisStore {
    spreadsheet_id: String,
    columns: Vec<String>,
    conn: ConnectionManager,
}

impl RedisStore {
    fn key(&self, suffix: &str) -> String {
        format!("sheet:{}:{}", self.spreadsheet_id, suffix)
    }

    fn index_key(&self, column: &str) -> String {
        self.key(&format!("index:{}", column))
    }
}

fn redis_err(e: redis::RedisError) -> StoreError {
    StoreError::Redis(e.to_string())
}

#[async_trait]
impl RecordStore for RedisStore {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn init(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key("columns");

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !self.columns.is_empty() {
            pipe.rpush(&key, &self.columns).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(redis_err)?;

        info!(
            "Columns set for spreadsheet {} ({} columns)",
            self.spreadsheet_id,
            self.columns.len()
        );
        Ok(())
    }

    async fn get(&self, column: &str, value: &str) -> Result<Option<Row>, StoreError> {
        let mut conn = self.conn.clone();

        let position: Option<isize> = conn
            .hget(self.index_key(column), value)
            .await
            .map_err(redis_err)?;
        let Some(position) = position else {
            return Ok(None);
        };

        let json: Option<String> = conn
            .lindex(self.key("rows"), position)
            .await
            .map_err(redis_err)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn add(&self, fields: &[SubmissionField]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();

        let cells = align_row(&self.columns, fields);
        let row = row_from_cells(&self.columns, &cells);
        let json = serde_json::to_string(&row)?;

        let len: isize = conn
            .rpush(self.key("rows"), json)
            .await
            .map_err(redis_err)?;
        let position = len - 1;

        // First row with a given value keeps the index entry
        let mut pipe = redis::pipe();
        let mut indexed = 0;
        for (column, value) in self.columns.iter().zip(&cells) {
            if !value.is_empty() {
                pipe.hset_nx(self.index_key(column), value, position).ignore();
                indexed += 1;
            }
        }
        if indexed > 0 {
            pipe.query_async::<_, ()>(&mut conn)
                .await
                .map_err(redis_err)?;
        }

        debug!(
            "Appended row {} to spreadsheet {}",
            position, self.spreadsheet_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn provider() -> RedisStoreProvider {
        RedisStoreProvider::new("redis://127.0.0.1:6379/15")
            .await
            .expect("Failed to connect to test Redis")
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_add_and_get() {
        let provider = provider().await;
        let store = provider.open(
            "redis-test-sheet",
            vec!["VaultId".to_string(), "Email".to_string()],
        );
        store.init().await.unwrap();

        store
            .add(&[
                SubmissionField::new("VaultId", "0xredis"),
                SubmissionField::new("Email", "a@b.c"),
            ])
            .await
            .unwrap();

        let row = store
            .get("VaultId", "0xredis")
            .await
            .unwrap()
            .expect("row");
        assert_eq!(row["Email"], "a@b.c");
        assert!(store.get("VaultId", "0xmissing").await.unwrap().is_none());

        // Clean up
        let mut conn = provider.conn.clone();
        let _: () = redis::cmd("DEL")
            .arg("sheet:redis-test-sheet:columns")
            .arg("sheet:redis-test-sheet:rows")
            .arg("sheet:redis-test-sheet:index:VaultId")
            .arg("sheet:redis-test-sheet:index:Email")
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}
