//! zk-form Service
//!
//! Verifies zero-knowledge form submissions with an external proof
//! verifier and records the verified attributes in a spreadsheet.
//!
//! ## Endpoints
//!
//! - `POST /api/zk-form/verify` - Verify a submission and record it
//! - `GET /health` - Health check

pub mod config;
pub mod handlers;
pub mod processor;
pub mod registry;
pub mod store;
pub mod verifier;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{Config, EnvFlags, StoreBackend};
pub use handlers::AppState;
pub use processor::{ProcessError, Submission, SubmissionProcessor, SubmissionStatus};
pub use registry::{SpaceRegistry, StaticSpaceRegistry};
pub use store::{RecordStore, StoreInitRegistry, StoreProvider};
pub use verifier::{HttpProofVerifier, ProofVerifier, VerifyError};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/zk-form/verify", post(handlers::verify_handler))
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Wire registry, verifier and store backend from configuration
pub async fn build_state(config: &Config) -> Result<AppState> {
    let registry = StaticSpaceRegistry::from_file(&config.spaces_config).with_context(|| {
        format!(
            "Failed to load spaces from {}",
            config.spaces_config.display()
        )
    })?;

    let verifier = HttpProofVerifier::new(
        config.verifier_url.clone(),
        Duration::from_secs(config.verifier_timeout_secs),
        config.flags,
    )
    .context("Failed to build verifier client")?;

    let stores: Arc<dyn StoreProvider> = match config.store_backend {
        StoreBackend::Sheets => {
            let token = config
                .sheets_access_token
                .clone()
                .context("SHEETS_ACCESS_TOKEN is not set")?;
            Arc::new(store::SheetsStoreProvider::new(
                config.sheets_api_url.clone(),
                token,
                config.sheets_sheet_name.clone(),
            ))
        }
        StoreBackend::Redis => Arc::new(
            store::RedisStoreProvider::new(&config.redis_url)
                .await
                .context("Failed to initialize Redis store")?,
        ),
        StoreBackend::Memory => Arc::new(store::MemoryStoreProvider::new()),
    };

    let processor = SubmissionProcessor::new(
        Arc::new(registry),
        Arc::new(verifier),
        stores,
        config.flags,
    );

    Ok(AppState { processor })
}
