//! zk-form Service
//!
//! REST API verifying zero-knowledge form submissions

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zk_form_service::{build_state, create_router, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zk_form_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting zk-form Service");
    info!("Spaces config: {}", config.spaces_config.display());
    info!("Verifier URL: {}", config.verifier_url);
    info!("Store backend: {:?}", config.store_backend);
    if config.flags.is_dev {
        warn!("Development mode: verifying against the shared development app id");
    }
    if config.flags.is_demo {
        warn!("Demo mode: impersonation enabled, duplicate submissions accepted");
    }

    // Create application state
    let state = build_state(&config).await?;

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("zk-form Service running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
