//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use cbxpdf_core::Config;

use crate::state::AppState;

/// Initialize telemetry, the service graph and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    cbxpdf_infra::init_telemetry(config.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let state = AppState::new(config.clone()).context("Failed to initialize archive storage")?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
