//! Application state shared by every handler.

use std::sync::Arc;

use cbxpdf_core::{AppResult, Config};
use cbxpdf_services::{ArchiveStore, ConversionCoordinator, PreviewService};

pub struct AppState {
    pub config: Config,
    pub store: Arc<ArchiveStore>,
    pub previews: Arc<PreviewService>,
    pub conversions: Arc<ConversionCoordinator>,
}

impl AppState {
    /// Build a fresh service graph. Every call owns its own storage
    /// directory and cache, so tests can run side by side.
    pub fn new(config: Config) -> AppResult<Arc<Self>> {
        let store = Arc::new(ArchiveStore::new(&config)?);
        let previews = Arc::new(PreviewService::new(store.clone(), &config));
        let conversions = Arc::new(ConversionCoordinator::new(
            store.clone(),
            config.extraction_concurrency,
        ));

        Ok(Arc::new(Self {
            config,
            store,
            previews,
            conversions,
        }))
    }
}
