#![allow(dead_code)]

pub mod fixtures;
pub mod rar4;

use std::sync::Arc;

use bytes::Bytes;
use cbxpdf_core::{ArchiveHandle, Config};
use cbxpdf_services::{ArchiveStore, ConversionCoordinator, PreviewService};

/// Fresh, isolated service graph per test
pub struct TestServices {
    pub store: Arc<ArchiveStore>,
    pub previews: PreviewService,
    pub coordinator: ConversionCoordinator,
}

pub fn setup_services(config: Config) -> TestServices {
    let store = Arc::new(ArchiveStore::new(&config).expect("store"));
    TestServices {
        previews: PreviewService::new(store.clone(), &config),
        coordinator: ConversionCoordinator::new(store.clone(), config.extraction_concurrency),
        store,
    }
}

impl TestServices {
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Arc<ArchiveHandle> {
        self.store
            .ingest(name, Bytes::from(bytes))
            .await
            .expect("ingest")
    }
}
