//! Page preview thumbnails
//!
//! Cache first; on a miss the page is extracted and rendered through the
//! extraction queue so only a few previews decode at once.

use std::sync::Arc;

use bytes::Bytes;
use cbxpdf_core::{AppError, AppResult, Config};
use cbxpdf_processing::{extract_entry, PageRasterizer, ThumbnailBounds};
use uuid::Uuid;

use crate::extraction_queue::ExtractionQueue;
use crate::preview_cache::PreviewCache;
use crate::store::ArchiveStore;

pub struct PreviewService {
    store: Arc<ArchiveStore>,
    cache: PreviewCache,
    queue: ExtractionQueue,
    bounds: ThumbnailBounds,
}

impl PreviewService {
    pub fn new(store: Arc<ArchiveStore>, config: &Config) -> Self {
        Self {
            store,
            cache: PreviewCache::new(config.preview_cache_capacity),
            queue: ExtractionQueue::new(config.extraction_concurrency, config.preview_timeout()),
            bounds: ThumbnailBounds {
                max_width: config.thumbnail_max_width,
                max_height: config.thumbnail_max_height,
                quality: config.thumbnail_quality,
            },
        }
    }

    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    pub fn queue(&self) -> &ExtractionQueue {
        &self.queue
    }

    /// JPEG thumbnail of page `index` (0-based) of archive `id`.
    #[tracing::instrument(skip(self), fields(archive_id = %id, page = index))]
    pub async fn preview(&self, id: Uuid, index: usize) -> AppResult<Bytes> {
        let handle = self.store.get(id)?;
        if index >= handle.total_pages() {
            return Err(AppError::InvalidInput(format!(
                "Page index {} is out of range (archive has {} pages)",
                index,
                handle.total_pages()
            )));
        }

        let key = (id, index);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("Preview cache hit");
            return Ok(hit);
        }

        let path = handle.storage_path.clone();
        let kind = handle.kind;
        let name = handle.pages[index].clone();
        let bounds = self.bounds;

        // On timeout this request fails and its slot frees at once; the
        // render itself cannot be interrupted and runs to completion unseen.
        let page = self
            .queue
            .run("Preview generation", move || {
                let raw = extract_entry(&path, kind, &name)?;
                PageRasterizer.thumbnail(&raw, bounds)
            })
            .await?;

        let bytes = Bytes::from(page.bytes);
        self.cache.put(key, bytes.clone());

        // Deleted while rendering: do not keep entries for a gone archive
        if !self.store.contains(id) {
            self.cache.invalidate(id);
        }
        Ok(bytes)
    }

    /// Purge every cached preview of `id`.
    pub fn purge(&self, id: Uuid) -> usize {
        let purged = self.cache.invalidate(id);
        if purged > 0 {
            tracing::debug!(archive_id = %id, purged, "Preview cache purged");
        }
        purged
    }
}
