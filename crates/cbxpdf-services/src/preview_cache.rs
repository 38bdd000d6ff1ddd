//! Bounded cache of rendered preview thumbnails
//!
//! Eviction follows insertion order, not access: lookups use `peek`, which
//! leaves an entry's position untouched, so the oldest insertion is always
//! the next to go.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use lru::LruCache;
use uuid::Uuid;

/// (archive id, 0-based page index)
pub type PreviewKey = (Uuid, usize);

pub struct PreviewCache {
    entries: Mutex<LruCache<PreviewKey, Bytes>>,
}

impl PreviewCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<PreviewKey, Bytes>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &PreviewKey) -> Option<Bytes> {
        self.lock().peek(key).cloned()
    }

    /// Insert or replace. A replaced key counts as a fresh insertion.
    pub fn put(&self, key: PreviewKey, value: Bytes) {
        if let Some(((archive_id, page), _)) = self.lock().push(key, value) {
            if (archive_id, page) != key {
                tracing::debug!(archive_id = %archive_id, page, "Preview evicted");
            }
        }
    }

    /// Drop every entry belonging to `archive_id`; returns how many went.
    pub fn invalidate(&self, archive_id: Uuid) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<PreviewKey> = entries
            .iter()
            .filter(|((id, _), _)| *id == archive_id)
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}
