//! Registry of uploaded archives
//!
//! Each upload is written under a process-owned temporary directory, sniffed
//! and indexed, and only then registered. The registry is the single owner
//! of that storage: deleting a handle removes its file, and dropping the
//! store removes the directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use cbxpdf_core::{AppError, AppResult, ArchiveHandle, ArchiveKind, Config};
use cbxpdf_processing::{classify_file, list_image_pages};
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

/// Accepted upload extensions
pub const ARCHIVE_EXTENSIONS: &[&str] = &["cbz", "cbr"];

/// Lower-cased comic archive extension of `name`, if it has one.
pub fn archive_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

pub struct ArchiveStore {
    root: TempDir,
    handles: RwLock<HashMap<Uuid, Arc<ArchiveHandle>>>,
    max_upload_bytes: usize,
}

impl ArchiveStore {
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cbxpdf-");
        let root = match &config.storage_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };

        tracing::info!(path = %root.path().display(), "Archive storage initialized");

        Ok(Self {
            root,
            handles: RwLock::new(HashMap::new()),
            max_upload_bytes: config.max_upload_size_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Store, sniff and index an uploaded archive.
    ///
    /// Nothing is registered unless the archive yields at least one page;
    /// on any failure the stored file is removed again.
    #[tracing::instrument(skip(self, data), fields(archive.name = %original_name, archive.size = data.len()))]
    pub async fn ingest(&self, original_name: &str, data: Bytes) -> AppResult<Arc<ArchiveHandle>> {
        let ext = archive_extension(original_name).ok_or_else(|| {
            AppError::UnsupportedFormat(format!(
                "'{}' is not a .cbz or .cbr file",
                original_name
            ))
        })?;

        if data.len() > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "'{}' exceeds the maximum upload size of {} MB",
                original_name,
                self.max_upload_bytes / (1024 * 1024)
            )));
        }

        let id = Uuid::new_v4();
        let storage_path = self.root.path().join(format!("{}.{}", id, ext));
        tokio::fs::write(&storage_path, &data).await?;

        match self.index(&storage_path, original_name).await {
            Ok((kind, pages)) => {
                let handle = Arc::new(ArchiveHandle {
                    id,
                    original_name: original_name.to_string(),
                    storage_path,
                    size: data.len() as u64,
                    kind,
                    pages,
                    created_at: Utc::now(),
                });
                self.write_lock().insert(id, handle.clone());

                tracing::info!(
                    archive_id = %id,
                    kind = %handle.kind,
                    pages = handle.total_pages(),
                    "Archive ingested"
                );
                Ok(handle)
            }
            Err(e) => {
                remove_file_quietly(&storage_path).await;
                Err(e)
            }
        }
    }

    async fn index(&self, path: &Path, original_name: &str) -> AppResult<(ArchiveKind, Vec<String>)> {
        let path = path.to_path_buf();
        let name = original_name.to_string();

        tokio::task::spawn_blocking(move || {
            let detected = classify_file(&path, Some(&name))?;
            if detected == ArchiveKind::Unknown {
                return Err(AppError::UnsupportedFormat(name));
            }

            let index = list_image_pages(&path, detected, &name)?;
            if index.is_encrypted() {
                return Err(AppError::EncryptedArchive(name));
            }
            Ok((index.kind, index.pages))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Indexing task failed: {}", e)))?
    }

    pub fn find(&self, id: Uuid) -> Option<Arc<ArchiveHandle>> {
        self.read_lock().get(&id).cloned()
    }

    pub fn get(&self, id: Uuid) -> AppResult<Arc<ArchiveHandle>> {
        self.find(id)
            .ok_or_else(|| AppError::NotFound(format!("Archive {} not found", id)))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.read_lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget an archive and remove its file. Unknown ids are a no-op;
    /// returns whether anything was removed.
    pub async fn delete(&self, id: Uuid) -> bool {
        let removed = self.write_lock().remove(&id);
        match removed {
            Some(handle) => {
                remove_file_quietly(&handle.storage_path).await;
                tracing::info!(archive_id = %id, "Archive deleted");
                true
            }
            None => false,
        }
    }

    /// Drop every handle and its storage.
    pub async fn shutdown(&self) {
        let drained: Vec<PathBuf> = self
            .write_lock()
            .drain()
            .map(|(_, handle)| handle.storage_path.clone())
            .collect();
        let count = drained.len();
        for path in drained {
            remove_file_quietly(&path).await;
        }
        tracing::info!(archives = count, "Archive storage released");
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Arc<ArchiveHandle>>> {
        self.handles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Arc<ArchiveHandle>>> {
        self.handles.write().unwrap_or_else(|e| e.into_inner())
    }
}

async fn remove_file_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored archive");
        }
    }
}
