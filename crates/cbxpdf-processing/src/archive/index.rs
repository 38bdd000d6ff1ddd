use std::path::Path;

use cbxpdf_core::{AppError, AppResult, ArchiveKind};

use super::{attempt_order, reader_for, EntryInfo};
use crate::natural_sort::natural_sort;

/// Result of listing an archive: the kind that actually read it and its
/// page entries in natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIndex {
    pub kind: ArchiveKind,
    pub pages: Vec<String>,
}

impl ArchiveIndex {
    fn encrypted() -> Self {
        Self {
            kind: ArchiveKind::RarEncrypted,
            pages: Vec::new(),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.kind == ArchiveKind::RarEncrypted
    }
}

enum Attempt {
    Pages(ArchiveIndex),
    Encrypted,
    Empty,
    Failed(AppError),
}

fn attempt(path: &Path, kind: ArchiveKind) -> Attempt {
    let Some(reader) = reader_for(kind) else {
        return Attempt::Empty;
    };

    let entries = match reader.list_entries(path) {
        Ok(entries) => entries,
        Err(AppError::EncryptedArchive(_)) => return Attempt::Encrypted,
        Err(e) => return Attempt::Failed(e),
    };

    let images: Vec<&EntryInfo> = entries.iter().filter(|e| e.is_image()).collect();
    if images.iter().any(|e| e.encrypted) {
        return Attempt::Encrypted;
    }
    if images.is_empty() {
        return Attempt::Empty;
    }

    let mut pages: Vec<String> = images.into_iter().map(|e| e.name.clone()).collect();
    natural_sort(&mut pages);
    Attempt::Pages(ArchiveIndex { kind, pages })
}

/// List the image pages of the archive at `path`, classified as `detected`.
///
/// The detected kind is tried first and the other family second. An archive
/// with any encrypted page comes back as [`ArchiveKind::RarEncrypted`] with
/// no pages; callers must refuse it. Fails with `NoImagesFound` when both
/// kinds read the archive but found no pages, and `UnsupportedFormat` when
/// neither could read it at all.
pub fn list_image_pages(
    path: &Path,
    detected: ArchiveKind,
    display_name: &str,
) -> AppResult<ArchiveIndex> {
    if detected == ArchiveKind::RarEncrypted {
        return Ok(ArchiveIndex::encrypted());
    }

    let order = attempt_order(detected);
    if order.is_empty() {
        return Err(AppError::UnsupportedFormat(display_name.to_string()));
    }

    let mut any_readable = false;
    let mut last_error = None;

    for kind in order {
        match attempt(path, kind) {
            Attempt::Pages(index) => {
                if kind != detected {
                    tracing::debug!(
                        archive = %display_name,
                        detected = %detected,
                        resolved = %kind,
                        "Archive listed under fallback kind"
                    );
                }
                return Ok(index);
            }
            Attempt::Encrypted => return Ok(ArchiveIndex::encrypted()),
            Attempt::Empty => any_readable = true,
            Attempt::Failed(e) => {
                tracing::debug!(
                    archive = %display_name,
                    kind = %kind,
                    error = %e,
                    "Archive listing attempt failed"
                );
                last_error = Some(e);
            }
        }
    }

    if any_readable {
        Err(AppError::NoImagesFound(display_name.to_string()))
    } else {
        Err(AppError::UnsupportedFormat(match last_error {
            Some(e) => format!("'{}' is not a readable ZIP or RAR archive ({})", display_name, e),
            None => format!("'{}' is not a readable ZIP or RAR archive", display_name),
        }))
    }
}
