//! Archive access for comic containers
//!
//! Two readers sit behind [`ArchiveReader`]: ZIP via the `zip` crate and RAR
//! via `unrar`. Both work from a path on disk because the RAR library cannot
//! read from memory.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use cbxpdf_core::{AppError, AppResult, ArchiveKind};

mod index;
mod rar;
mod resolver;
mod zip;

pub use index::{list_image_pages, ArchiveIndex};
pub use rar::RarReader;
pub use resolver::{extract_entries, extract_entry, resolve_name};
pub use self::zip::ZipReader;

/// Extensions that qualify an entry as a comic page (case-insensitive)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Largest decompressed entry accepted; no comic page comes near it
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bound on the buffer reserved from an entry's claimed size
const MAX_PREALLOC_BYTES: u64 = 16 * 1024 * 1024;

/// Per stored name outcome of [`ArchiveReader::read_entries`]
pub type EntryReads = HashMap<String, AppResult<Vec<u8>>>;

/// One entry as recorded in an archive's directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub encrypted: bool,
}

impl EntryInfo {
    pub fn is_image(&self) -> bool {
        !self.is_dir && is_image_name(&self.name)
    }
}

/// Whether an entry name carries one of [`IMAGE_EXTENSIONS`]
pub fn is_image_name(name: &str) -> bool {
    if name.ends_with('/') || name.ends_with('\\') {
        return false;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Read access to one archive family
pub trait ArchiveReader: Send + Sync {
    fn kind(&self) -> ArchiveKind;

    /// List every entry in archive order.
    fn list_entries(&self, path: &Path) -> AppResult<Vec<EntryInfo>>;

    /// Read the entry stored under exactly `name`; `Ok(None)` when absent.
    fn read_entry(&self, path: &Path, name: &str) -> AppResult<Option<Vec<u8>>>;

    /// Read every entry stored under one of `names`. Absent names are left
    /// out; an entry that fails on its own gets an `Err` slot while the
    /// others are still read.
    fn read_entries(&self, path: &Path, names: &[&str]) -> AppResult<EntryReads> {
        let mut out = HashMap::new();
        for name in names {
            match self.read_entry(path, name) {
                Ok(Some(data)) => {
                    out.insert(name.to_string(), Ok(data));
                }
                Ok(None) => {}
                Err(e) => {
                    out.insert(name.to_string(), Err(e));
                }
            }
        }
        Ok(out)
    }
}

pub(crate) fn entry_too_large(name: &str, size: u64, limit: u64) -> AppError {
    AppError::ExtractionFailed(format!(
        "Entry '{}' is larger than the {} byte limit ({} bytes)",
        name, limit, size
    ))
}

/// Read an entry body of at most `limit` bytes.
///
/// `claimed` is the size recorded in the archive directory. It only sizes
/// the initial buffer, and never past [`MAX_PREALLOC_BYTES`].
pub(crate) fn read_capped<R: Read>(
    reader: R,
    claimed: u64,
    limit: u64,
    name: &str,
) -> AppResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(claimed.min(limit).min(MAX_PREALLOC_BYTES) as usize);
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| {
            AppError::ExtractionFailed(format!("Failed to inflate entry '{}': {}", name, e))
        })?;
    if buf.len() as u64 > limit {
        return Err(entry_too_large(name, buf.len() as u64, limit));
    }
    Ok(buf)
}

/// Reader for a readable archive kind.
pub fn reader_for(kind: ArchiveKind) -> Option<&'static dyn ArchiveReader> {
    match kind {
        ArchiveKind::Zip => Some(&ZipReader),
        ArchiveKind::Rar => Some(&RarReader),
        ArchiveKind::RarEncrypted | ArchiveKind::Unknown => None,
    }
}

/// Archive kinds to try, in order, for a container classified as `kind`.
pub(crate) fn attempt_order(kind: ArchiveKind) -> Vec<ArchiveKind> {
    match kind {
        ArchiveKind::Zip | ArchiveKind::Rar => {
            let mut order = vec![kind];
            order.extend(kind.other());
            order
        }
        ArchiveKind::Unknown => vec![ArchiveKind::Zip, ArchiveKind::Rar],
        ArchiveKind::RarEncrypted => Vec::new(),
    }
}
