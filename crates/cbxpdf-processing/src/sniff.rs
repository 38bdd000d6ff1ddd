//! Archive format detection from magic bytes.
//!
//! Content wins over the file name: plenty of `.cbr` files are really ZIP
//! containers. The extension only decides when no signature matches.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cbxpdf_core::{AppResult, ArchiveKind};

/// ZIP local file header
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// RAR 1.5 - 4.x marker block
pub const RAR_SIGNATURE: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

/// RAR 5.0 marker block
pub const RAR5_SIGNATURE: [u8; 8] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00];

const SNIFF_LEN: usize = 8;

/// Classify `buffer` (the head of an archive, or all of it).
pub fn classify(buffer: &[u8], file_name: Option<&str>) -> ArchiveKind {
    if buffer.starts_with(&ZIP_SIGNATURE) {
        return ArchiveKind::Zip;
    }
    if buffer.starts_with(&RAR_SIGNATURE) || buffer.starts_with(&RAR5_SIGNATURE) {
        return ArchiveKind::Rar;
    }
    file_name
        .map(ArchiveKind::from_file_name)
        .unwrap_or(ArchiveKind::Unknown)
}

/// Classify a file on disk by reading only its first bytes.
pub fn classify_file(path: &Path, file_name: Option<&str>) -> AppResult<ArchiveKind> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(classify(&head, file_name))
}
