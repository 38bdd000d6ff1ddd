//! ZIP bundling of converted documents
//!
//! Batch conversions that produce more than one PDF are delivered as a
//! single ZIP. Member order follows the input order.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Download name for a bundle of converted documents
pub const BUNDLE_FILENAME: &str = "comics.zip";

/// Sanitize filename for archive entry to prevent path traversal.
/// Extracts only the base name (strips path components like `../`).
pub fn sanitize_archive_filename(filename: &str, fallback: &str) -> String {
    let normalized = filename.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// `name.pdf` -> `name (n).pdf`
fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &name[..dot], n, &name[dot..]),
        _ => format!("{} ({})", name, n),
    }
}

/// Give every name a unique spelling, keeping the first occurrence as is.
pub fn unique_names<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut candidate = name.to_string();
        let mut n = 1;
        while !seen.insert(candidate.to_lowercase()) {
            candidate = numbered(name, n);
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// Pack `(filename, bytes)` pairs into a ZIP at maximum deflate level.
pub fn bundle_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let safe: Vec<String> = files
        .iter()
        .enumerate()
        .map(|(i, (name, _))| sanitize_archive_filename(name, &format!("document_{}.pdf", i + 1)))
        .collect();
    let names = unique_names(safe.iter().map(String::as_str));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .unix_permissions(0o644);

    for (name, (_, data)) in names.iter().zip(files) {
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add file to ZIP: {}", name))?;
        zip.write_all(data)
            .with_context(|| format!("Failed to write file data to ZIP: {}", name))?;
    }

    let cursor = zip.finish().context("Failed to finalize ZIP archive")?;
    Ok(cursor.into_inner())
}
