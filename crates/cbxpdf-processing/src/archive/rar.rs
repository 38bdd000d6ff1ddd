use std::collections::{HashMap, HashSet};
use std::path::Path;

use cbxpdf_core::{AppError, AppResult, ArchiveKind};
use unrar::error::{Code, UnrarError};
use unrar::Archive as RarArchive;

use super::{entry_too_large, ArchiveReader, EntryInfo, EntryReads, MAX_ENTRY_BYTES};

/// RAR / CBR reader
#[derive(Debug, Default, Clone, Copy)]
pub struct RarReader;

fn map_err(context: &str, err: UnrarError) -> AppError {
    if err.code == Code::MissingPassword {
        AppError::EncryptedArchive(context.to_string())
    } else {
        AppError::ExtractionFailed(format!("{}: {}", context, err))
    }
}

/// How one pass over the archive ended
enum Pass {
    Done,
    /// A read failed and took the open handle with it
    Interrupted,
}

/// One sequential pass reading every entry in `pending`.
///
/// Entries are taken out of `pending` as they are reached, so a later pass
/// only looks for what is still missing.
fn scan(path: &Path, pending: &mut HashSet<&str>, out: &mut EntryReads) -> AppResult<Pass> {
    let mut archive = RarArchive::new(path)
        .open_for_processing()
        .map_err(|e| map_err("Failed to open RAR archive", e))?;

    while !pending.is_empty() {
        let Some(header) = archive
            .read_header()
            .map_err(|e| map_err("Failed to read RAR entry", e))?
        else {
            return Ok(Pass::Done);
        };

        let (name, is_dir, size) = {
            let entry = header.entry();
            (
                entry.filename.to_string_lossy().to_string(),
                entry.is_directory(),
                entry.unpacked_size,
            )
        };

        if is_dir || !pending.remove(name.as_str()) {
            archive = header
                .skip()
                .map_err(|e| map_err("Failed to skip RAR entry", e))?;
            continue;
        }

        if size > MAX_ENTRY_BYTES {
            out.insert(name.clone(), Err(entry_too_large(&name, size, MAX_ENTRY_BYTES)));
            archive = header
                .skip()
                .map_err(|e| map_err("Failed to skip RAR entry", e))?;
            continue;
        }

        match header.read() {
            Ok((data, rest)) => {
                let outcome = if data.len() as u64 > MAX_ENTRY_BYTES {
                    Err(entry_too_large(&name, data.len() as u64, MAX_ENTRY_BYTES))
                } else {
                    Ok(data)
                };
                out.insert(name, outcome);
                archive = rest;
            }
            Err(e) => {
                out.insert(name, Err(map_err("Failed to extract RAR entry", e)));
                return Ok(Pass::Interrupted);
            }
        }
    }
    Ok(Pass::Done)
}

impl ArchiveReader for RarReader {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Rar
    }

    fn list_entries(&self, path: &Path) -> AppResult<Vec<EntryInfo>> {
        let archive = RarArchive::new(path)
            .open_for_listing()
            .map_err(|e| map_err("Failed to open RAR archive", e))?;

        let mut entries = Vec::new();
        for header in archive {
            let header = header.map_err(|e| map_err("Failed to read RAR entry", e))?;
            entries.push(EntryInfo {
                name: header.filename.to_string_lossy().to_string(),
                is_dir: header.is_directory(),
                encrypted: header.is_encrypted(),
            });
        }
        Ok(entries)
    }

    fn read_entry(&self, path: &Path, name: &str) -> AppResult<Option<Vec<u8>>> {
        self.read_entries(path, &[name])?
            .remove(name)
            .transpose()
    }

    /// Solid archives decompress every entry up to the one asked for, so all
    /// requested entries are collected in a single pass over the archive.
    fn read_entries(&self, path: &Path, names: &[&str]) -> AppResult<EntryReads> {
        let mut pending: HashSet<&str> = names.iter().copied().collect();
        let mut out = HashMap::new();
        while !pending.is_empty() {
            match scan(path, &mut pending, &mut out)? {
                Pass::Done => break,
                Pass::Interrupted => {
                    tracing::debug!(remaining = pending.len(), "Reopening RAR archive after a failed entry");
                }
            }
        }
        Ok(out)
    }
}
