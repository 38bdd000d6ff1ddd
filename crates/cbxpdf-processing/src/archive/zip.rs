use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ::zip::result::ZipError;
use ::zip::ZipArchive;
use cbxpdf_core::{AppError, AppResult, ArchiveKind};

use super::{read_capped, ArchiveReader, EntryInfo, EntryReads, MAX_ENTRY_BYTES};

/// ZIP / CBZ reader
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipReader;

type Archive = ZipArchive<BufReader<File>>;

fn open(path: &Path) -> AppResult<Archive> {
    let file = File::open(path)?;
    ZipArchive::new(BufReader::new(file))
        .map_err(|e| AppError::ExtractionFailed(format!("Failed to open ZIP archive: {}", e)))
}

fn read_one(archive: &mut Archive, name: &str) -> AppResult<Option<Vec<u8>>> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(AppError::ExtractionFailed(format!(
                "Failed to read ZIP entry '{}': {}",
                name, e
            )))
        }
    };

    // The directory's size is only a hint; a crafted archive can claim anything
    let claimed = entry.size();
    read_capped(entry, claimed, MAX_ENTRY_BYTES, name).map(Some)
}

impl ArchiveReader for ZipReader {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    fn list_entries(&self, path: &Path) -> AppResult<Vec<EntryInfo>> {
        let archive = open(path)?;
        Ok(archive
            .file_names()
            .map(|name| EntryInfo {
                name: name.to_string(),
                is_dir: name.ends_with('/'),
                encrypted: false,
            })
            .collect())
    }

    fn read_entry(&self, path: &Path, name: &str) -> AppResult<Option<Vec<u8>>> {
        let mut archive = open(path)?;
        read_one(&mut archive, name)
    }

    fn read_entries(&self, path: &Path, names: &[&str]) -> AppResult<EntryReads> {
        let mut archive = open(path)?;
        let mut out = HashMap::new();
        for name in names {
            match read_one(&mut archive, name) {
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
