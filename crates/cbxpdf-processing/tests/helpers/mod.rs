#![allow(dead_code)]

pub mod rar4;

use std::path::PathBuf;

use tempfile::TempDir;

pub fn write_archive(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
