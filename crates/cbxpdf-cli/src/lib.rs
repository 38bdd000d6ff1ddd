//! Local conversion without the HTTP server: archives are read from disk,
//! run through the same store and coordinator as the API, and the result is
//! written next to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use cbxpdf_core::{ArchiveKind, Config, ConversionJob, ConversionMode, RenderSettings};
use cbxpdf_services::{ArchiveStore, ConversionCoordinator, ConversionOutput};
use serde::Serialize;
use uuid::Uuid;

/// Parse a 1-based inclusive page range: `3`, `1-5`, `4-` or `-10`.
pub fn parse_page_range(spec: &str) -> anyhow::Result<(Option<usize>, Option<usize>)> {
    fn page(part: &str) -> anyhow::Result<Option<usize>> {
        let part = part.trim();
        if part.is_empty() {
            return Ok(None);
        }
        let n: usize = part
            .parse()
            .with_context(|| format!("'{}' is not a page number", part))?;
        if n == 0 {
            anyhow::bail!("Page numbers start at 1");
        }
        Ok(Some(n))
    }

    match spec.split_once('-') {
        Some((start, end)) => {
            let range = (page(start)?, page(end)?);
            if range == (None, None) {
                anyhow::bail!("Page range '{}' names no pages", spec);
            }
            Ok(range)
        }
        None => {
            let n = page(spec)?.context("Page range is empty")?;
            Ok((Some(n), Some(n)))
        }
    }
}

/// Where to write `output`: a file path, a directory to put the default
/// name in, or the current directory.
pub fn resolve_output_path(requested: Option<&Path>, output: &ConversionOutput) -> PathBuf {
    match requested {
        Some(path) if path.is_dir() => path.join(&output.filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&output.filename),
    }
}

pub struct ConvertOptions {
    pub mode: ConversionMode,
    pub settings: RenderSettings,
    pub files: Vec<PathBuf>,
}

/// Ingest every file, convert, and return the finished payload.
///
/// In batch mode unreadable archives are skipped with a warning; the other
/// modes need every input.
pub async fn convert_files(
    config: &Config,
    options: ConvertOptions,
) -> anyhow::Result<ConversionOutput> {
    if options.files.is_empty() {
        anyhow::bail!("No input files given");
    }

    let store = Arc::new(ArchiveStore::new(config)?);
    let coordinator = ConversionCoordinator::new(store.clone(), config.extraction_concurrency);

    let mut jobs = Vec::with_capacity(options.files.len());
    for path in &options.files {
        match ingest_path(&store, path).await {
            Ok(id) => jobs.push(ConversionJob::all_pages(id)),
            Err(e) if options.mode == ConversionMode::Batch => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping archive");
            }
            Err(e) => return Err(e),
        }
    }
    if jobs.is_empty() {
        anyhow::bail!("None of the input archives could be read");
    }
    if options.mode == ConversionMode::Single && jobs.len() > 1 {
        tracing::warn!(
            ignored = jobs.len() - 1,
            "Single mode converts the first archive only; use --mode batch or combine"
        );
    }

    let output = coordinator
        .convert(options.mode, options.settings, jobs)
        .await;
    store.shutdown().await;
    Ok(output?)
}

async fn ingest_path(store: &ArchiveStore, path: &Path) -> anyhow::Result<Uuid> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let handle = store
        .ingest(name, Bytes::from(data))
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(handle.id)
}

/// What `cbxpdf info` prints for one archive
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub name: String,
    pub archive_type: ArchiveKind,
    pub total_pages: usize,
    pub pages: Vec<String>,
}

/// Index one archive without converting it.
pub async fn describe_file(config: &Config, path: &Path) -> anyhow::Result<ArchiveSummary> {
    let store = ArchiveStore::new(config)?;
    let id = ingest_path(&store, path).await?;
    let handle = store.get(id)?;
    let summary = ArchiveSummary {
        name: handle.original_name.clone(),
        archive_type: handle.kind,
        total_pages: handle.total_pages(),
        pages: handle.pages.clone(),
    };
    store.shutdown().await;
    Ok(summary)
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cbxpdf=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_range() {
        assert_eq!(parse_page_range("1-5").unwrap(), (Some(1), Some(5)));
        assert_eq!(parse_page_range("3").unwrap(), (Some(3), Some(3)));
        assert_eq!(parse_page_range("4-").unwrap(), (Some(4), None));
        assert_eq!(parse_page_range("-10").unwrap(), (None, Some(10)));
        assert_eq!(parse_page_range(" 2 - 7 ").unwrap(), (Some(2), Some(7)));
    }

    #[test]
    fn test_parse_page_range_rejects_garbage() {
        assert!(parse_page_range("").is_err());
        assert!(parse_page_range("-").is_err());
        assert!(parse_page_range("0-3").is_err());
        assert!(parse_page_range("a-b").is_err());
    }

    #[test]
    fn test_resolve_output_path() {
        let output = ConversionOutput {
            bytes: Vec::new(),
            is_zip: false,
            filename: "issue.pdf".to_string(),
        };
        assert_eq!(resolve_output_path(None, &output), PathBuf::from("issue.pdf"));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_output_path(Some(dir.path()), &output),
            dir.path().join("issue.pdf")
        );

        let file = dir.path().join("custom.pdf");
        assert_eq!(resolve_output_path(Some(&file), &output), file);
    }
}
