//! Conversion coordinator
//!
//! Turns a list of jobs into one downloadable payload:
//! - `single`: the first job becomes one PDF
//! - `batch`: one PDF per job, zipped when more than one succeeds
//! - `combine`: every job's pages appended into one PDF
//!
//! Pages inside a document are always converted sequentially in the
//! requested order. Batch documents run concurrently up to the configured
//! bound, and their results are kept in job order.

use std::sync::Arc;

use cbxpdf_core::{
    AppError, AppResult, ArchiveHandle, ConversionJob, ConversionMode, RenderSettings,
};
use cbxpdf_infra::{bundle_files, BUNDLE_FILENAME};
use cbxpdf_processing::{extract_entries, PageRasterizer, PdfAssembler};
use futures::stream::{self, StreamExt};

use crate::store::ArchiveStore;

/// Download name for combine mode
pub const COMBINED_FILENAME: &str = "combined.pdf";

/// A finished conversion ready to send
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    pub is_zip: bool,
    pub filename: String,
}

impl ConversionOutput {
    pub fn content_type(&self) -> &'static str {
        if self.is_zip {
            "application/zip"
        } else {
            "application/pdf"
        }
    }
}

/// One archive with its pages already resolved to indices
struct PlannedJob {
    handle: Arc<ArchiveHandle>,
    indices: Vec<usize>,
}

pub struct ConversionCoordinator {
    store: Arc<ArchiveStore>,
    rasterizer: PageRasterizer,
    max_concurrent: usize,
}

impl ConversionCoordinator {
    pub fn new(store: Arc<ArchiveStore>, max_concurrent: usize) -> Self {
        Self {
            store,
            rasterizer: PageRasterizer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    fn plan(&self, job: &ConversionJob, settings: &RenderSettings) -> AppResult<PlannedJob> {
        let handle = self.store.get(job.archive_id)?;
        let indices = job.pages.resolve(handle.total_pages(), settings)?;
        if indices.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "No pages selected for '{}'",
                handle.original_name
            )));
        }
        Ok(PlannedJob { handle, indices })
    }

    #[tracing::instrument(skip(self, settings, jobs), fields(mode = ?mode, jobs = jobs.len()))]
    pub async fn convert(
        &self,
        mode: ConversionMode,
        settings: RenderSettings,
        jobs: Vec<ConversionJob>,
    ) -> AppResult<ConversionOutput> {
        if jobs.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one job is required".to_string(),
            ));
        }

        let start = std::time::Instant::now();
        let output = match mode {
            ConversionMode::Single => {
                if jobs.len() > 1 {
                    tracing::debug!(ignored = jobs.len() - 1, "Single mode converts the first job only");
                }
                let planned = self.plan(&jobs[0], &settings)?;
                let filename = planned.handle.pdf_filename();
                let bytes = self.render(vec![planned], settings).await?;
                ConversionOutput {
                    bytes,
                    is_zip: false,
                    filename,
                }
            }
            ConversionMode::Combine => {
                let planned = jobs
                    .iter()
                    .map(|job| self.plan(job, &settings))
                    .collect::<AppResult<Vec<_>>>()?;
                let bytes = self.render(planned, settings).await?;
                ConversionOutput {
                    bytes,
                    is_zip: false,
                    filename: COMBINED_FILENAME.to_string(),
                }
            }
            ConversionMode::Batch => self.convert_batch(jobs, settings).await?,
        };

        tracing::info!(
            filename = %output.filename,
            bytes = output.bytes.len(),
            is_zip = output.is_zip,
            duration_ms = start.elapsed().as_millis() as u64,
            "Conversion finished"
        );
        Ok(output)
    }

    async fn convert_batch(
        &self,
        jobs: Vec<ConversionJob>,
        settings: RenderSettings,
    ) -> AppResult<ConversionOutput> {
        let results: Vec<AppResult<(String, Vec<u8>)>> = stream::iter(jobs)
            .map(|job| async move {
                let planned = self.plan(&job, &settings)?;
                let filename = planned.handle.pdf_filename();
                let bytes = self.render(vec![planned], settings).await?;
                Ok((filename, bytes))
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut files = Vec::new();
        let mut first_error = None;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!(job = i, error = %e, "Batch job failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match files.len() {
            0 => Err(first_error
                .unwrap_or_else(|| AppError::Internal("Batch produced no output".to_string()))),
            1 => {
                let (filename, bytes) = files.remove(0);
                Ok(ConversionOutput {
                    bytes,
                    is_zip: false,
                    filename,
                })
            }
            _ => {
                let bytes = tokio::task::spawn_blocking(move || bundle_files(&files))
                    .await
                    .map_err(|e| AppError::Internal(format!("Bundling task failed: {}", e)))??;
                Ok(ConversionOutput {
                    bytes,
                    is_zip: true,
                    filename: BUNDLE_FILENAME.to_string(),
                })
            }
        }
    }

    /// Build one PDF from `jobs` in order on the blocking pool.
    async fn render(&self, jobs: Vec<PlannedJob>, settings: RenderSettings) -> AppResult<Vec<u8>> {
        let rasterizer = self.rasterizer;
        tokio::task::spawn_blocking(move || {
            let mut pdf = PdfAssembler::new(settings.background);
            for job in &jobs {
                append_pages(&mut pdf, &rasterizer, job, &settings)?;
            }
            if pdf.is_empty() {
                let names: Vec<&str> = jobs.iter().map(|j| j.handle.original_name.as_str()).collect();
                return Err(AppError::ExtractionFailed(format!(
                    "None of the requested pages of {} could be converted",
                    names.join(", ")
                )));
            }
            pdf.finalize()
        })
        .await
        .map_err(|e| AppError::Internal(format!("Conversion task failed: {}", e)))?
    }
}

/// Append a job's pages, skipping pages that fail individually.
///
/// The job's entries are pulled out of the archive together; RAR readers
/// then walk the archive once instead of once per page.
fn append_pages(
    pdf: &mut PdfAssembler,
    rasterizer: &PageRasterizer,
    job: &PlannedJob,
    settings: &RenderSettings,
) -> AppResult<()> {
    let handle = &job.handle;
    let pages: Vec<(usize, &str)> = job
        .indices
        .iter()
        .filter_map(|&index| handle.page(index).map(|name| (index, name)))
        .collect();
    let names: Vec<&str> = pages.iter().map(|(_, name)| *name).collect();
    let raws = extract_entries(&handle.storage_path, handle.kind, &names);

    for ((index, name), raw) in pages.into_iter().zip(raws) {
        let result = raw
            .and_then(|raw| rasterizer.reencode(&raw, settings.quality, true))
            .and_then(|page| pdf.add_page(&page));

        match result {
            Ok(()) => {}
            Err(e) if e.is_page_level() => {
                tracing::warn!(
                    archive_id = %handle.id,
                    page = index,
                    entry = %name,
                    error = %e,
                    "Skipping page"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
