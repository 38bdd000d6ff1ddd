//! Conversion endpoint
//!
//! Accepts the job list as JSON and answers with the finished document as
//! an attachment: a PDF, or a ZIP of PDFs for multi-document batches.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use cbxpdf_core::{
    AppError, BackgroundColor, ConversionJob, ConversionMode, PageSelection, RenderSettings,
};
use cbxpdf_infra::ErrorResponse;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use utoipa::ToSchema;

use super::parse_archive_id;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// `white` or `black` (hex `#fff`/`#000` also accepted)
    pub bg_color: Option<String>,
    /// JPEG quality 1-100; 100 keeps PNG pages lossless
    pub quality: Option<u32>,
    /// 1-based first page, applied to jobs without explicit pages
    pub page_start: Option<usize>,
    /// 1-based last page (inclusive)
    pub page_end: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub file_id: String,
    /// 0-based page indices in output order; `null` for every page
    #[serde(default)]
    pub pages: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub mode: ConversionMode,
    #[serde(default)]
    pub global_settings: GlobalSettings,
    pub jobs: Vec<JobRequest>,
}

impl GlobalSettings {
    fn to_render_settings(&self, default_quality: u8) -> Result<RenderSettings, AppError> {
        let quality = match self.quality {
            Some(q) => u8::try_from(q).map_err(|_| {
                AppError::InvalidInput(format!("Quality must be between 1 and 100, got {}", q))
            })?,
            None => default_quality,
        };
        let background = match self.bg_color.as_deref() {
            Some(color) => color.parse::<BackgroundColor>()?,
            None => BackgroundColor::default(),
        };
        Ok(RenderSettings::new(quality, background)?
            .with_page_range(self.page_start, self.page_end))
    }
}

/// `attachment` disposition with an ASCII fallback name plus the exact
/// UTF-8 name in `filename*`.
pub(crate) fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/convert",
    tag = "convert",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "PDF, or ZIP of PDFs for batch mode", content_type = "application/pdf"),
        (status = 400, description = "Invalid settings or page selection", body = ErrorResponse),
        (status = 404, description = "Archive not found", body = ErrorResponse),
        (status = 422, description = "No page could be converted", body = ErrorResponse)
    )
)]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ConvertRequest>,
) -> Result<Response, HttpAppError> {
    let settings = request
        .global_settings
        .to_render_settings(state.config.default_quality)?;

    let jobs = request
        .jobs
        .into_iter()
        .map(|job| {
            Ok(ConversionJob {
                archive_id: parse_archive_id(&job.file_id)?,
                pages: PageSelection::from_option(job.pages),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let output = state.conversions.convert(request.mode, settings, jobs).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&output.filename))
        .map_err(|e| AppError::Internal(format!("Invalid download name: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(output.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response())
}
