use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use cbxpdf_core::AppError;
use cbxpdf_infra::ErrorResponse;

use super::parse_archive_id;
use crate::constants::PREVIEW_CACHE_CONTROL;
use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/archives/{id}/pages/{index}/preview",
    tag = "archives",
    params(
        ("id" = String, Path, description = "Archive ID"),
        ("index" = usize, Path, description = "0-based page index")
    ),
    responses(
        (status = 200, description = "JPEG thumbnail", content_type = "image/jpeg"),
        (status = 400, description = "Page index out of range", body = ErrorResponse),
        (status = 404, description = "Archive not found", body = ErrorResponse),
        (status = 422, description = "Page could not be rendered", body = ErrorResponse),
        (status = 504, description = "Preview generation timed out", body = ErrorResponse)
    )
)]
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_archive_id(&id)?;
    let index: usize = index
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid page index: {}", index)))?;

    let bytes = state.previews.preview(id, index).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, PREVIEW_CACHE_CONTROL),
        ],
        bytes,
    ))
}
