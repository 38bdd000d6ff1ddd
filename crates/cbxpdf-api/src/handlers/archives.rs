//! Archive upload, inspection and deletion.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use cbxpdf_core::{AppError, ArchiveHandle, ArchiveKind, ErrorMetadata};
use cbxpdf_infra::ErrorResponse;
use cbxpdf_services::store::archive_extension;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::parse_archive_id;
use crate::error::{multipart_error, HttpAppError};
use crate::state::AppState;

/// Multipart field carrying archive files
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedArchive {
    pub id: Uuid,
    pub name: String,
    pub total_pages: usize,
    pub size: u64,
}

impl From<&ArchiveHandle> for UploadedArchive {
    fn from(handle: &ArchiveHandle) -> Self {
        Self {
            id: handle.id,
            name: handle.original_name.clone(),
            total_pages: handle.total_pages(),
            size: handle.size,
        }
    }
}

/// A file of the upload that was not accepted
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedUpload {
    pub name: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<UploadedArchive>,
    pub errors: Vec<RejectedUpload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResponse {
    pub id: Uuid,
    pub name: String,
    pub archive_type: ArchiveKind,
    /// Entry names in page order
    pub pages: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageCountResponse {
    pub id: Uuid,
    pub total_pages: usize,
}

/// Client-supplied file name without any directory part
fn upload_name(field: &Field<'_>) -> String {
    field
        .file_name()
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(|name| name.trim().to_string())
        .unwrap_or_default()
}

/// Read a part's body, giving up as soon as it passes `limit`.
async fn read_part(field: &mut Field<'_>, name: &str, limit: usize) -> Result<Bytes, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "'{}' exceeds the maximum upload size of {} MB",
                name,
                limit / (1024 * 1024)
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(data))
}

#[utoipa::path(
    post,
    path = "/api/v1/archives",
    tag = "archives",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "At least one archive was accepted", body = UploadResponse),
        (status = 400, description = "Not a .cbz/.cbr file, or no file sent", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Archive is encrypted, unreadable or has no images", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_archives(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let limit = state.store.max_upload_bytes();
    let mut files = Vec::new();
    let mut rejected: Vec<(String, AppError)> = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = upload_name(&field);

        // Decided from the part header alone; the body is never buffered
        if archive_extension(&name).is_none() {
            rejected.push((
                name.clone(),
                AppError::UnsupportedFormat(format!("'{}' is not a .cbz or .cbr file", name)),
            ));
            continue;
        }

        let result = match read_part(&mut field, &name, limit).await {
            Ok(data) => state.store.ingest(&name, data).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(handle) => files.push(UploadedArchive::from(handle.as_ref())),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Upload rejected");
                rejected.push((name, e));
            }
        }
    }

    if files.is_empty() {
        let err = rejected
            .into_iter()
            .next()
            .map(|(_, e)| e)
            .unwrap_or_else(|| AppError::InvalidInput("No file provided".to_string()));
        return Err(err.into());
    }

    tracing::info!(accepted = files.len(), rejected = rejected.len(), "Upload finished");

    let errors = rejected
        .into_iter()
        .map(|(name, e)| RejectedUpload {
            name,
            code: e.error_code().to_string(),
            message: e.client_message(),
        })
        .collect();

    Ok((StatusCode::CREATED, Json(UploadResponse { files, errors })))
}

#[utoipa::path(
    get,
    path = "/api/v1/archives/{id}",
    tag = "archives",
    params(("id" = String, Path, description = "Archive ID")),
    responses(
        (status = 200, description = "Archive with its pages in reading order", body = ArchiveResponse),
        (status = 404, description = "Archive not found", body = ErrorResponse)
    )
)]
pub async fn get_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveResponse>, HttpAppError> {
    let handle = state.store.get(parse_archive_id(&id)?)?;
    Ok(Json(ArchiveResponse {
        id: handle.id,
        name: handle.original_name.clone(),
        archive_type: handle.kind,
        pages: handle.pages.clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/archives/{id}/page-count",
    tag = "archives",
    params(("id" = String, Path, description = "Archive ID")),
    responses(
        (status = 200, description = "Number of pages", body = PageCountResponse),
        (status = 404, description = "Archive not found", body = ErrorResponse)
    )
)]
pub async fn get_page_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PageCountResponse>, HttpAppError> {
    let handle = state.store.get(parse_archive_id(&id)?)?;
    Ok(Json(PageCountResponse {
        id: handle.id,
        total_pages: handle.total_pages(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/archives/{id}",
    tag = "archives",
    params(("id" = String, Path, description = "Archive ID")),
    responses(
        (status = 204, description = "Archive deleted, or it did not exist")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if let Ok(id) = parse_archive_id(&id) {
        state.store.delete(id).await;
        state.previews.purge(id);
    }
    StatusCode::NO_CONTENT
}
