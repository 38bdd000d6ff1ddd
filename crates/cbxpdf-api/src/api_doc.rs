//! OpenAPI documentation served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::handlers;
use cbxpdf_core::models;
use cbxpdf_infra::ErrorResponse;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cbxpdf API",
        version = "0.1.0",
        description = "Convert comic book archives (.cbz/.cbr) to PDF. Upload archives, preview their pages, then convert one archive, a batch, or a combination of several into a single document. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::archives::upload_archives,
        handlers::archives::get_archive,
        handlers::archives::get_page_count,
        handlers::archives::delete_archive,
        handlers::preview::get_preview,
        handlers::convert::convert,
        handlers::health::health_check,
    ),
    components(schemas(
        ErrorResponse,
        models::ArchiveKind,
        models::ConversionMode,
        handlers::archives::UploadResponse,
        handlers::archives::UploadedArchive,
        handlers::archives::RejectedUpload,
        handlers::archives::ArchiveResponse,
        handlers::archives::PageCountResponse,
        handlers::convert::ConvertRequest,
        handlers::convert::GlobalSettings,
        handlers::convert::JobRequest,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "archives", description = "Upload, inspect, preview and delete comic archives"),
        (name = "convert", description = "Convert archives to PDF"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
