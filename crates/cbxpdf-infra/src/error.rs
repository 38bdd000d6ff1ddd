//! HTTP error response payload
//!
//! The `IntoResponse` conversion for `AppError` lives in the API crate
//! (orphan rule); this crate only owns the wire shape.

use cbxpdf_core::ErrorMetadata;
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable code, e.g. `ENCRYPTED_ARCHIVE`
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    /// Build the payload for an error. Details are only attached when
    /// `include_details` is set and the error is not sensitive.
    pub fn from_error<E: ErrorMetadata>(
        err: &E,
        include_details: bool,
        details: impl FnOnce() -> (String, String),
    ) -> Self {
        let (details, error_type) = if include_details && !err.is_sensitive() {
            let (details, error_type) = details();
            (Some(details), Some(error_type))
        } else {
            (None, None)
        };

        Self {
            error: err.client_message(),
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(str::to_string),
            details,
            error_type,
        }
    }
}
