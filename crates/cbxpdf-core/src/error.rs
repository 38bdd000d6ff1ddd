//! Error types module
//!
//! All failures in the conversion pipeline are unified under [`AppError`].
//! Archive-level errors abort the job for that archive; page-level errors are
//! logged by the caller and the page is skipped (see [`AppError::is_page_level`]).

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues and bad input files
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ENCRYPTED_ARCHIVE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive is password protected: {0}")]
    EncryptedArchive(String),

    #[error("No images found in archive: {0}")]
    NoImagesFound(String),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Corrupt image: {0}")]
    CorruptImage(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias used across the workspace
pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::UnsupportedFormat(_) => (
            400,
            "UNSUPPORTED_FORMAT",
            false,
            Some("Upload a .cbz or .cbr comic archive"),
            false,
            LogLevel::Debug,
        ),
        AppError::EncryptedArchive(_) => (
            422,
            "ENCRYPTED_ARCHIVE",
            false,
            Some("Remove the password from the archive and upload it again"),
            false,
            LogLevel::Warn,
        ),
        AppError::NoImagesFound(_) => (
            422,
            "NO_IMAGES_FOUND",
            false,
            Some("Check that the archive contains jpg, png, gif or webp pages"),
            false,
            LogLevel::Warn,
        ),
        AppError::EntryNotFound(_) => (
            404,
            "ENTRY_NOT_FOUND",
            false,
            Some("Re-upload the archive; its contents may have changed"),
            false,
            LogLevel::Warn,
        ),
        AppError::CorruptImage(_) => (
            422,
            "CORRUPT_IMAGE",
            false,
            Some("The page image could not be decoded"),
            false,
            LogLevel::Warn,
        ),
        AppError::ExtractionFailed(_) => (
            422,
            "EXTRACTION_FAILED",
            false,
            Some("The archive may be damaged; try repacking it"),
            false,
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the archive ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Timeout(_) => (
            504,
            "TIMEOUT",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::EncryptedArchive(_) => "EncryptedArchive",
            AppError::NoImagesFound(_) => "NoImagesFound",
            AppError::EntryNotFound(_) => "EntryNotFound",
            AppError::CorruptImage(_) => "CorruptImage",
            AppError::ExtractionFailed(_) => "ExtractionFailed",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Timeout(_) => "Timeout",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Per-page failures: the page is skipped and the surrounding document continues.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            AppError::EntryNotFound(_) | AppError::CorruptImage(_) | AppError::ExtractionFailed(_)
        )
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::UnsupportedFormat(ref msg) => {
                format!("Unsupported archive format: {}", msg)
            }
            AppError::EncryptedArchive(ref name) => {
                format!("Archive '{}' is password protected", name)
            }
            AppError::NoImagesFound(ref name) => format!("No images found in '{}'", name),
            AppError::EntryNotFound(ref msg) => msg.clone(),
            AppError::CorruptImage(ref msg) => msg.clone(),
            AppError::ExtractionFailed(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Timeout(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
