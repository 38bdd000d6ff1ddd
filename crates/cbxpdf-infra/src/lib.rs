//! cbxpdf Infrastructure Library
//!
//! Shared infrastructure used by the API server and the CLI:
//! - Telemetry initialization (tracing subscriber)
//! - Request ID middleware
//! - Error response payload
//! - ZIP bundling of converted documents

pub mod bundle;
pub mod error;
pub mod middleware;
pub mod telemetry;

// Re-export commonly used types
pub use bundle::{bundle_files, sanitize_archive_filename, BUNDLE_FILENAME};
pub use error::ErrorResponse;
pub use middleware::{get_request_id, request_id_middleware, RequestId};
pub use telemetry::{init_telemetry, shutdown_telemetry};
