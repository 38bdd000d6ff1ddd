//! API constants

/// Versioned prefix for every resource route
pub const API_PREFIX: &str = "/api/v1";

/// Served outside the versioned prefix
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Room for multipart boundaries and part headers on top of the file bytes
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Browser cache lifetime for page previews
pub const PREVIEW_CACHE_CONTROL: &str = "private, max-age=3600";
