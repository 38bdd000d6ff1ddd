pub mod archives;
pub mod convert;
pub mod health;
pub mod preview;

use cbxpdf_core::AppError;
use uuid::Uuid;

/// Archive ids arrive as path or body strings. Anything that is not a
/// UUID cannot name a stored archive, so it is reported as not found.
pub(crate) fn parse_archive_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::NotFound(format!("Archive {} not found", raw)))
}
