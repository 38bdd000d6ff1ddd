//! cbxpdf API Library
//!
//! HTTP handlers, error mapping and application setup for the comic
//! archive to PDF service.

pub mod api_doc;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::{HttpAppError, ValidatedJson};
pub use state::AppState;
