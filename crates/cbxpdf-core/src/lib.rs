//! cbxpdf Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by every cbxpdf component.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use models::{
    derive_pdf_filename, ArchiveHandle, ArchiveKind, BackgroundColor, ConversionJob,
    ConversionMode, PageSelection, RenderSettings, DEFAULT_QUALITY, MAX_QUALITY,
};
