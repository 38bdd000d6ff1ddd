//! cbxpdf Services Layer
//!
//! Async orchestration on top of the blocking pipeline in
//! `cbxpdf-processing`: the archive registry and its storage, the preview
//! cache and bounded extraction queue, and the conversion coordinator. The
//! API and CLI depend on this crate as their single service facade.

pub mod conversion;
pub mod extraction_queue;
pub mod preview;
pub mod preview_cache;
pub mod store;

pub use conversion::{ConversionCoordinator, ConversionOutput};
pub use extraction_queue::ExtractionQueue;
pub use preview::PreviewService;
pub use preview_cache::{PreviewCache, PreviewKey};
pub use store::ArchiveStore;

pub use cbxpdf_infra::{bundle_files, BUNDLE_FILENAME};
pub use cbxpdf_processing::{PageRasterizer, ThumbnailBounds};
