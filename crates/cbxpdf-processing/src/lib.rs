//! cbxpdf Processing Library
//!
//! Blocking building blocks of the conversion pipeline: archive format
//! detection, page listing and extraction for ZIP and RAR containers, page
//! re-encoding and PDF assembly. Nothing here touches the async runtime;
//! callers run these functions on blocking threads.

pub mod archive;
pub mod natural_sort;
pub mod pdf;
pub mod raster;
pub mod sniff;

pub use archive::{
    extract_entries, extract_entry, list_image_pages, resolve_name, ArchiveIndex, ArchiveReader,
    EntryInfo, IMAGE_EXTENSIONS, MAX_ENTRY_BYTES,
};
pub use natural_sort::{natural_cmp, natural_sort};
pub use pdf::{fit_to_canvas, PdfAssembler, Placement, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use raster::{EncodedPage, PageFormat, PageRasterizer, ThumbnailBounds};
pub use sniff::{classify, classify_file, RAR5_SIGNATURE, RAR_SIGNATURE, ZIP_SIGNATURE};
