//! Domain models for uploaded archives and conversion requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Highest JPEG quality; also the only quality at which PNG pages stay lossless.
pub const MAX_QUALITY: u8 = 100;

/// Quality used when a request does not specify one.
pub const DEFAULT_QUALITY: u8 = 85;

/// Archive kind detected from content (with extension as fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveKind {
    Zip,
    Rar,
    RarEncrypted,
    Unknown,
}

impl ArchiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Rar => "rar",
            ArchiveKind::RarEncrypted => "rar-encrypted",
            ArchiveKind::Unknown => "unknown",
        }
    }

    /// The other readable archive family, used when the first attempt fails.
    pub fn other(self) -> Option<ArchiveKind> {
        match self {
            ArchiveKind::Zip => Some(ArchiveKind::Rar),
            ArchiveKind::Rar => Some(ArchiveKind::Zip),
            ArchiveKind::RarEncrypted | ArchiveKind::Unknown => None,
        }
    }

    /// Map a comic-archive filename extension to its nominal kind.
    pub fn from_file_name(name: &str) -> ArchiveKind {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".cbz") {
            ArchiveKind::Zip
        } else if lower.ends_with(".cbr") {
            ArchiveKind::Rar
        } else {
            ArchiveKind::Unknown
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded archive. `pages` is fixed once the archive has been indexed.
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    pub id: Uuid,
    pub original_name: String,
    pub storage_path: PathBuf,
    pub size: u64,
    pub kind: ArchiveKind,
    pub pages: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ArchiveHandle {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn pdf_filename(&self) -> String {
        derive_pdf_filename(&self.original_name)
    }
}

/// `issue-01.cbz` -> `issue-01.pdf`. Only archive extensions are stripped.
pub fn derive_pdf_filename(original_name: &str) -> String {
    let base = std::path::Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original_name);

    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = base[dot + 1..].to_ascii_lowercase();
            if matches!(ext.as_str(), "cbz" | "cbr" | "zip" | "rar") {
                &base[..dot]
            } else {
                base
            }
        }
        _ => base,
    };

    if stem.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

/// Background fill painted under every page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColor {
    #[default]
    White,
    Black,
}

impl BackgroundColor {
    /// Device RGB components in PDF's 0.0-1.0 range
    pub fn rgb(self) -> (f32, f32, f32) {
        match self {
            BackgroundColor::White => (1.0, 1.0, 1.0),
            BackgroundColor::Black => (0.0, 0.0, 0.0),
        }
    }
}

impl FromStr for BackgroundColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "white" | "#ffffff" | "#fff" => Ok(BackgroundColor::White),
            "black" | "#000000" | "#000" => Ok(BackgroundColor::Black),
            other => Err(AppError::InvalidInput(format!(
                "Invalid background color: {}",
                other
            ))),
        }
    }
}

/// Render settings shared by every job of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub quality: u8,
    pub background: BackgroundColor,
    /// 1-indexed inclusive bounds, clamped against the archive's page count
    pub page_start: Option<usize>,
    pub page_end: Option<usize>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            background: BackgroundColor::White,
            page_start: None,
            page_end: None,
        }
    }
}

impl RenderSettings {
    pub fn new(quality: u8, background: BackgroundColor) -> Result<Self, AppError> {
        if !(1..=MAX_QUALITY).contains(&quality) {
            return Err(AppError::InvalidInput(format!(
                "Quality must be between 1 and {}, got {}",
                MAX_QUALITY, quality
            )));
        }
        Ok(Self {
            quality,
            background,
            page_start: None,
            page_end: None,
        })
    }

    pub fn with_page_range(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.page_start = start;
        self.page_end = end;
        self
    }

    /// Resolve `page_start`/`page_end` into a 0-indexed range for an archive
    /// with `total_pages` pages. Bounds are clamped to `[1, total_pages]` and
    /// swapped when given in reverse.
    pub fn page_range(&self, total_pages: usize) -> Range<usize> {
        if total_pages == 0 {
            return 0..0;
        }
        let start = self.page_start.unwrap_or(1).clamp(1, total_pages);
        let end = self.page_end.unwrap_or(total_pages).clamp(1, total_pages);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        (start - 1)..end
    }
}

/// Pages requested from one archive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page (narrowed by the settings' page range when one is set)
    #[default]
    All,
    /// Explicit 0-indexed pages, converted in the given order
    Indices(Vec<usize>),
}

impl PageSelection {
    pub fn from_option(pages: Option<Vec<usize>>) -> Self {
        match pages {
            Some(indices) => PageSelection::Indices(indices),
            None => PageSelection::All,
        }
    }

    /// Expand into concrete page indices for an archive with `total_pages` pages.
    pub fn resolve(
        &self,
        total_pages: usize,
        settings: &RenderSettings,
    ) -> Result<Vec<usize>, AppError> {
        match self {
            PageSelection::All => Ok(settings.page_range(total_pages).collect()),
            PageSelection::Indices(indices) => {
                if let Some(bad) = indices.iter().find(|&&i| i >= total_pages) {
                    return Err(AppError::InvalidInput(format!(
                        "Page index {} is out of range (archive has {} pages)",
                        bad, total_pages
                    )));
                }
                Ok(indices.clone())
            }
        }
    }
}

/// How jobs of one request are turned into output documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// One archive, one PDF
    #[default]
    Single,
    /// One PDF per archive, zipped when there is more than one
    Batch,
    /// Every archive's pages appended into one PDF
    Combine,
}

impl FromStr for ConversionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(ConversionMode::Single),
            "batch" => Ok(ConversionMode::Batch),
            "combine" | "merge" => Ok(ConversionMode::Combine),
            other => Err(AppError::InvalidInput(format!(
                "Invalid conversion mode: {}",
                other
            ))),
        }
    }
}

/// One source archive and its requested pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub archive_id: Uuid,
    pub pages: PageSelection,
}

impl ConversionJob {
    pub fn all_pages(archive_id: Uuid) -> Self {
        Self {
            archive_id,
            pages: PageSelection::All,
        }
    }

    pub fn with_pages(archive_id: Uuid, pages: Vec<usize>) -> Self {
        Self {
            archive_id,
            pages: PageSelection::Indices(pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_kind_from_file_name() {
        assert_eq!(ArchiveKind::from_file_name("Issue 1.CBZ"), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_file_name("issue.cbr"), ArchiveKind::Rar);
        assert_eq!(ArchiveKind::from_file_name("issue.zip"), ArchiveKind::Unknown);
        assert_eq!(ArchiveKind::from_file_name("cbz"), ArchiveKind::Unknown);
    }

    #[test]
    fn test_archive_kind_other() {
        assert_eq!(ArchiveKind::Zip.other(), Some(ArchiveKind::Rar));
        assert_eq!(ArchiveKind::Rar.other(), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::RarEncrypted.other(), None);
        assert_eq!(ArchiveKind::Unknown.other(), None);
    }

    #[test]
    fn test_archive_kind_serde() {
        assert_eq!(
            serde_json::to_string(&ArchiveKind::RarEncrypted).unwrap(),
            "\"rar-encrypted\""
        );
    }

    #[test]
    fn test_derive_pdf_filename() {
        assert_eq!(derive_pdf_filename("Saga 01.cbz"), "Saga 01.pdf");
        assert_eq!(derive_pdf_filename("saga.v2.CBR"), "saga.v2.pdf");
        assert_eq!(derive_pdf_filename("dir/nested.cbz"), "nested.pdf");
        assert_eq!(derive_pdf_filename("notes.txt"), "notes.txt.pdf");
        assert_eq!(derive_pdf_filename(".cbz"), ".cbz.pdf");
        assert_eq!(derive_pdf_filename(""), "document.pdf");
    }

    #[test]
    fn test_background_color_parse() {
        assert_eq!("white".parse::<BackgroundColor>().unwrap(), BackgroundColor::White);
        assert_eq!("BLACK".parse::<BackgroundColor>().unwrap(), BackgroundColor::Black);
        assert_eq!("#000000".parse::<BackgroundColor>().unwrap(), BackgroundColor::Black);
        assert!("red".parse::<BackgroundColor>().is_err());
        assert_eq!(BackgroundColor::Black.rgb(), (0.0, 0.0, 0.0));
        assert_eq!(BackgroundColor::White.rgb(), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_render_settings_quality_bounds() {
        assert!(RenderSettings::new(0, BackgroundColor::White).is_err());
        assert!(RenderSettings::new(101, BackgroundColor::White).is_err());
        assert!(RenderSettings::new(1, BackgroundColor::White).is_ok());
        assert!(RenderSettings::new(100, BackgroundColor::Black).is_ok());
    }

    #[test]
    fn test_page_range_clamping() {
        let settings = RenderSettings::default();
        assert_eq!(settings.page_range(5), 0..5);
        assert_eq!(settings.page_range(0), 0..0);

        let settings = RenderSettings::default().with_page_range(Some(2), Some(4));
        assert_eq!(settings.page_range(10), 1..4);

        let settings = RenderSettings::default().with_page_range(Some(0), Some(99));
        assert_eq!(settings.page_range(3), 0..3);

        let settings = RenderSettings::default().with_page_range(Some(4), Some(2));
        assert_eq!(settings.page_range(10), 1..4);
    }

    #[test]
    fn test_page_selection_resolve() {
        let settings = RenderSettings::default();
        assert_eq!(
            PageSelection::All.resolve(3, &settings).unwrap(),
            vec![0, 1, 2]
        );
        assert_eq!(
            PageSelection::Indices(vec![2, 0]).resolve(3, &settings).unwrap(),
            vec![2, 0]
        );
        assert!(PageSelection::Indices(vec![0, 3]).resolve(3, &settings).is_err());
    }

    #[test]
    fn test_page_selection_ignores_range_for_explicit_indices() {
        let settings = RenderSettings::default().with_page_range(Some(2), Some(2));
        assert_eq!(
            PageSelection::Indices(vec![0]).resolve(3, &settings).unwrap(),
            vec![0]
        );
        assert_eq!(PageSelection::All.resolve(3, &settings).unwrap(), vec![1]);
    }

    #[test]
    fn test_conversion_mode_parse() {
        assert_eq!("single".parse::<ConversionMode>().unwrap(), ConversionMode::Single);
        assert_eq!("Batch".parse::<ConversionMode>().unwrap(), ConversionMode::Batch);
        assert_eq!("merge".parse::<ConversionMode>().unwrap(), ConversionMode::Combine);
        assert!("zip".parse::<ConversionMode>().is_err());
    }
}
