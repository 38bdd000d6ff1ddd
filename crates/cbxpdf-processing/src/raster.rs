//! Page re-encoding
//!
//! Every extracted page goes through here before it reaches a PDF or a
//! preview: decode with `image`, validate dimensions, then encode as JPEG
//! with mozjpeg (or PNG when a lossless PNG page is requested).

use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use cbxpdf_core::{AppError, AppResult, MAX_QUALITY};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// Encoding of a re-encoded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Jpeg,
    Png,
}

impl PageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            PageFormat::Jpeg => "image/jpeg",
            PageFormat::Png => "image/png",
        }
    }
}

/// A page ready for embedding
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub bytes: Vec<u8>,
    pub format: PageFormat,
    pub width: u32,
    pub height: u32,
}

/// Bounding box for preview thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailBounds {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for ThumbnailBounds {
    fn default() -> Self {
        Self {
            max_width: 300,
            max_height: 400,
            quality: 70,
        }
    }
}

/// Stateless page codec
#[derive(Debug, Default, Clone, Copy)]
pub struct PageRasterizer;

impl PageRasterizer {
    /// Re-encode a page at `quality`.
    ///
    /// PNG output only happens for PNG sources at maximum quality with
    /// `prefer_png_lossless` set; everything else becomes JPEG.
    pub fn reencode(
        &self,
        raw: &[u8],
        quality: u8,
        prefer_png_lossless: bool,
    ) -> AppResult<EncodedPage> {
        let (img, source_format) = decode(raw)?;

        if prefer_png_lossless && source_format == ImageFormat::Png && quality >= MAX_QUALITY {
            return encode_png(&img);
        }
        encode_guarded(&img, quality)
    }

    /// Render a preview that fits inside `bounds` without upscaling.
    ///
    /// When encoding the resized image fails, the full-resolution image is
    /// encoded instead.
    pub fn thumbnail(&self, raw: &[u8], bounds: ThumbnailBounds) -> AppResult<EncodedPage> {
        let (img, _) = decode(raw)?;

        let resized = panic::catch_unwind(AssertUnwindSafe(|| {
            fit_within(&img, bounds.max_width, bounds.max_height)
        }));
        let primary = match resized {
            Ok(Some(small)) => encode_guarded(&small, bounds.quality),
            Ok(None) => return encode_guarded(&img, bounds.quality),
            Err(_) => Err(AppError::Internal("Thumbnail resize panicked".to_string())),
        };

        match primary {
            Ok(page) => Ok(page),
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail encode failed, retrying without resize");
                encode_guarded(&img, bounds.quality)
            }
        }
    }
}

fn decode(raw: &[u8]) -> AppResult<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(raw)
        .map_err(|e| AppError::CorruptImage(format!("Unrecognised image data: {}", e)))?;
    let img = image::load_from_memory_with_format(raw, format)
        .map_err(|e| AppError::CorruptImage(format!("Failed to decode image: {}", e)))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::CorruptImage(format!(
            "Image has invalid dimensions {}x{}",
            width, height
        )));
    }
    Ok((img, format))
}

/// Downscale to fit the box, keeping aspect ratio. `None` when the image
/// already fits.
fn fit_within(img: &DynamicImage, max_width: u32, max_height: u32) -> Option<DynamicImage> {
    let (width, height) = img.dimensions();
    if width <= max_width && height <= max_height {
        return None;
    }
    Some(img.resize(max_width, max_height, FilterType::Triangle))
}

/// mozjpeg reports codec failures by unwinding; turn those into errors.
fn encode_guarded(img: &DynamicImage, quality: u8) -> AppResult<EncodedPage> {
    match panic::catch_unwind(AssertUnwindSafe(|| encode_jpeg(img, quality))) {
        Ok(result) => result,
        Err(_) => Err(AppError::CorruptImage(
            "JPEG encoder aborted while encoding page".to_string(),
        )),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> AppResult<EncodedPage> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality.clamp(1, MAX_QUALITY) as f32);
    comp.set_optimize_coding(true);

    let mut comp = comp
        .start_compress(Vec::new())
        .map_err(|e| AppError::CorruptImage(format!("JPEG encoding failed: {}", e)))?;
    comp.write_scanlines(&rgb_img)
        .map_err(|e| AppError::CorruptImage(format!("JPEG encoding failed: {}", e)))?;
    let bytes = comp
        .finish()
        .map_err(|e| AppError::CorruptImage(format!("JPEG encoding failed: {}", e)))?;

    Ok(EncodedPage {
        bytes,
        format: PageFormat::Jpeg,
        width,
        height,
    })
}

fn encode_png(img: &DynamicImage) -> AppResult<EncodedPage> {
    let (width, height) = img.dimensions();
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| AppError::CorruptImage(format!("PNG encoding failed: {}", e)))?;

    Ok(EncodedPage {
        bytes: buffer,
        format: PageFormat::Png,
        width,
        height,
    })
}
