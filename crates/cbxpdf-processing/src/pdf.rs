//! PDF assembly on fixed A4 canvases
//!
//! Each page is a full-canvas background rectangle followed by one image
//! XObject, scaled to fit (never enlarged) and centred. JPEG pages are
//! embedded as-is with `DCTDecode`; PNG pages are decoded to raw samples and
//! stored with `FlateDecode`, plus an `SMask` when they carry alpha.

use std::io::Write;

use cbxpdf_core::{AppError, AppResult, BackgroundColor};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::raster::{EncodedPage, PageFormat};

/// A4 portrait width in points
pub const CANVAS_WIDTH: f32 = 595.28;
/// A4 portrait height in points
pub const CANVAS_HEIGHT: f32 = 841.89;

/// Where an image lands on the canvas, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Uniform shrink-or-fit scale, centred on both axes.
pub fn fit_to_canvas(image_width: u32, image_height: u32) -> Placement {
    let iw = image_width.max(1) as f32;
    let ih = image_height.max(1) as f32;
    let scale = (CANVAS_WIDTH / iw).min(CANVAS_HEIGHT / ih).min(1.0);
    let width = iw * scale;
    let height = ih * scale;
    Placement {
        x: (CANVAS_WIDTH - width) / 2.0,
        y: (CANVAS_HEIGHT - height) / 2.0,
        width,
        height,
        scale,
    }
}

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

fn deflate(data: &[u8]) -> AppResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn pdf_err(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("{}: {}", context, err))
}

/// Accumulates pages into one PDF document.
///
/// Used once per output file: per archive in single/batch mode, or across
/// every archive in combine mode.
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    background: BackgroundColor,
}

impl PdfAssembler {
    pub fn new(background: BackgroundColor) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            background,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_ids.is_empty()
    }

    /// Append one canvas page showing `page`.
    pub fn add_page(&mut self, page: &EncodedPage) -> AppResult<()> {
        if page.width == 0 || page.height == 0 {
            return Err(AppError::CorruptImage(format!(
                "Page has invalid dimensions {}x{}",
                page.width, page.height
            )));
        }

        let image_id = match page.format {
            PageFormat::Jpeg => self.embed_jpeg(page),
            PageFormat::Png => self.embed_png(page)?,
        };

        let placement = fit_to_canvas(page.width, page.height);
        let (r, g, b) = self.background.rgb();
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("rg", vec![real(r), real(g), real(b)]),
                Operation::new(
                    "re",
                    vec![real(0.0), real(0.0), real(CANVAS_WIDTH), real(CANVAS_HEIGHT)],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(placement.width),
                        real(0.0),
                        real(0.0),
                        real(placement.height),
                        real(placement.x),
                        real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| pdf_err("Failed to encode page content", e))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(CANVAS_WIDTH), real(CANVAS_HEIGHT)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn embed_jpeg(&mut self, page: &EncodedPage) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => page.width as i64,
            "Height" => page.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        };
        self.doc
            .add_object(Stream::new(dict, page.bytes.clone()).with_compression(false))
    }

    fn embed_png(&mut self, page: &EncodedPage) -> AppResult<ObjectId> {
        let img = image::load_from_memory_with_format(&page.bytes, ImageFormat::Png)
            .map_err(|e| AppError::CorruptImage(format!("Failed to decode PNG page: {}", e)))?;

        let smask_id = if img.color().has_alpha() {
            let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
            Some(self.add_flate_image(page.width, page.height, "DeviceGray", &alpha, None)?)
        } else {
            None
        };

        let rgb = match img {
            DynamicImage::ImageRgb8(buf) => buf.into_raw(),
            other => other.to_rgb8().into_raw(),
        };
        self.add_flate_image(page.width, page.height, "DeviceRGB", &rgb, smask_id)
    }

    fn add_flate_image(
        &mut self,
        width: u32,
        height: u32,
        color_space: &str,
        samples: &[u8],
        smask: Option<ObjectId>,
    ) -> AppResult<ObjectId> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        };
        if let Some(smask_id) = smask {
            dict.set("SMask", smask_id);
        }
        let data = deflate(samples)?;
        Ok(self
            .doc
            .add_object(Stream::new(dict, data).with_compression(false)))
    }

    /// Serialize the document.
    pub fn finalize(mut self) -> AppResult<Vec<u8>> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| pdf_err("Failed to write PDF", e))?;
        Ok(out)
    }
}
