use std::io::{Cursor, Write};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;
use zip::write::{FileOptions, ZipWriter};

use super::rar4;

pub const RED: [u8; 3] = [220, 20, 20];
pub const GREEN: [u8; 3] = [20, 200, 20];
pub const BLUE: [u8; 3] = [20, 20, 220];

/// Solid-colour PNG
pub fn png(color: [u8; 3], width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Solid-colour JPEG
pub fn jpeg(color: [u8; 3], width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// ZIP archive with the given entries, in the given order
pub fn cbz(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// The classic three-page comic: a.jpg red, b.jpg green, c.jpg blue
pub fn three_page_cbz() -> Vec<u8> {
    cbz(&[
        ("a.jpg", jpeg(RED, 60, 80)),
        ("b.jpg", jpeg(GREEN, 60, 80)),
        ("c.jpg", jpeg(BLUE, 60, 80)),
    ])
}

/// The same three pages in a real RAR, stored out of order
pub fn three_page_cbr() -> Vec<u8> {
    rar4::rar(&[
        ("c.jpg", jpeg(BLUE, 60, 80)),
        ("a.jpg", jpeg(RED, 60, 80)),
        ("b.jpg", jpeg(GREEN, 60, 80)),
    ])
}

/// Centre pixel of each page's image, in page order
pub fn page_colors(pdf: &[u8]) -> Vec<[u8; 3]> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
            let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
            let img = image::load_from_memory(&stream.content).unwrap().to_rgb8();
            img.get_pixel(img.width() / 2, img.height() / 2).0
        })
        .collect()
}

pub fn pdf_page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

/// Channel-wise closeness, for comparing colours after lossy JPEG passes
pub fn close_to(actual: [u8; 3], expected: [u8; 3]) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 40)
}
