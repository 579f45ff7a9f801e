//! Test fixtures: small documents and images built in memory.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

pub const SIMPLE_JSON: &str = r#"{"a":1,"b":2}"#;

pub const SIMPLE_CSV: &str = "a,b\n1,2\n";

pub const REPORT_MARKDOWN: &str = "# Report\n\nFirst paragraph.\n\n## Details\n\nSecond.";

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).expect("encode fixture image");
    bytes.into_inner()
}

/// Opaque JPEG with a horizontal gradient.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        let shade = ((x * 255) / width.max(1)) as u8;
        Rgb([shade, 128, 255 - shade])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// PNG whose left half is fully transparent.
pub fn create_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 30, 30, 255])
        }
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}
