//! Image re-encoding

use super::{run_blocking, Converter, ConverterError, ConverterOptions};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

const FALLBACK_TARGET: &str = "png";

/// Parse a lower-case target extension into an encodable format.
pub fn target_image_format(target: &str) -> Result<ImageFormat, ConverterError> {
    ImageFormat::from_extension(target)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| {
            ConverterError::InvalidInput(format!("unsupported target image format '{}'", target))
        })
}

/// Composite an image with transparency onto a white background.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Convert pixel data to a layout the target encoder accepts.
fn prepare_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Png => img,
        ImageFormat::Jpeg => {
            if img.color().has_alpha() {
                DynamicImage::ImageRgb8(flatten_onto_white(&img))
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => {
            if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
    }
}

/// Decode `bytes` (format sniffed from content) and encode as `target`.
pub fn reencode(bytes: &[u8], target: &str) -> Result<Vec<u8>, ConverterError> {
    let format = target_image_format(target)?;
    let img = image::load_from_memory(bytes)?;
    tracing::debug!(
        width = img.width(),
        height = img.height(),
        target = %target,
        "Re-encoding image"
    );

    let img = prepare_for(img, format);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)?;
    Ok(out.into_inner())
}

/// Re-encodes an uploaded image into `ConverterOptions::target_format`.
pub struct ImageReencoder;

#[async_trait]
impl Converter for ImageReencoder {
    fn name(&self) -> &'static str {
        "image-reencode"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let target = options
            .target_format
            .clone()
            .unwrap_or_else(|| FALLBACK_TARGET.to_string());
        let bytes = tokio::fs::read(input).await?;
        let encoded = run_blocking(move || reencode(&bytes, &target)).await?;
        tokio::fs::write(output, encoded).await?;
        Ok(())
    }
}
