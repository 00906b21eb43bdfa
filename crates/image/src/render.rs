//! `Rasterizer` backed by the `image` crate.

use crate::alpha::{flatten_alpha, DEFAULT_BACKGROUND};
use crate::envelope::fit_within;
use crate::media::{sniff_media_type, MediaType};
use crate::payload::EncodedPayload;
use crate::raster::{Rasterizer, RenderRequest, Rendered};
use crate::{ImageError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};
use std::borrow::Cow;
use std::io::Cursor;

/// Rasterizer that decodes with `image` and encodes JPEG or PNG.
#[derive(Debug, Clone)]
pub struct ImageRasterizer {
    /// Resampling filter used when shrinking
    pub filter: FilterType,
    /// Background for transparent pixels in JPEG output
    pub background: [u8; 3],
}

impl Default for ImageRasterizer {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
            background: DEFAULT_BACKGROUND,
        }
    }
}

impl Rasterizer for ImageRasterizer {
    type Source = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        let media_type = sniff_media_type(bytes).map_err(|e| match e {
            ImageError::InvalidData(msg) => ImageError::Decode(msg),
            other => other,
        })?;
        let format = decoder_format(media_type).ok_or_else(|| {
            ImageError::Decode(format!("unsupported source format: {}", media_type.mime_type()))
        })?;

        image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ImageError::Decode(e.to_string()))
    }

    fn dimensions(&self, source: &DynamicImage) -> (u32, u32) {
        (source.width(), source.height())
    }

    fn render(&self, source: &DynamicImage, request: &RenderRequest) -> Result<Rendered> {
        if !request.media_type.is_renderable() {
            return Err(ImageError::Render(format!(
                "cannot encode {}",
                request.media_type.mime_type()
            )));
        }

        let (width, height) = fit_within(
            source.width(),
            source.height(),
            request.max_width,
            request.max_height,
        );
        let resized = if (width, height) == (source.width(), source.height()) {
            Cow::Borrowed(source)
        } else {
            Cow::Owned(source.resize_exact(width, height, self.filter))
        };

        let mut buffer = Cursor::new(Vec::new());
        let written = match request.media_type {
            MediaType::Jpeg => {
                let opaque = DynamicImage::ImageRgb8(flatten_alpha(&resized, self.background));
                opaque.write_to(&mut buffer, ImageOutputFormat::Jpeg(jpeg_quality(request.quality)))
            }
            _ => resized.write_to(&mut buffer, ImageOutputFormat::Png),
        };
        written.map_err(|e| ImageError::Render(e.to_string()))?;

        Ok(Rendered {
            payload: EncodedPayload::from_bytes(request.media_type, buffer.get_ref()),
            width,
            height,
        })
    }
}

/// Decode `bytes`, fit them inside `max_width` x `max_height` and re-encode.
///
/// Convenience wrapper over [`ImageRasterizer`] for one-off renders.
pub fn render_image(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
    quality: f32,
    media_type: MediaType,
) -> Result<EncodedPayload> {
    let request = RenderRequest {
        max_width,
        max_height,
        quality,
        media_type,
    };
    ImageRasterizer::default()
        .render_bytes(bytes, &request)
        .map(|rendered| rendered.payload)
}

/// Map a `[0, 1]` quality onto the JPEG encoder's `1..=100` scale.
fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
}

fn decoder_format(media_type: MediaType) -> Option<image::ImageFormat> {
    match media_type {
        MediaType::Jpeg => Some(image::ImageFormat::Jpeg),
        MediaType::Png => Some(image::ImageFormat::Png),
        MediaType::Gif => Some(image::ImageFormat::Gif),
        MediaType::WebP => Some(image::ImageFormat::WebP),
        _ => None,
    }
}
