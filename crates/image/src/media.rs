//! Media types and magic-byte sniffing.

use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};

/// Image media types the pipeline can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// JPEG image
    #[default]
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// WebP image
    WebP,
    /// BMP image
    Bmp,
    /// TIFF image
    Tiff,
    /// AVIF image
    Avif,
    /// HEIC/HEIF image
    Heic,
}

impl MediaType {
    /// MIME type used in the payload prefix.
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::WebP => "image/webp",
            MediaType::Bmp => "image/bmp",
            MediaType::Tiff => "image/tiff",
            MediaType::Avif => "image/avif",
            MediaType::Heic => "image/heic",
        }
    }

    /// Parse a MIME type, ignoring case and any parameters.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/gif" => Some(MediaType::Gif),
            "image/webp" => Some(MediaType::WebP),
            "image/bmp" => Some(MediaType::Bmp),
            "image/tiff" => Some(MediaType::Tiff),
            "image/avif" => Some(MediaType::Avif),
            "image/heic" | "image/heif" => Some(MediaType::Heic),
            _ => None,
        }
    }

    /// Whether the rasterizer can decode sources of this type.
    pub fn is_decodable(&self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png | MediaType::Gif | MediaType::WebP)
    }

    /// Whether the rasterizer can produce output of this type.
    pub fn is_renderable(&self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png)
    }

    /// Whether the quality knob changes the output of this type.
    pub fn is_lossy(&self) -> bool {
        matches!(self, MediaType::Jpeg)
    }
}

/// Leading bytes [`sniff_media_type`] inspects.
pub const MAGIC_BYTES_LEN: usize = 12;

/// Detect the media type of raw image bytes from their magic numbers.
///
/// Only the first [`MAGIC_BYTES_LEN`] bytes are inspected.
///
/// # Example
/// ```
/// use sheetcell_image::{sniff_media_type, MediaType};
///
/// let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
/// assert_eq!(sniff_media_type(&jpeg).unwrap(), MediaType::Jpeg);
///
/// let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert_eq!(sniff_media_type(&png).unwrap(), MediaType::Png);
/// ```
pub fn sniff_media_type(data: &[u8]) -> Result<MediaType> {
    if data.len() < 4 {
        return Err(ImageError::InvalidData("Not enough data for format detection".into()));
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(MediaType::Jpeg);
    }

    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(MediaType::Png);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(MediaType::Gif);
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(MediaType::WebP);
    }

    if data.starts_with(b"BM") {
        return Ok(MediaType::Bmp);
    }

    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Ok(MediaType::Tiff);
    }

    // ISO-BMFF: ....ftyp<brand>
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        match &data[8..12] {
            b"avif" | b"avis" => return Ok(MediaType::Avif),
            b"heic" | b"heix" | b"mif1" => return Ok(MediaType::Heic),
            _ => {}
        }
    }

    Err(ImageError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_common_types() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        assert_eq!(sniff_media_type(&jpeg).unwrap(), MediaType::Jpeg);
        assert_eq!(sniff_media_type(b"GIF89a\x00\x00\x00\x00").unwrap(), MediaType::Gif);
        assert_eq!(sniff_media_type(b"RIFF\x00\x00\x00\x00WEBP").unwrap(), MediaType::WebP);
        assert_eq!(sniff_media_type(b"\x00\x00\x00\x18ftypheic").unwrap(), MediaType::Heic);
    }

    #[test]
    fn test_sniff_rejects_garbage() {
        assert!(matches!(sniff_media_type(&[0, 0, 0, 0]), Err(ImageError::UnknownFormat)));
        assert!(matches!(sniff_media_type(&[0xFF]), Err(ImageError::InvalidData(_))));
    }

    #[test]
    fn test_mime_round_trip() {
        for media in [MediaType::Jpeg, MediaType::Png, MediaType::WebP, MediaType::Heic] {
            assert_eq!(MediaType::from_mime(media.mime_type()), Some(media));
        }
        assert_eq!(MediaType::from_mime("IMAGE/JPG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("image/png; charset=binary"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("text/plain"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(MediaType::Jpeg.is_lossy());
        assert!(!MediaType::Png.is_lossy());
        assert!(MediaType::Png.is_renderable());
        assert!(!MediaType::Gif.is_renderable());
        assert!(MediaType::WebP.is_decodable());
        assert!(!MediaType::Heic.is_decodable());
    }

    #[test]
    fn test_magic_bytes_len_is_enough() {
        let mut webp = b"RIFF\x10\x00\x00\x00WEBPVP8 ".to_vec();
        webp.extend_from_slice(&[0u8; 64]);
        let mut avif = b"\x00\x00\x00\x1cftypavif".to_vec();
        avif.extend_from_slice(&[0u8; 64]);

        for data in [webp, avif] {
            assert_eq!(
                sniff_media_type(&data[..MAGIC_BYTES_LEN]).unwrap(),
                sniff_media_type(&data).unwrap()
            );
        }
    }
}
