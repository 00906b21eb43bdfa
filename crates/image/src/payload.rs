//! Text payloads and their self-describing `data:` prefix.

use crate::media::{sniff_media_type, MediaType};
use crate::{ImageError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Base64 characters decoded when sniffing a bare payload's media type.
const SNIFF_CHARS: usize = 24;

/// Return the encoded-data part of `text`, without any `data:...,` prefix.
pub fn strip_prefix(text: &str) -> &str {
    match text.strip_prefix(DATA_SCHEME) {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
        None => text,
    }
}

/// A base64 image payload.
///
/// The data is always held bare; the prefix is attached only when the
/// payload leaves for display through [`EncodedPayload::to_data_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Media type of the encoded image
    pub media_type: MediaType,
    /// Bare base64 text
    pub data: String,
}

impl EncodedPayload {
    /// Wrap already-encoded base64 text.
    pub fn new(media_type: MediaType, data: impl Into<String>) -> Self {
        Self {
            media_type,
            data: data.into(),
        }
    }

    /// Base64-encode raw image bytes.
    pub fn from_bytes(media_type: MediaType, bytes: &[u8]) -> Self {
        Self::new(media_type, STANDARD.encode(bytes))
    }

    /// Parse text that may or may not carry a `data:` prefix.
    ///
    /// Without a prefix (or with an unrecognised MIME type) the media type is
    /// sniffed from the leading decoded bytes, falling back to JPEG.
    pub fn parse(text: &str) -> Self {
        let declared = text
            .strip_prefix(DATA_SCHEME)
            .and_then(|rest| rest.split_once(','))
            .and_then(|(header, _)| MediaType::from_mime(header));
        let data = strip_prefix(text);
        let media_type = declared
            .or_else(|| sniff_encoded(data))
            .unwrap_or_default();
        Self::new(media_type, data)
    }

    /// Bare base64 text.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Length in characters of the bare text.
    pub fn len(&self) -> usize {
        self.data.chars().count()
    }

    /// Whether the payload holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render as `data:<mime>;base64,<data>` for an image surface.
    pub fn to_data_url(&self) -> String {
        format!(
            "{DATA_SCHEME}{}{BASE64_MARKER},{}",
            self.media_type.mime_type(),
            self.data
        )
    }

    /// Decode back into raw image bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| ImageError::InvalidData(format!("payload is not valid base64: {e}")))
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data_url())
    }
}

fn sniff_encoded(data: &str) -> Option<MediaType> {
    let head = data.get(..SNIFF_CHARS.min(data.len() / 4 * 4))?;
    let bytes = STANDARD.decode(head).ok()?;
    sniff_media_type(&bytes).ok()
}
