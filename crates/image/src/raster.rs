//! The rasterizer seam between the compressor and an image backend.

use crate::media::MediaType;
use crate::payload::EncodedPayload;
use crate::Result;

/// One render of a decoded source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
    /// Encoder quality in `[0, 1]`; 1 is near-lossless
    pub quality: f32,
    /// Output media type
    pub media_type: MediaType,
}

/// Output of a render: the payload and the pixel size actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Encoded image
    pub payload: EncodedPayload,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

/// Decodes a source image once and renders it any number of times.
///
/// Implementations must fit the output inside the request envelope while
/// preserving aspect ratio, and must never upscale.
pub trait Rasterizer {
    /// Decoded, render-ready form of a source image.
    type Source;

    /// Decode raw source bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Source>;

    /// Intrinsic `(width, height)` of a decoded source.
    fn dimensions(&self, source: &Self::Source) -> (u32, u32);

    /// Resize and re-encode a decoded source.
    fn render(&self, source: &Self::Source, request: &RenderRequest) -> Result<Rendered>;

    /// Decode and render in one step.
    fn render_bytes(&self, bytes: &[u8], request: &RenderRequest) -> Result<Rendered> {
        let source = self.decode(bytes)?;
        self.render(&source, request)
    }
}
