//! Image side of the sheetcell pipeline.
//!
//! This crate provides:
//! - Payload sizing ([`measure`]) for base64 text with or without a `data:` prefix
//! - Media type sniffing from magic bytes
//! - Aspect-preserving envelope math
//! - The [`Rasterizer`] seam and an `image`-crate implementation
//! - [`AdaptiveCompressor`], which recompresses until a byte budget is met

#![warn(missing_docs)]

mod error;
mod media;
mod meter;
mod payload;
mod raster;
pub mod compress;
pub mod envelope;

#[cfg(feature = "processing")]
mod alpha;

#[cfg(feature = "processing")]
mod render;

pub use compress::{AdaptiveCompressor, Attempt, Compressed, CompressionPolicy, Exhaustion};
pub use envelope::{fit_within, scale_dimensions};
pub use error::{ImageError, Result};
pub use media::{sniff_media_type, MediaType, MAGIC_BYTES_LEN};
pub use meter::{byte_budget_for_chars, encoded_len, measure};
pub use payload::{strip_prefix, EncodedPayload};
pub use raster::{Rasterizer, RenderRequest, Rendered};

#[cfg(feature = "processing")]
pub use alpha::{flatten_alpha, has_alpha_channel, DEFAULT_BACKGROUND};

#[cfg(feature = "processing")]
pub use render::{render_image, ImageRasterizer};
