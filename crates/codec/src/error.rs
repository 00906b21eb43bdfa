//! Error types for the codec crate.

use sheetcell_image::ImageError;
use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while encoding, decoding or storing an asset.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Rasterizing or compressing the source failed
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The best-effort payload still exceeds the slots reserved for it
    #[error("Asset too large: {length} characters exceed the {ceiling}-character ceiling")]
    AssetTooLarge {
        /// Character length of the compressed payload
        length: usize,
        /// Capacity of all slots combined
        ceiling: usize,
    },

    /// Chunks cannot be reassembled (duplicate ordinals)
    #[error("Malformed chunks: {0}")]
    MalformedChunks(String),

    /// The row-storage collaborator failed
    #[error("Storage error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CodecError {
    /// Whether choosing a different (or smaller) source image could succeed.
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            CodecError::Image(e) => {
                e.is_source_error() || matches!(e, ImageError::BudgetUnreachable { .. })
            }
            CodecError::AssetTooLarge { .. } => true,
            _ => false,
        }
    }
}
