//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while rasterizing or compressing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Magic bytes did not match any known image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Source bytes could not be decoded as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// The output image could not be produced
    #[error("Render error: {0}")]
    Render(String),

    /// The convergence loop ran out of attempts while still over budget
    #[error("Budget unreachable: {measured} bytes after {attempts} attempts (budget {budget} bytes)")]
    BudgetUnreachable {
        /// Decoded size of the last rendered payload
        measured: usize,
        /// Byte budget that was requested
        budget: usize,
        /// Convergence attempts spent, including the forced final step
        attempts: usize,
    },

    /// Invalid input data
    #[error("Invalid image data: {0}")]
    InvalidData(String),
}

impl ImageError {
    /// Whether the user can fix this by choosing another source file.
    pub fn is_source_error(&self) -> bool {
        matches!(self, ImageError::UnknownFormat | ImageError::Decode(_))
    }
}
