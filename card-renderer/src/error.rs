//! Renderer error types.

use thiserror::Error;

/// Result type for export operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while exporting a card.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The composite could not be expressed or parsed as SVG.
    #[error("SVG error: {0}")]
    Svg(String),

    /// Rasterization failed.
    #[error("Raster error: {0}")]
    Raster(String),

    /// Encoding the raster to the output format failed.
    #[error("Encoding error: {0}")]
    Encode(String),
}
