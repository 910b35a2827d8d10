//! Error types for gapgrid

use thiserror::Error;

/// Main error type for gapgrid operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid target size for {operation}: {src_width}x{src_height} -> {width}x{height}")]
    InvalidTargetSize {
        operation: &'static str,
        src_width: usize,
        src_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Invalid {family} method: {name}")]
    InvalidMethod { family: &'static str, name: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported grid geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Grid geometry mismatch: {0}")]
    GeometryMismatch(String),
}

impl Error {
    /// True for the size-contract family (wrong direction or wrong buffer shape)
    pub fn is_size_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidTargetSize { .. } | Error::SizeMismatch { .. } | Error::InvalidDimensions { .. }
        )
    }
}

/// Result type alias for gapgrid operations
pub type Result<T> = std::result::Result<T, Error>;
