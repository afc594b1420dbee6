//! Error types for TerraClump

use thiserror::Error;

/// Main error type for TerraClump operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Label and spectral rasters (or the bands of a stack) are not co-registered
    #[error("Raster dimension mismatch: expected ({expected_rows}, {expected_cols}), got ({rows}, {cols})")]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Band count mismatch: expected {expected} bands, got {actual}")]
    BandCountMismatch { expected: usize, actual: usize },

    #[error("Label {label} exceeds clump table capacity {capacity}")]
    LabelOutOfRange { label: u32, capacity: u32 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for TerraClump operations
pub type Result<T> = std::result::Result<T, Error>;
