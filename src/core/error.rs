//! Error types for the sculpting core

use glam::UVec3;
use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("position ({x}, {y}, {z}) out of bounds for field {dims}")]
    OutOfBounds { x: u32, y: u32, z: u32, dims: UVec3 },

    #[error("field dimensions {dims} invalid: every extent must be at least 2")]
    InvalidDimensions { dims: UVec3 },

    #[error("geometry tables built for {layout_dims} but field is {field_dims}; call prepare() after resizing")]
    StaleGeometryTables { layout_dims: UVec3, field_dims: UVec3 },

    #[error("snapshot holds {expected} samples but {actual} bytes were supplied")]
    BlobSizeMismatch { expected: usize, actual: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
