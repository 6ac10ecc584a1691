//! Error types for abelkit.

use thiserror::Error;

/// Result alias for abelkit operations.
pub type AbelResult<T> = std::result::Result<T, AbelError>;

/// Errors that can occur when running abelkit algorithms.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AbelError {
    /// The method does not implement the requested transform direction.
    #[error("{method} does not support the {direction} transform")]
    UnsupportedDirection {
        method: &'static str,
        direction: &'static str,
    },
    /// An alignment, centering or transform method name is unknown.
    #[error("unknown method \"{name}\"")]
    InvalidMethod { name: String },
    /// A benchmark selection names a transform missing from the registry.
    #[error("\"{name}\" is not a valid transform method")]
    InvalidSelection { name: String },
    /// A symmetry check was requested with neither axis selected.
    #[error("symmetry check requires at least one symmetry axis")]
    DegenerateSymmetryCheck,
    /// Image dimensions are zero or overflow.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is too short for the requested layout.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest extends past the image bounds.
    #[error("roi ({x}, {y}, {width}x{height}) outside image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two inputs that must agree in size do not.
    #[error("{context}: expected {expected}, got {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
