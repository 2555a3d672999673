//! Crate-level error types.

use std::fmt;

use crate::gpu::backend::{AllocationError, DrawError};
use crate::util::color::ColorParseError;

/// Convenience alias for results produced by this crate.
pub type BlurResult<T> = Result<T, BlurError>;

/// Errors produced by the blur stage and its configuration layer.
#[derive(Debug)]
pub enum BlurError {
    /// The device rejected a texture, view, or sampler allocation.
    Allocation {
        /// What was being allocated when the device refused.
        label: &'static str,
        /// Backend-reported cause.
        source: AllocationError,
    },
    /// Requested dimensions exceed what the device can allocate.
    InvalidDimensions {
        /// Requested width in texels.
        width: u32,
        /// Requested height in texels.
        height: u32,
        /// Largest supported 2D texture dimension.
        max: u32,
    },
    /// Draws were requested before the stage held any buffers.
    NotAllocated,
    /// A shader pass writes a different format than the stage's buffers.
    FormatMismatch {
        /// Format of the stage's buffers.
        buffers: wgpu::TextureFormat,
        /// Format the pass was built for.
        pass: wgpu::TextureFormat,
    },
    /// The draw context rejected a draw.
    Draw(DrawError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// A color string could not be parsed.
    ColorParse(ColorParseError),
}

impl fmt::Display for BlurError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { label, source } => {
                write!(f, "failed to allocate {label}: {source}")
            }
            Self::InvalidDimensions { width, height, max } => write!(
                f,
                "invalid blur dimensions {width}x{height} (max {max})"
            ),
            Self::NotAllocated => {
                write!(f, "blur stage has no buffers; resize it first")
            }
            Self::FormatMismatch { buffers, pass } => write!(
                f,
                "blur buffers are {buffers:?} but the pass writes {pass:?}"
            ),
            Self::Draw(e) => write!(f, "blur draw rejected: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::ColorParse(e) => write!(f, "color parse error: {e}"),
        }
    }
}

impl std::error::Error for BlurError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            Self::Draw(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::ColorParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlurError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ColorParseError> for BlurError {
    fn from(e: ColorParseError) -> Self {
        Self::ColorParse(e)
    }
}

impl From<DrawError> for BlurError {
    fn from(e: DrawError) -> Self {
        Self::Draw(e)
    }
}
