//! Error types for decoding and rendering

use thiserror::Error;

/// Errors produced while decoding audio or rendering a waveform
#[derive(Debug, Error)]
pub enum RenderError {
    /// The audio could not be decoded, or decoded to nothing usable
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Fewer samples than loudness buckets requested
    #[error("insufficient samples: {samples} sample(s) for {buckets} bucket(s)")]
    InsufficientSamples { samples: usize, buckets: u32 },

    /// Canvas width or height is zero
    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The rendered canvas could not be encoded as PNG
    #[error("failed to encode waveform image: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
