//! Waveform rendering for audio uploads
//!
//! Renders PNG waveform images from decoded PCM audio, and stores uploaded
//! audio together with its waveform in a content-addressed file store.

pub mod decode;
pub mod error;
pub mod store;
pub mod upload;
pub mod waveform;

pub use error::RenderError;
pub use upload::{UploadConfig, UploadPipeline};
pub use waveform::{render, RenderOptions, WaveformImage, WaveformRenderer};
