//! Upload processing: decode, render and store audio uploads

pub mod config;
pub mod pipeline;

pub use config::{ConfigFile, UploadConfig};
pub use pipeline::{StoredAudio, Upload, UploadPipeline};
