//! Waveform image rendering
//!
//! Reduces a mono sample sequence to one loudness value per output column,
//! then draws those values as a single stroked polyline and encodes the
//! result as PNG.

mod color;
mod loudness;
mod options;
mod renderer;

pub use color::{HexColor, ParseColorError};
pub use loudness::LoudnessProfile;
pub use options::{LoudnessMetric, RenderOptions};
pub use renderer::{render, StrokePlan, WaveformImage, WaveformRenderer};
