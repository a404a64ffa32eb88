//! Render options

use super::color::HexColor;
use serde::{Deserialize, Serialize};

/// How a bucket of samples is reduced to one loudness value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoudnessMetric {
    /// Signed arithmetic mean of the bucket (the platform's historical output)
    #[default]
    Mean,
    /// Root mean square of the bucket
    Rms,
}

/// Options for a single render call
///
/// Every field has a default, so a config file or caller only needs to
/// name the fields it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Output width in pixels, and the number of loudness buckets computed
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Number of buckets drawn (clamped to `width`)
    pub frames: u32,

    /// Stroke width in pixels used for the quietest buckets
    pub max_line_width: f32,

    /// Canvas fill color
    pub background_color: HexColor,

    /// Stroke color
    pub line_color: HexColor,

    /// Bucket reduction
    pub metric: LoudnessMetric,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 8000,
            height: 1000,
            frames: 8000,
            max_line_width: 10.0,
            background_color: HexColor::TRANSPARENT,
            line_color: HexColor::BLACK,
            metric: LoudnessMetric::Mean,
        }
    }
}

impl RenderOptions {
    /// Set canvas size; also draws every computed bucket
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self.frames = width;
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_max_line_width(mut self, max_line_width: f32) -> Self {
        self.max_line_width = max_line_width;
        self
    }

    pub fn with_colors(mut self, background: HexColor, line: HexColor) -> Self {
        self.background_color = background;
        self.line_color = line;
        self
    }

    pub fn with_metric(mut self, metric: LoudnessMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Number of points actually drawn
    pub fn drawn_frames(&self) -> u32 {
        self.frames.min(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options: RenderOptions = toml::from_str(
            r##"
            height = 200
            line_color = "#ff0000"
            "##,
        )
        .unwrap();

        assert_eq!(options.height, 200);
        assert_eq!(options.line_color, HexColor::rgba(255, 0, 0, 255));
        assert_eq!(options.width, 8000);
        assert_eq!(options.frames, 8000);
        assert_eq!(options.max_line_width, 10.0);
        assert_eq!(options.background_color, HexColor::TRANSPARENT);
        assert_eq!(options.metric, LoudnessMetric::Mean);
    }

    #[test]
    fn test_invalid_color_rejected() {
        let result: Result<RenderOptions, _> = toml::from_str(r#"line_color = "black""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_metric_from_toml() {
        let options: RenderOptions = toml::from_str(r#"metric = "rms""#).unwrap();
        assert_eq!(options.metric, LoudnessMetric::Rms);
    }

    #[test]
    fn test_drawn_frames_clamped_to_width() {
        let options = RenderOptions::default().with_size(100, 50).with_frames(150);
        assert_eq!(options.drawn_frames(), 100);

        let options = options.with_frames(40);
        assert_eq!(options.drawn_frames(), 40);
    }
}
