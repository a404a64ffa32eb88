//! Upload configuration

use crate::waveform::RenderOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the upload pipeline
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Storage root (holds audio/ and waveform/)
    pub storage_dir: PathBuf,

    /// Options used for every rendered waveform
    pub render: RenderOptions,
}

impl UploadConfig {
    /// Create a configuration with default render options
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            render: RenderOptions::default(),
        }
    }

    /// Set render options
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// On-disk TOML configuration
///
/// ```toml
/// storage_dir = "/var/lib/waveforms"
///
/// [render]
/// height = 500
/// line_color = "#1e90ff"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Storage root; the command line and `STORAGE_DIR` take precedence
    pub storage_dir: Option<PathBuf>,

    /// Render option overrides
    pub render: RenderOptions,
}

impl ConfigFile {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::HexColor;

    #[test]
    fn test_empty_config_is_default() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.render, RenderOptions::default());
    }

    #[test]
    fn test_render_section_overrides() {
        let config = ConfigFile::parse(
            r##"
            storage_dir = "/srv/audio"

            [render]
            width = 1200
            frames = 600
            background_color = "#fff"
            "##,
        )
        .unwrap();

        assert_eq!(config.storage_dir, Some(PathBuf::from("/srv/audio")));
        assert_eq!(config.render.width, 1200);
        assert_eq!(config.render.frames, 600);
        assert_eq!(config.render.height, 1000);
        assert_eq!(config.render.background_color, HexColor::rgba(255, 255, 255, 255));
    }

    #[test]
    fn test_bad_color_is_error() {
        assert!(ConfigFile::parse("[render]\nline_color = \"#12\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigFile::load(Path::new("/nonexistent/waveform.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
