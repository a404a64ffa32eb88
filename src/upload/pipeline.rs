//! Upload pipeline orchestration

use super::config::UploadConfig;
use crate::decode::{decode, is_wave_buffer, DecodedAudio};
use crate::store::{file_id, FileStore};
use crate::waveform::WaveformRenderer;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::borrow::Cow;
use std::path::Path;

/// Extension assumed for non-WAV uploads without a hint
pub const DEFAULT_SOURCE_EXTENSION: &str = "mp3";

/// Extension of stored WAV audio
pub const WAVE_EXTENSION: &str = "wav";

/// One uploaded audio file
#[derive(Debug, Clone)]
pub struct Upload {
    /// Raw file content
    pub bytes: Vec<u8>,

    /// Original file extension, used as a decode hint and for storing
    /// non-WAV originals
    pub extension: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            extension: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into().to_ascii_lowercase());
        self
    }

    /// Read an upload from disk, taking the extension from the path
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let upload = Self::new(bytes);
        Ok(match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => upload.with_extension(ext),
            None => upload,
        })
    }
}

/// Outcome of storing one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    /// Content id of the WAV audio (also the waveform's id)
    pub wave_id: String,

    /// Content id of the original upload when it was not WAV
    pub source_id: Option<String>,

    /// Extension the original was stored under
    pub source_extension: Option<String>,

    /// Whether `audio/<wave_id>.wav` was newly written
    pub added_wave_audio: bool,

    /// Whether the non-WAV original was newly written
    pub added_source_audio: bool,

    /// Whether `waveform/<wave_id>.png` was newly written
    pub added_waveform: bool,

    /// Duration of the audio, rounded down to whole milliseconds
    pub duration_ms: u64,
}

/// Turns uploads into stored WAV audio plus a waveform image
pub struct UploadPipeline {
    config: UploadConfig,
    store: FileStore,
    renderer: WaveformRenderer,
}

impl UploadPipeline {
    /// Create a pipeline and initialize the storage directories
    pub fn new(config: UploadConfig) -> Result<Self> {
        let store = FileStore::new(config.storage_dir.clone());
        store.init()?;
        let renderer = WaveformRenderer::new(config.render.clone());

        Ok(Self {
            config,
            store,
            renderer,
        })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Store one upload
    ///
    /// Non-WAV uploads are kept as-is under their own content id and
    /// transcoded to WAV. The waveform is rendered before anything is
    /// written, so a file that cannot be rendered leaves the store untouched.
    pub fn store_audio(&self, upload: &Upload) -> Result<StoredAudio> {
        let (wave_bytes, decoded, source) = if is_wave_buffer(&upload.bytes) {
            let decoded =
                decode(&upload.bytes, Some(WAVE_EXTENSION)).context("Failed to decode WAV upload")?;
            (Cow::Borrowed(upload.bytes.as_slice()), decoded, None)
        } else {
            let extension = upload
                .extension
                .as_deref()
                .unwrap_or(DEFAULT_SOURCE_EXTENSION);
            let decoded = decode(&upload.bytes, Some(extension))
                .with_context(|| format!("Failed to decode {} upload", extension))?;
            let wav = decoded
                .to_wav_bytes()
                .context("Failed to transcode upload to WAV")?;
            let source_id = file_id(&upload.bytes);
            (Cow::Owned(wav), decoded, Some((source_id, extension)))
        };

        let wave_id = file_id(&wave_bytes);
        let waveform_path = self.store.waveform_path(&wave_id);

        let waveform = if waveform_path.exists() {
            None
        } else {
            Some(self.render_waveform(&decoded, &wave_id)?)
        };

        let mut added_source_audio = false;
        if let Some((source_id, extension)) = &source {
            let path = self.store.audio_path(source_id, extension);
            added_source_audio = self.store.write_if_absent(&path, &upload.bytes)?;
        }

        let added_waveform = match waveform {
            Some(png) => self.store.write_if_absent(&waveform_path, &png)?,
            None => false,
        };

        let wave_path = self.store.audio_path(&wave_id, WAVE_EXTENSION);
        let added_wave_audio = self.store.write_if_absent(&wave_path, &wave_bytes)?;

        let stored = StoredAudio {
            source_id: source.as_ref().map(|(id, _)| id.clone()),
            source_extension: source.map(|(_, ext)| ext.to_string()),
            wave_id,
            added_wave_audio,
            added_source_audio,
            added_waveform,
            duration_ms: decoded.duration_ms().floor() as u64,
        };

        log::info!(
            "Stored upload {} ({} ms): wav={}, waveform={}{}",
            short_id(&stored.wave_id),
            stored.duration_ms,
            if stored.added_wave_audio { "added" } else { "existing" },
            if stored.added_waveform { "added" } else { "existing" },
            match &stored.source_id {
                Some(id) => format!(", source={}", short_id(id)),
                None => String::new(),
            }
        );

        Ok(stored)
    }

    /// Store independent uploads in parallel; results keep input order
    pub fn store_batch(&self, uploads: &[Upload]) -> Vec<Result<StoredAudio>> {
        log::info!("Processing {} upload(s)...", uploads.len());
        uploads
            .par_iter()
            .map(|upload| self.store_audio(upload))
            .collect()
    }

    /// Stored waveform image for `id`
    pub fn waveform_image(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.store.read(&self.store.waveform_path(id))
    }

    /// Stored audio for `id` with the given extension
    pub fn audio(&self, id: &str, extension: &str) -> Result<Option<Vec<u8>>> {
        self.store.read(&self.store.audio_path(id, extension))
    }

    /// Remove every stored file for `id`
    pub fn clear(&self, id: &str) -> Result<usize> {
        self.store.clear(id)
    }

    fn render_waveform(&self, decoded: &DecodedAudio, wave_id: &str) -> Result<Vec<u8>> {
        let samples = decoded.first_channel();
        let image = self
            .renderer
            .render(samples.samples())
            .with_context(|| format!("Failed to render waveform for {}", short_id(wave_id)))?;
        Ok(image.into_bytes())
    }
}

fn short_id(id: &str) -> &str {
    &id[..12.min(id.len())]
}
