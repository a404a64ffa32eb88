//! Content-addressed local file store
//!
//! Layout under the storage root:
//! - `audio/<id>.<ext>` for audio files
//! - `waveform/<id>.png` for rendered waveforms
//!
//! Ids are hex SHA-512 digests of the file content, so writing the same
//! content twice is a no-op.

use anyhow::{Context, Result};
use sha2::{Digest, Sha512};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Extension of stored waveform images
pub const WAVEFORM_EXTENSION: &str = "png";

/// Content id of a file: lowercase hex SHA-512 (128 characters)
pub fn file_id(bytes: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Manages the storage directory layout
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Storage root
    root: PathBuf,

    /// audio/ directory
    audio_dir: PathBuf,

    /// waveform/ directory
    waveform_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`; call [`FileStore::init`] before writing
    pub fn new(root: PathBuf) -> Self {
        let audio_dir = root.join("audio");
        let waveform_dir = root.join("waveform");

        Self {
            root,
            audio_dir,
            waveform_dir,
        }
    }

    /// Create the directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.audio_dir).with_context(|| {
            format!("Failed to create audio directory: {}", self.audio_dir.display())
        })?;

        fs::create_dir_all(&self.waveform_dir).with_context(|| {
            format!(
                "Failed to create waveform directory: {}",
                self.waveform_dir.display()
            )
        })?;

        log::debug!("Storage directory structure ready at {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of an audio file, e.g. `<id>.wav`
    pub fn audio_file_name(id: &str, extension: &str) -> String {
        format!("{}.{}", id, extension)
    }

    /// File name of a waveform image, e.g. `<id>.png`
    pub fn waveform_file_name(id: &str) -> String {
        format!("{}.{}", id, WAVEFORM_EXTENSION)
    }

    pub fn audio_path(&self, id: &str, extension: &str) -> PathBuf {
        self.audio_dir.join(Self::audio_file_name(id, extension))
    }

    pub fn waveform_path(&self, id: &str) -> PathBuf {
        self.waveform_dir.join(Self::waveform_file_name(id))
    }

    /// Write `bytes` to `path` unless the file already exists
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is linked into place only when complete, so `path` never holds a
    /// partial file. Returns true when the file was written.
    pub fn write_if_absent(&self, path: &Path, bytes: &[u8]) -> Result<bool> {
        if path.exists() {
            log::debug!("Already stored: {:?}", path);
            return Ok(false);
        }

        let dir = path
            .parent()
            .with_context(|| format!("No parent directory for {}", path.display()))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        match tmp.persist_noclobber(path) {
            Ok(_) => {
                log::debug!("Stored {} bytes at {:?}", bytes.len(), path);
                Ok(true)
            }
            // Another writer stored the same content first
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                log::debug!("Already stored: {:?}", path);
                Ok(false)
            }
            Err(e) => Err(e.error).with_context(|| format!("Failed to store {}", path.display())),
        }
    }

    /// Read a stored file, or `None` when it does not exist
    pub fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Remove the waveform and every audio file stored under `id`
    ///
    /// Returns the number of files removed.
    pub fn clear(&self, id: &str) -> Result<usize> {
        let mut removed = 0;

        if remove_if_present(&self.waveform_path(id))? {
            removed += 1;
        }

        let entries = match fs::read_dir(&self.audio_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(removed),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to list audio directory: {}", self.audio_dir.display())
                })
            }
        };

        for entry in entries {
            let path = entry?.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(id) && remove_if_present(&path)? {
                removed += 1;
            }
        }

        log::debug!("Cleared {} file(s) for {}", removed, id);
        Ok(removed)
    }
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
