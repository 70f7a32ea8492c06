//! Persistence of the most recently built deck.
//!
//! The store holds a single file. `save` replaces it atomically: the bytes
//! go to a temp file in the same directory, which is then renamed over the
//! target, so a reader never sees a half-written package.

use crate::error::PptGenError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where `pptgen` keeps its deck unless told otherwise.
pub const DEFAULT_DOCUMENT_PATH: &str = "static/generated_ppt.pptx";

#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(DEFAULT_DOCUMENT_PATH)
    }
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the stored deck with `bytes`.
    pub fn save(&self, bytes: &[u8]) -> Result<&Path, PptGenError> {
        let write_err = |source: std::io::Error| PptGenError::OutputWriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        info!("Saved {} bytes to {}", bytes.len(), self.path.display());
        Ok(&self.path)
    }

    /// Read the stored deck.
    ///
    /// # Errors
    /// [`PptGenError::DocumentNotFound`] when nothing has been saved yet.
    pub fn open(&self) -> Result<Vec<u8>, PptGenError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PptGenError::DocumentNotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => Err(PptGenError::ReadFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
