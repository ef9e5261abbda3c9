//! JSON presets file.
//!
//! Stores the whole preset list as one versioned document (see
//! `presets_core::document`).  A missing file is an empty preset list, so the
//! first run needs no setup.  Writes go to a temporary sibling first and are
//! renamed into place, so a watcher never observes a half-written file.

use std::path::PathBuf;

use presets_core::{decode_document, encode_document, Snapshot};
use tracing::debug;

use crate::application::preset_service::{PresetRepository, RepositoryError};

/// [`PresetRepository`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPresetRepository {
    path: PathBuf,
}

impl JsonPresetRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PresetRepository for JsonPresetRepository {
    fn load(&self) -> Result<Vec<Snapshot>, RepositoryError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no presets file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        decode_document(&text).map_err(|source| RepositoryError::Document {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, presets: &[Snapshot]) -> Result<(), RepositoryError> {
        let text = encode_document(presets).map_err(|source| RepositoryError::Document {
            path: self.path.clone(),
            source,
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| RepositoryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), presets = presets.len(), "presets written");
        Ok(())
    }
}
