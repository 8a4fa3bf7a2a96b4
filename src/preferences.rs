//! Persisted reader preferences.
//!
//! The only persisted preference is the body font size. It is read once when a reader
//! is created and written after every zoom.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors writing preferences.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The preference file or its directory could not be written.
    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        /// Preference file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Preferences could not be serialized.
    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value store for reader preferences.
pub trait PreferenceStore {
    /// Stored body font size, if any.
    fn font_size(&self) -> Option<f32>;

    /// Store the body font size.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] when the value cannot be persisted.
    fn set_font_size(&self, size: f32) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size: Option<f32>,
}

/// Preferences stored as `{"font_size": N}` in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    path: PathBuf,
}

impl JsonPreferences {
    /// Store preferences at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preference file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoredPreferences {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return StoredPreferences::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read preferences");
                return StoredPreferences::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "Ignoring malformed preferences");
            StoredPreferences::default()
        })
    }
}

impl PreferenceStore for JsonPreferences {
    fn font_size(&self) -> Option<f32> {
        self.read().font_size.filter(|size| size.is_finite() && *size > 0.0)
    }

    fn set_font_size(&self, size: f32) -> Result<(), PreferenceError> {
        let mut stored = self.read();
        stored.font_size = Some(size);
        let json = serde_json::to_string_pretty(&stored)?;

        let write_err = |source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, json).map_err(write_err)?;
        debug!(path = %self.path.display(), size, "Font size saved");
        Ok(())
    }
}

/// Preferences held in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    font_size: Cell<Option<f32>>,
}

impl MemoryPreferences {
    /// Start with `font_size` stored, if any.
    pub fn new(font_size: Option<f32>) -> Self {
        Self {
            font_size: Cell::new(font_size),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn font_size(&self) -> Option<f32> {
        self.font_size.get()
    }

    fn set_font_size(&self, size: f32) -> Result<(), PreferenceError> {
        self.font_size.set(Some(size));
        Ok(())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for std::rc::Rc<T> {
    fn font_size(&self) -> Option<f32> {
        (**self).font_size()
    }

    fn set_font_size(&self, size: f32) -> Result<(), PreferenceError> {
        (**self).set_font_size(size)
    }
}

/// Default preference file: `<state_dir>/chapterflow/preferences.json`.
pub fn default_preferences_path() -> PathBuf {
    dirs::state_dir()
        .map(|dir| dir.join("chapterflow").join("preferences.json"))
        .unwrap_or_else(|| PathBuf::from("chapterflow-preferences.json"))
}
