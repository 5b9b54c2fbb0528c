//! Reading and writing the settings document.
//!
//! The store owns serialization and the read/write failure policy; it owns
//! no policy about *which* directory is active. That question is delegated
//! to [`SyncLocator`] on every access, so a migration performed by another
//! command is picked up without restarting.
//!
//! Failure policy: a missing file loads as defaults without writing
//! anything; a malformed file is a typed error carrying the full list of
//! diagnostics (callers decide to halt); a write failure is logged here
//! and returned, and never terminates the process from inside the store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error};

use crate::settings::{Diagnostic, Settings};
use crate::sync::SyncLocator;

/// Name of the settings document inside its directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Failure loading the settings document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings file is invalid")]
    Invalid(Vec<Diagnostic>),
}

/// Loads and saves [`Settings`] at the active storage location.
pub struct SettingsStore {
    locator: SyncLocator,
}

impl SettingsStore {
    pub fn new(locator: SyncLocator) -> Self {
        Self { locator }
    }

    /// Store rooted at the real home directory.
    pub fn discover() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(SyncLocator::discover()?))
    }

    pub fn locator(&self) -> &SyncLocator {
        &self.locator
    }

    /// Path of the settings file at the currently active location.
    pub fn settings_path(&self) -> PathBuf {
        self.locator.active_dir().join(SETTINGS_FILE_NAME)
    }

    /// Load and validate the settings document.
    ///
    /// A missing file yields `Settings::default()` with no write. A file
    /// that cannot be read or does not validate is an error; working with
    /// corrupt settings could ship bad commands to a shell, so there is no
    /// silent recovery.
    pub fn load(&self) -> Result<Settings, StoreError> {
        let path = self.settings_path();
        if !path.is_file() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Settings::from_json(&text).map_err(StoreError::Invalid)
    }

    /// Serialize `settings` as pretty-printed JSON and overwrite the file
    /// at `dir` (or the active location), creating the directory first.
    ///
    /// # Errors
    /// Write failures are logged here and returned; the caller decides
    /// whether to abort.
    pub fn save(&self, settings: &Settings, dir: Option<&Path>) -> io::Result<()> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self.locator.active_dir(),
        };
        let result = write_document(settings, &dir);
        if let Err(err) = &result {
            error!(
                "error saving settings file at {}: {err}",
                dir.join(SETTINGS_FILE_NAME).display()
            );
        }
        result
    }
}

fn write_document(settings: &Settings, dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let text = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(dir.join(SETTINGS_FILE_NAME), text)
}
