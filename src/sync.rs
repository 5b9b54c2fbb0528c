//! Storage-location resolution and iCloud migration.
//!
//! Two candidate roots exist for the settings document: the local
//! `~/.ianai` directory and, on macOS with iCloud Drive present, an
//! `ianai` folder inside the iCloud Drive container. Exactly one is
//! active at a time:
//!
//! - the iCloud directory, if sync is supported on this host **and** a
//!   settings file already lives there;
//! - the local directory otherwise. Local is the universal fallback.
//!
//! All predicates are pure functions of the filesystem and host platform,
//! re-derived on every call; nothing is cached. Enabling or disabling sync
//! migrates the settings file between the roots. The only destructive step
//! taken without an explicit confirmation is removing the iCloud copy
//! while *disabling* sync, and that path is only reached after the user
//! confirmed disabling itself.
//!
//! Directory removal after a migration is best-effort: a directory that
//! still holds other content is left in place and that outcome is not an
//! error.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use crate::prompt::Prompt;
use crate::store::SETTINGS_FILE_NAME;

/// iCloud Drive container, relative to the home directory.
const CLOUD_DOCS_RELATIVE: &str = "Library/Mobile Documents/com~apple~CloudDocs";

/// Settings folder name inside the iCloud Drive container.
const CLOUD_APP_DIR_NAME: &str = "ianai";

/// Local settings folder name, relative to the home directory.
const LOCAL_DIR_NAME: &str = ".ianai";

/// Snapshot of the resolver predicates, for `config sync status`.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub supported: bool,
    pub enabled: bool,
    pub has_local: bool,
    pub local_path: PathBuf,
    pub cloud_path: PathBuf,
    pub active_path: PathBuf,
}

/// Resolves the active settings directory and performs migrations.
#[derive(Debug, Clone)]
pub struct SyncLocator {
    local_dir: PathBuf,
    cloud_root: PathBuf,
    cloud_settings_dir: PathBuf,
    platform_has_cloud: bool,
}

impl SyncLocator {
    /// Locator rooted at the real home directory of the current user.
    ///
    /// # Errors
    /// Fails only when the home directory cannot be determined.
    pub fn discover() -> Result<Self, Box<dyn Error>> {
        let home = dirs::home_dir().ok_or("unable to determine home directory")?;
        Ok(Self::with_home(&home, cfg!(target_os = "macos")))
    }

    /// Locator rooted at an arbitrary home directory. `platform_has_cloud`
    /// stands in for the host-platform check so tests can exercise both
    /// sides on any OS.
    pub fn with_home(home: &Path, platform_has_cloud: bool) -> Self {
        let cloud_root = home.join(CLOUD_DOCS_RELATIVE);
        Self {
            local_dir: home.join(LOCAL_DIR_NAME),
            cloud_settings_dir: cloud_root.join(CLOUD_APP_DIR_NAME),
            cloud_root,
            platform_has_cloud,
        }
    }

    /// True only on a host that offers iCloud Drive with the container
    /// actually present on disk.
    pub fn supported(&self) -> bool {
        self.platform_has_cloud && self.cloud_root.is_dir()
    }

    /// True when the iCloud settings folder already holds a settings file.
    pub fn enabled(&self) -> bool {
        self.cloud_settings_file().is_file()
    }

    /// True when the local root already holds a settings file.
    pub fn has_local(&self) -> bool {
        self.local_settings_file().is_file()
    }

    /// The single active settings directory. Cloud wins iff supported and
    /// enabled; local otherwise.
    pub fn active_dir(&self) -> PathBuf {
        if self.supported() && self.enabled() {
            self.cloud_settings_dir.clone()
        } else {
            self.local_dir.clone()
        }
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn cloud_settings_dir(&self) -> &Path {
        &self.cloud_settings_dir
    }

    fn local_settings_file(&self) -> PathBuf {
        self.local_dir.join(SETTINGS_FILE_NAME)
    }

    fn cloud_settings_file(&self) -> PathBuf {
        self.cloud_settings_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            supported: self.supported(),
            enabled: self.enabled(),
            has_local: self.has_local(),
            local_path: self.local_dir.clone(),
            cloud_path: self.cloud_settings_dir.clone(),
            active_path: self.active_dir(),
        }
    }

    /// Copy the local settings file into the iCloud folder, then offer to
    /// delete the local copy. The iCloud folder must already exist.
    fn migrate_local_to_cloud(&self, prompt: &mut dyn Prompt) -> Result<(), Box<dyn Error>> {
        let content = fs::read(self.local_settings_file())?;
        fs::write(self.cloud_settings_file(), &content)?;
        debug!("copied settings to {}", self.cloud_settings_file().display());

        let remove_local =
            prompt.confirm("Delete the local settings file to avoid conflicts?")?;
        if remove_local {
            fs::remove_file(self.local_settings_file())?;
            remove_dir_if_empty(&self.local_dir);
        }
        Ok(())
    }

    /// Copy the iCloud settings file back to the local root and delete the
    /// iCloud copy. No confirmation here: callers only reach this after
    /// the user confirmed disabling sync.
    fn migrate_cloud_to_local(&self) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.local_dir)?;
        let content = fs::read(self.cloud_settings_file())?;
        fs::write(self.local_settings_file(), &content)?;
        fs::remove_file(self.cloud_settings_file())?;
        remove_dir_if_empty(&self.cloud_settings_dir);
        debug!("moved settings back to {}", self.local_dir.display());
        Ok(())
    }

    /// Enable iCloud sync. Idempotent when already enabled; refuses with a
    /// message (and no state change) when unsupported.
    ///
    /// Returns `true` on success or no-op success, `false` when sync is
    /// unsupported on this host.
    pub fn enable_sync(&self, prompt: &mut dyn Prompt) -> Result<bool, Box<dyn Error>> {
        if !self.supported() {
            eprintln!(
                "{}",
                style("iCloud sync is only available on macOS with iCloud Drive enabled.").red()
            );
            return Ok(false);
        }
        if self.enabled() {
            println!("iCloud sync is already enabled.");
            return Ok(true);
        }

        fs::create_dir_all(&self.cloud_settings_dir)?;
        if self.has_local() {
            self.migrate_local_to_cloud(prompt)?;
        }

        println!("{} Successfully enabled iCloud sync!", style("✅").green());
        Ok(true)
    }

    /// Disable iCloud sync after confirmation, migrating settings back to
    /// the local directory.
    ///
    /// Returns `true` on success or when sync was not enabled to begin
    /// with, `false` when the user declined (no state change).
    pub fn disable_sync(&self, prompt: &mut dyn Prompt) -> Result<bool, Box<dyn Error>> {
        if !self.enabled() {
            println!("iCloud sync is not enabled.");
            return Ok(true);
        }

        let confirmed = prompt.confirm(
            "Disable iCloud sync? This will move settings back to the local directory.",
        )?;
        if !confirmed {
            return Ok(false);
        }

        self.migrate_cloud_to_local()?;
        println!(
            "{} Successfully disabled iCloud sync and migrated settings to local!",
            style("✅").green()
        );
        Ok(true)
    }

    /// Pick the directory the first-run flow should write to.
    ///
    /// Unsupported host: the local directory, unconditionally. Sync
    /// already enabled: the iCloud directory, without prompting (the
    /// earlier choice is respected). Otherwise ask once; an affirmative
    /// answer creates the iCloud folder and migrates any existing local
    /// settings into it.
    pub fn resolve_initial_dir(&self, prompt: &mut dyn Prompt) -> Result<PathBuf, Box<dyn Error>> {
        if !self.supported() {
            return Ok(self.local_dir.clone());
        }
        if self.enabled() {
            return Ok(self.cloud_settings_dir.clone());
        }

        if self.has_local() {
            println!("Detected an existing settings file in the local directory.");
        }
        let enable = prompt
            .confirm("Enable iCloud sync? This will sync your settings across all devices.")?;
        if !enable {
            return Ok(self.local_dir.clone());
        }

        fs::create_dir_all(&self.cloud_settings_dir)?;
        if self.has_local() {
            self.migrate_local_to_cloud(prompt)?;
        } else {
            println!("{} Will use iCloud sync to save settings.", style("✅").green());
        }
        Ok(self.cloud_settings_dir.clone())
    }
}

/// Best-effort directory removal with two outcomes: removed, or left in
/// place because it still holds content. Never an error either way.
fn remove_dir_if_empty(dir: &Path) -> bool {
    fs::remove_dir(dir).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use tempfile::TempDir;

    fn locator(home: &TempDir, platform_has_cloud: bool) -> SyncLocator {
        SyncLocator::with_home(home.path(), platform_has_cloud)
    }

    fn write_local(locator: &SyncLocator, content: &str) {
        fs::create_dir_all(locator.local_dir()).unwrap();
        fs::write(locator.local_dir().join(SETTINGS_FILE_NAME), content).unwrap();
    }

    fn write_cloud(locator: &SyncLocator, content: &str) {
        fs::create_dir_all(locator.cloud_settings_dir()).unwrap();
        fs::write(
            locator.cloud_settings_dir().join(SETTINGS_FILE_NAME),
            content,
        )
        .unwrap();
    }

    fn create_cloud_root(home: &TempDir) {
        fs::create_dir_all(home.path().join(CLOUD_DOCS_RELATIVE)).unwrap();
    }

    #[test]
    fn unsupported_platform_always_resolves_local() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, false);

        // Even with a settings file sitting in the cloud folder.
        create_cloud_root(&home);
        write_cloud(&locator, "{}");

        assert!(!locator.supported());
        assert!(locator.enabled());
        assert_eq!(locator.active_dir(), locator.local_dir());
    }

    #[test]
    fn missing_cloud_container_means_unsupported() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        assert!(!locator.supported());
        assert_eq!(locator.active_dir(), locator.local_dir());
    }

    #[test]
    fn cloud_takes_precedence_over_an_existing_local_file() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        write_cloud(&locator, r#"{"provider":"kimi"}"#);
        write_local(&locator, r#"{"provider":"gemini"}"#);

        assert!(locator.supported());
        assert!(locator.enabled());
        assert_eq!(locator.active_dir(), locator.cloud_settings_dir());
    }

    #[test]
    fn enable_sync_fails_without_state_change_when_unsupported() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, false);
        write_local(&locator, "{}");

        let mut prompt = ScriptedPrompt::empty();
        assert!(!locator.enable_sync(&mut prompt).unwrap());
        assert!(locator.has_local());
        assert!(!locator.enabled());
    }

    #[test]
    fn enable_sync_migrates_and_deletes_local_on_confirmation() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "provider": "kimi" }"#;
        write_local(&locator, content);

        let mut prompt = ScriptedPrompt::new(["y"]);
        assert!(locator.enable_sync(&mut prompt).unwrap());

        assert!(!locator.local_dir().join(SETTINGS_FILE_NAME).exists());
        let migrated =
            fs::read_to_string(locator.cloud_settings_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(migrated, content);
        // The emptied local directory is gone too.
        assert!(!locator.local_dir().exists());
    }

    #[test]
    fn enable_sync_keeps_both_copies_when_deletion_is_declined() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "provider": "gemini" }"#;
        write_local(&locator, content);

        let mut prompt = ScriptedPrompt::new(["n"]);
        assert!(locator.enable_sync(&mut prompt).unwrap());

        let local = fs::read(locator.local_dir().join(SETTINGS_FILE_NAME)).unwrap();
        let cloud = fs::read(locator.cloud_settings_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(local, cloud);
    }

    #[test]
    fn enable_sync_is_idempotent_and_leaves_content_untouched() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "payload": { "k": "v" } }"#;
        write_cloud(&locator, content);

        let mut prompt = ScriptedPrompt::empty();
        assert!(locator.enable_sync(&mut prompt).unwrap());
        let after =
            fs::read_to_string(locator.cloud_settings_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(after, content);
    }

    #[test]
    fn disable_sync_declined_is_a_no_op() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        write_cloud(&locator, "{}");

        let mut prompt = ScriptedPrompt::new(["n"]);
        assert!(!locator.disable_sync(&mut prompt).unwrap());
        assert!(locator.enabled());
        assert!(!locator.has_local());
    }

    #[test]
    fn disable_sync_moves_the_file_back_to_local() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "provider": "kimi" }"#;
        write_cloud(&locator, content);

        let mut prompt = ScriptedPrompt::new(["yes"]);
        assert!(locator.disable_sync(&mut prompt).unwrap());
        assert!(!locator.enabled());
        let local =
            fs::read_to_string(locator.local_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(local, content);
    }

    #[test]
    fn disable_sync_when_not_enabled_is_a_no_op_success() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        let mut prompt = ScriptedPrompt::empty();
        assert!(locator.disable_sync(&mut prompt).unwrap());
    }

    #[test]
    fn initial_dir_is_local_when_unsupported_without_prompting() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, false);
        let mut prompt = ScriptedPrompt::empty();
        assert_eq!(
            locator.resolve_initial_dir(&mut prompt).unwrap(),
            locator.local_dir()
        );
    }

    #[test]
    fn initial_dir_respects_an_earlier_sync_choice_without_prompting() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        write_cloud(&locator, "{}");

        let mut prompt = ScriptedPrompt::empty();
        assert_eq!(
            locator.resolve_initial_dir(&mut prompt).unwrap(),
            locator.cloud_settings_dir()
        );
    }

    #[test]
    fn initial_dir_declining_sync_leaves_local_untouched() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "provider": "kimi" }"#;
        write_local(&locator, content);

        let mut prompt = ScriptedPrompt::new(["n"]);
        assert_eq!(
            locator.resolve_initial_dir(&mut prompt).unwrap(),
            locator.local_dir()
        );
        let after = fs::read_to_string(locator.local_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(after, content);
        assert!(!locator.enabled());
    }

    #[test]
    fn initial_dir_accepting_sync_migrates_existing_local_settings() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        let content = r#"{ "provider": "gemini" }"#;
        write_local(&locator, content);

        // Yes to sync, yes to deleting the local copy.
        let mut prompt = ScriptedPrompt::new(["y", "y"]);
        assert_eq!(
            locator.resolve_initial_dir(&mut prompt).unwrap(),
            locator.cloud_settings_dir()
        );
        let cloud =
            fs::read_to_string(locator.cloud_settings_dir().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(cloud, content);
        assert!(!locator.has_local());
    }

    #[test]
    fn nonempty_directory_survives_best_effort_removal() {
        let home = TempDir::new().unwrap();
        let locator = locator(&home, true);
        create_cloud_root(&home);
        write_local(&locator, "{}");
        // Unrelated content sharing the local directory.
        fs::write(locator.local_dir().join("notes.txt"), "keep me").unwrap();

        let mut prompt = ScriptedPrompt::new(["y"]);
        assert!(locator.enable_sync(&mut prompt).unwrap());
        assert!(!locator.local_dir().join(SETTINGS_FILE_NAME).exists());
        assert!(locator.local_dir().join("notes.txt").exists());
    }
}
