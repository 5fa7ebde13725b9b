//! Back-office preferences persisted as a single `appSettings` JSON blob.

pub mod router;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use router::settings_router;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub notifications: NotificationSettings,
    pub security: SecuritySettings,
    pub appearance: AppearanceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralSettings {
    pub app_name: String,
    pub language: String,
    pub timezone: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            app_name: "BackOffice Déclaration".to_string(),
            language: "fr".to_string(),
            timezone: "Indian/Antananarivo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecuritySettings {
    pub two_factor_auth: bool,
    /// Minutes of inactivity before the session ends.
    pub session_timeout: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            two_factor_auth: false,
            session_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl Theme {
    /// Whether the dark palette applies, given the platform preference.
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => system_prefers_dark,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub font_size: FontSize,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings storage failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value slot holding the raw settings blob.
pub trait SettingsStore: Send + Sync {
    /// Stored blob, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<String>, SettingsError>;
    fn save(&self, blob: &str) -> Result<(), SettingsError>;
}

/// Settings blob kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Option<String>, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, blob)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blob: Mutex<Option<String>>,
}

impl MemorySettingsStore {
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<String>, SettingsError> {
        Ok(self.blob())
    }

    fn save(&self, blob: &str) -> Result<(), SettingsError> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob.to_string());
        Ok(())
    }
}

/// Editable copy of the settings. Edits stay local until [`SettingsScreen::save`].
pub struct SettingsScreen<S: ?Sized> {
    store: Arc<S>,
    settings: AppSettings,
    persisted: AppSettings,
}

impl<S> SettingsScreen<S>
where
    S: SettingsStore + ?Sized,
{
    /// Load the stored settings. Unreadable or malformed blobs fall back to defaults.
    pub fn open(store: Arc<S>) -> Self {
        let settings = match store.load() {
            Ok(Some(blob)) => match serde_json::from_str::<AppSettings>(&blob) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(error = %err, "stored settings are malformed, using defaults");
                    AppSettings::default()
                }
            },
            Ok(None) => AppSettings::default(),
            Err(err) => {
                warn!(error = %err, "failed to read stored settings, using defaults");
                AppSettings::default()
            }
        };

        Self {
            store,
            persisted: settings.clone(),
            settings,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut AppSettings {
        &mut self.settings
    }

    /// Whether there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.settings != self.persisted
    }

    pub fn save(&mut self) -> Result<(), SettingsError> {
        let blob = serde_json::to_string(&self.settings)?;
        self.store.save(&blob)?;
        self.persisted = self.settings.clone();
        info!("settings saved");
        Ok(())
    }

    /// Restore the defaults locally; nothing is written until the next save.
    pub fn reset(&mut self) {
        self.settings = AppSettings::default();
    }
}
