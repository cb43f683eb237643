//! Theme preference.
//!
//! The preference lives in a small YAML key-value file (one entry per storage
//! key) and is exposed to the page through a [`ThemeContext`] that the API state
//! owns. There is no process-wide theme.

use crate::config::CoreConfig;
use crate::error::{PreferencesError, ReportResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::System => "system",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "system" => Ok(Theme::System),
            other => Err(PreferencesError::InvalidTheme(other.to_string())),
        }
    }
}

/// YAML-backed key-value preferences file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored entry. A missing file is an empty store.
    pub fn read_all(&self) -> Result<BTreeMap<String, String>, PreferencesError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(PreferencesError::FileRead(e)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&contents).map_err(PreferencesError::YamlDeserialization)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        let yaml = serde_yaml::to_string(&entries).map_err(PreferencesError::YamlSerialization)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(PreferencesError::FileWrite)?;
        }
        fs::write(&self.path, yaml).map_err(PreferencesError::FileWrite)
    }
}

/// The page's theme, initialised from the preference store.
#[derive(Debug)]
pub struct ThemeContext {
    store: PreferenceStore,
    storage_key: String,
    system_prefers_dark: bool,
    theme: RwLock<Theme>,
}

impl ThemeContext {
    /// Loads the stored theme, falling back to the configured default when the
    /// stored value is missing or not one of `dark`, `light`, `system`.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences file exists but cannot be read or parsed.
    pub fn load(cfg: &CoreConfig) -> ReportResult<Self> {
        let store = PreferenceStore::new(cfg.preferences_file());
        let storage_key = cfg.theme_storage_key().as_str().to_string();

        let theme = match store.get(&storage_key)? {
            Some(stored) => stored.parse().unwrap_or_else(|e| {
                tracing::warn!("ignoring stored theme: {}", e);
                cfg.default_theme()
            }),
            None => cfg.default_theme(),
        };

        Ok(Self {
            store,
            storage_key,
            system_prefers_dark: cfg.system_prefers_dark(),
            theme: RwLock::new(theme),
        })
    }

    pub fn theme(&self) -> Theme {
        *self.theme.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the page renders dark, resolving `system` through the host preference.
    pub fn is_dark_mode(&self) -> bool {
        match self.theme() {
            Theme::Dark => true,
            Theme::Light => false,
            Theme::System => self.system_prefers_dark,
        }
    }

    /// The concrete class applied to the document root: `dark` or `light`.
    pub fn applied_theme(&self) -> Theme {
        if self.is_dark_mode() {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Persists and applies a new theme.
    pub fn set_theme(&self, theme: Theme) -> ReportResult<()> {
        self.store.set(&self.storage_key, theme.as_str())?;
        *self.theme.write().unwrap_or_else(|e| e.into_inner()) = theme;
        tracing::info!(theme = %theme, "theme updated");
        Ok(())
    }
}
