use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Language;

/// Site list published by the citypage weather service.
pub const SITE_LIST_URL: &str = "http://dd.weatheroffice.ec.gc.ca/citypage_weather/xml/siteList.xml";

/// Prefix of every per-city document URL.
pub const BASE_URL: &str = "http://dd.weatheroffice.ec.gc.ca/citypage_weather/xml/";

/// Errors from reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine platform config directory")]
    NoConfigDir,

    #[error("Failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// site_list_url = "http://dd.weatheroffice.ec.gc.ca/citypage_weather/xml/siteList.xml"
/// base_url = "http://dd.weatheroffice.ec.gc.ca/citypage_weather/xml/"
/// timeout_secs = 30
/// language = "french"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_list_url: String,
    pub base_url: String,

    /// Request timeout; `None` waits for the server indefinitely.
    pub timeout_secs: Option<u64>,

    /// Document language the CLI asks for.
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_list_url: SITE_LIST_URL.to_string(),
            base_url: BASE_URL.to_string(),
            timeout_secs: None,
            language: Language::English,
        }
    }
}

/// Base URLs get province codes appended directly, so they must end in `/`.
pub(crate) fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn set_site_list_url(&mut self, url: impl Into<String>) {
        self.site_list_url = url.into();
    }

    /// Store the base URL, making sure it ends with a separator so that
    /// province codes can be appended directly.
    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.base_url = with_trailing_slash(url.into());
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Io { path: parent.to_path_buf(), source })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(path, toml).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("ca", "citypage", "citypage").ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
