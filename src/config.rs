use crate::error::RescanError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub updaters: UpdatersConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdatersConfig {
    /// Root the media servers see the library under.
    #[serde(default = "default_library_path")]
    pub library_path: String,
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub jellyfin: MediaBrowserConfig,
    #[serde(default)]
    pub emby: MediaBrowserConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PlexConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
}

/// Jellyfin and Emby share the MediaBrowser API and its settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MediaBrowserConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for UpdatersConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            plex: PlexConfig::default(),
            jellyfin: MediaBrowserConfig::default(),
            emby: MediaBrowserConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), RescanError> {
        let updaters = &self.updaters;
        if updaters.library_path.trim().is_empty() {
            return Err(RescanError::Config("updaters.library_path is empty".into()));
        }
        if updaters.plex.enabled {
            require("updaters.plex.url", &updaters.plex.url)?;
            require("updaters.plex.token", &updaters.plex.token)?;
        }
        for (name, server) in [("jellyfin", &updaters.jellyfin), ("emby", &updaters.emby)] {
            if server.enabled {
                require(&format!("updaters.{}.url", name), &server.url)?;
                require(&format!("updaters.{}.api_key", name), &server.api_key)?;
            }
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> std::result::Result<(), RescanError> {
    if value.trim().is_empty() {
        return Err(RescanError::Config(format!("{} must be set when enabled", key)));
    }
    Ok(())
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory; using the working directory");
        PathBuf::from(".")
    })
}

/// Default mount directory for the VFS on this platform.
pub fn default_mount_root() -> PathBuf {
    if cfg!(windows) {
        home_dir().join("Documents").join("Riven").join("mount")
    } else {
        home_dir().join("riven").join("mount")
    }
}

pub fn default_cache_root() -> PathBuf {
    if cfg!(windows) {
        dirs::data_local_dir()
            .unwrap_or_else(|| home_dir().join("AppData").join("Local"))
            .join("Riven")
            .join("cache")
    } else {
        PathBuf::from("/dev/shm/riven-cache")
    }
}

pub fn default_library_root() -> PathBuf {
    if cfg!(windows) {
        home_dir().join("Videos").join("RivenLibrary")
    } else {
        PathBuf::from("/path/to/library/mount")
    }
}

fn default_library_path() -> String {
    default_library_root().to_string_lossy().into_owned()
}
