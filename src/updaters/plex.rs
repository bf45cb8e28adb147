//! Plex integration
//!
//! Plex rescans per library section, so the section whose location contains
//! the path is looked up first and then asked to refresh just that path.

use crate::config::PlexConfig;
use crate::error::{RescanError, Result};
use crate::system::paths::path_is_within;
use crate::updaters::{BackendKind, RefreshBackend, REQUEST_TIMEOUT};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    #[serde(rename = "MediaContainer")]
    media_container: SectionsContainer,
}

#[derive(Debug, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<Section>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Section {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "Location", default)]
    pub locations: Vec<SectionLocation>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SectionLocation {
    pub path: String,
}

impl Section {
    fn contains(&self, path: &str) -> bool {
        path_is_within(path, self.locations.iter().map(|l| l.path.as_str()))
    }
}

pub struct PlexUpdater {
    config: PlexConfig,
    client: Client,
    initialized: bool,
}

impl PlexUpdater {
    pub fn new(config: &PlexConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let initialized = config.enabled && !config.url.is_empty() && !config.token.is_empty();
        if config.enabled && !initialized {
            warn!("Plex updater is enabled but url or token is missing");
        }
        Ok(Self {
            config: config.clone(),
            client,
            initialized,
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn sections(&self) -> Result<Vec<Section>> {
        let response = self
            .client
            .get(format!("{}/library/sections", self.base_url()))
            .header("Accept", "application/json")
            .header("X-Plex-Token", &self.config.token)
            .send()?;

        if !response.status().is_success() {
            return Err(RescanError::backend(
                BackendKind::Plex,
                format!("listing sections returned {}", response.status()),
            ));
        }

        let body: SectionsResponse = response.json()?;
        Ok(body.media_container.directories)
    }

    fn refresh_section(&self, section: &Section, path: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!(
                "{}/library/sections/{}/refresh",
                self.base_url(),
                section.key
            ))
            .query(&[("path", path)])
            .header("X-Plex-Token", &self.config.token)
            .send()?;

        if !response.status().is_success() {
            warn!(
                "Plex section {} refresh returned {}",
                section.title,
                response.status()
            );
            return Ok(false);
        }

        debug!("Plex section {} refreshing {}", section.title, path);
        Ok(true)
    }
}

/// Sections whose locations contain `path`.
pub fn matching_sections<'a>(sections: &'a [Section], path: &str) -> Vec<&'a Section> {
    sections.iter().filter(|s| s.contains(path)).collect()
}

impl RefreshBackend for PlexUpdater {
    fn kind(&self) -> BackendKind {
        BackendKind::Plex
    }

    fn initialized(&self) -> bool {
        self.initialized
    }

    fn refresh_path(&self, path: &str) -> Result<bool> {
        let sections = self.sections()?;
        let matching = matching_sections(&sections, path);
        if matching.is_empty() {
            debug!("No Plex section contains {}", path);
            return Ok(false);
        }

        refresh_each(&matching, |section| self.refresh_section(section, path))
    }
}

/// Refresh every section, carrying on past failures. Errors only when every
/// section failed.
fn refresh_each<F>(sections: &[&Section], mut refresh: F) -> Result<bool>
where
    F: FnMut(&Section) -> Result<bool>,
{
    let mut refreshed = false;
    let mut last_error = None;
    let mut failures = 0;
    for section in sections {
        match refresh(*section) {
            Ok(done) => refreshed |= done,
            Err(e) => {
                warn!("Plex section {} refresh failed: {}", section.title, e);
                failures += 1;
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if failures == sections.len() => Err(e),
        _ => Ok(refreshed),
    }
}
