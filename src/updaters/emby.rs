//! Jellyfin and Emby integration
//!
//! Both servers speak the MediaBrowser API, which accepts a list of changed
//! paths and rescans the folders containing them.

use crate::config::MediaBrowserConfig;
use crate::error::Result;
use crate::updaters::{BackendKind, RefreshBackend, REQUEST_TIMEOUT};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MediaUpdate<'a> {
    path: &'a str,
    update_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MediaUpdatedPayload<'a> {
    updates: Vec<MediaUpdate<'a>>,
}

pub struct MediaBrowserUpdater {
    kind: BackendKind,
    config: MediaBrowserConfig,
    client: Client,
    initialized: bool,
}

impl MediaBrowserUpdater {
    pub fn new(kind: BackendKind, config: &MediaBrowserConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let initialized = config.enabled && !config.url.is_empty() && !config.api_key.is_empty();
        if config.enabled && !initialized {
            warn!("{} updater is enabled but url or api_key is missing", kind);
        }
        Ok(Self {
            kind,
            config: config.clone(),
            client,
            initialized,
        })
    }
}

fn payload(path: &str) -> MediaUpdatedPayload<'_> {
    MediaUpdatedPayload {
        updates: vec![MediaUpdate {
            path,
            update_type: "Modified",
        }],
    }
}

impl RefreshBackend for MediaBrowserUpdater {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn initialized(&self) -> bool {
        self.initialized
    }

    fn refresh_path(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .post(format!(
                "{}/Library/Media/Updated",
                self.config.url.trim_end_matches('/')
            ))
            .header("X-MediaBrowser-Token", &self.config.api_key)
            .json(&payload(path))
            .send()?;

        if !response.status().is_success() {
            warn!("{} returned {} for {}", self.kind, response.status(), path);
            return Ok(false);
        }

        debug!("{} notified of change at {}", self.kind, path);
        Ok(true)
    }
}
