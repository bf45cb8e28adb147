//! Media server integrations that can be asked to rescan a directory.
//!
//! Each server type implements [`RefreshBackend`]. The [`BackendRegistry`]
//! holds one instance per kind in a fixed order, and the [`Updater`] fans
//! refresh requests out across every initialized entry.

pub mod coordinator;
pub mod emby;
pub mod plex;

pub use coordinator::{RefreshReport, SkipReason, SubItemOutcome, Updater};
pub use emby::MediaBrowserUpdater;
pub use plex::PlexUpdater;

use crate::config::UpdatersConfig;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Plex,
    Jellyfin,
    Emby,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Plex => "Plex",
            BackendKind::Jellyfin => "Jellyfin",
            BackendKind::Emby => "Emby",
        };
        write!(f, "{}", s)
    }
}

/// A media server client that can rescan a single path.
pub trait RefreshBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether the backend is configured well enough to be called.
    fn initialized(&self) -> bool;

    /// Ask the server to rescan `path`.
    ///
    /// `Ok(false)` means the server did not pick the path up, for instance
    /// because no library contains it. `Err` is reserved for transport and
    /// protocol failures.
    fn refresh_path(&self, path: &str) -> Result<bool>;
}

/// Fixed, ordered set of backends, at most one per kind.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn RefreshBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Plex, Jellyfin and Emby clients built from `config`.
    pub fn from_config(config: &UpdatersConfig) -> Result<Self> {
        Ok(Self::new()
            .with(PlexUpdater::new(&config.plex)?)
            .with(MediaBrowserUpdater::new(
                BackendKind::Jellyfin,
                &config.jellyfin,
            )?)
            .with(MediaBrowserUpdater::new(BackendKind::Emby, &config.emby)?))
    }

    /// Add `backend`, replacing any earlier backend of the same kind in place.
    pub fn with(mut self, backend: impl RefreshBackend + 'static) -> Self {
        let kind = backend.kind();
        match self.backends.iter().position(|b| b.kind() == kind) {
            Some(index) => self.backends[index] = Box::new(backend),
            None => self.backends.push(Box::new(backend)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn RefreshBackend> {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn initialized(&self) -> impl Iterator<Item = &dyn RefreshBackend> {
        self.iter().filter(|b| b.initialized())
    }

    pub fn any_initialized(&self) -> bool {
        self.initialized().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|b| (b.kind(), b.initialized())))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::RescanError;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    pub enum Behavior {
        Succeed,
        Decline,
        Fail,
    }

    /// Backend double that records every path it is asked to refresh.
    pub struct RecordingBackend {
        pub kind: BackendKind,
        pub initialized: bool,
        pub behavior: Behavior,
        pub calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        pub fn new(kind: BackendKind, behavior: Behavior) -> Self {
            Self {
                kind,
                initialized: true,
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn uninitialized(kind: BackendKind) -> Self {
            Self {
                initialized: false,
                ..Self::new(kind, Behavior::Succeed)
            }
        }
    }

    impl RefreshBackend for std::sync::Arc<RecordingBackend> {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn initialized(&self) -> bool {
            self.initialized
        }

        fn refresh_path(&self, path: &str) -> Result<bool> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(path.to_string());
            }
            match self.behavior {
                Behavior::Succeed => Ok(true),
                Behavior::Decline => Ok(false),
                Behavior::Fail => Err(RescanError::backend(self.kind, "connection refused")),
            }
        }
    }

    impl RecordingBackend {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }
}
