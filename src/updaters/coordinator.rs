//! Coordinates media server refreshes for media items.
//!
//! For every item the updater works out which directory the media servers
//! should rescan, skips a rescan that would repeat the previous one, and asks
//! each initialized backend in turn. Refreshing is best-effort: failures are
//! logged and reported, never returned as errors.

use crate::config::UpdatersConfig;
use crate::media::item::{MediaItem, MediaKind};
use crate::system::paths::{combine_library_path, normalize, CanonicalPath};
use crate::updaters::BackendRegistry;
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The item has no filesystem entry yet.
    MissingPath,
    /// No rescan directory could be derived from the stored path.
    Underivable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubItemOutcome {
    Skipped {
        item: String,
        reason: SkipReason,
    },
    Refreshed {
        item: String,
        target: String,
        success: bool,
    },
    /// Same target as the previous sub-item, so no request was sent.
    Deduplicated { item: String, target: String },
}

impl SubItemOutcome {
    fn marks_updated(&self) -> bool {
        !matches!(self, SubItemOutcome::Skipped { .. })
    }
}

/// What one [`Updater::run`] pass did, one entry per expanded sub-item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub item: String,
    pub passthrough: bool,
    pub outcomes: Vec<SubItemOutcome>,
}

impl RefreshReport {
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Number of fan-outs actually sent to the backends.
    pub fn refresh_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SubItemOutcome::Refreshed { .. }))
            .count()
    }

    pub fn updated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.marks_updated()).count()
    }
}

/// Refresh coordinator over a fixed set of media server backends.
#[derive(Debug)]
pub struct Updater {
    library_path: CanonicalPath,
    backends: BackendRegistry,
    initialized: bool,
}

impl Updater {
    pub fn new(config: &UpdatersConfig, backends: BackendRegistry) -> Self {
        Self::with_library_root(normalize(config.library_path.as_str()), backends)
    }

    pub fn with_library_root(library_path: CanonicalPath, backends: BackendRegistry) -> Self {
        let initialized = backends.any_initialized();
        if !initialized {
            debug!("No updater service is initialized");
        }
        Self {
            library_path,
            backends,
            initialized,
        }
    }

    /// True when at least one backend is ready to accept refreshes.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn library_path(&self) -> &CanonicalPath {
        &self.library_path
    }

    /// Refresh every directory touched by `item` and mark processed
    /// sub-items as updated.
    pub fn run(&self, item: &mut MediaItem) -> RefreshReport {
        let label = item.log_string();
        debug!("Starting update process for {}", label);

        let mut report = RefreshReport {
            item: label.clone(),
            ..Default::default()
        };

        if !self.initialized {
            debug!("Updater service is not initialized; skipping refresh");
            report.passthrough = true;
            return report;
        }

        let mut last_target: Option<CanonicalPath> = None;

        for mut sub_item in item.refreshable_items() {
            let sub_label = sub_item.log_string();

            let Some(fs_path) = sub_item.filesystem_path() else {
                debug!("Skipping {}: no filesystem entry path present", sub_label);
                report.outcomes.push(SubItemOutcome::Skipped {
                    item: sub_label,
                    reason: SkipReason::MissingPath,
                });
                continue;
            };

            debug!("Updating {} at {}", sub_label, fs_path);

            let Some(target) = self.derive_refresh_target(fs_path, sub_item.kind()) else {
                debug!(
                    "Skipping {}: could not derive refresh path from {}",
                    sub_label, fs_path
                );
                report.outcomes.push(SubItemOutcome::Skipped {
                    item: sub_label,
                    reason: SkipReason::Underivable,
                });
                continue;
            };

            let target_str = target.as_os_string();
            let outcome = if last_target.as_ref() == Some(&target) {
                SubItemOutcome::Deduplicated {
                    item: sub_label.clone(),
                    target: target_str,
                }
            } else {
                let success = self.refresh_path(&target_str);
                last_target = Some(target);
                SubItemOutcome::Refreshed {
                    item: sub_label.clone(),
                    target: target_str,
                    success,
                }
            };
            report.outcomes.push(outcome);

            sub_item.mark_updated();
            debug!("Updated {}", sub_label);
        }

        info!("Updated {}", label);
        report
    }

    /// Directory the media servers should rescan for a stored `filesystem_path`.
    ///
    /// Returns `None` for an empty path. Climbing stops at the path's anchor,
    /// so a file directly under `/` or `C:\` refreshes that root.
    pub fn derive_refresh_target(
        &self,
        filesystem_path: &str,
        kind: MediaKind,
    ) -> Option<CanonicalPath> {
        if filesystem_path.is_empty() {
            return None;
        }

        let absolute = combine_library_path(&self.library_path, filesystem_path);
        let target = (0..kind.refresh_unit_depth()).fold(absolute, |path, _| path.parent());
        Some(target)
    }

    /// Ask every initialized backend to rescan `path`.
    ///
    /// Returns true when at least one backend accepted the request. A failing
    /// backend never stops the remaining ones.
    pub fn refresh_path(&self, path: &str) -> bool {
        let mut success = false;
        for backend in self.backends.initialized() {
            match backend.refresh_path(path) {
                Ok(true) => {
                    debug!("Refreshed path in {}: {}", backend.kind(), path);
                    success = true;
                }
                Ok(false) => {
                    debug!("{} did not refresh path {}", backend.kind(), path);
                }
                Err(e) => {
                    error!("Failed to refresh path {}: {}", path, e);
                }
            }
        }

        if !success {
            debug!("No updater service successfully refreshed path {}", path);
        }

        success
    }
}
