pub mod config;
pub mod error;
pub mod media;
pub mod system;
pub mod updaters;

pub use config::Config;
pub use media::item::{MediaItem, MediaKind};
pub use system::paths::{
    as_os_string, combine_library_path, normalize, path_is_within, paths_match, CanonicalPath,
    Flavor,
};
pub use updaters::{BackendKind, BackendRegistry, RefreshBackend, RefreshReport, Updater};
