use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rescan::config::{self, Config};
use rescan::{BackendRegistry, MediaItem, MediaKind, Updater};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the directory containing a stored filesystem path
    Path {
        path: String,
        #[arg(short, long, value_enum, default_value_t = Kind::Movie)]
        kind: Kind,
    },
    /// Refresh every directory touched by a media item read from JSON
    Item { file: PathBuf },
    /// Print the directory that would be refreshed, without contacting servers
    Target {
        path: String,
        #[arg(short, long, value_enum, default_value_t = Kind::Movie)]
        kind: Kind,
    },
    /// Print the platform default library, mount and cache roots
    Defaults,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Movie,
    Show,
    Season,
    Episode,
}

impl From<Kind> for MediaKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Movie => MediaKind::Movie,
            Kind::Show => MediaKind::Show,
            Kind::Season => MediaKind::Season,
            Kind::Episode => MediaKind::Episode,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Command::Defaults = args.command {
        println!("library: {}", config::default_library_root().display());
        println!("mount:   {}", config::default_mount_root().display());
        println!("cache:   {}", config::default_cache_root().display());
        return Ok(());
    }

    let config = Config::load(&args.config).unwrap_or_else(|e| {
        warn!("Failed to load {}: {}. Using defaults.", args.config.display(), e);
        Config::default()
    });

    let backends = BackendRegistry::from_config(&config.updaters)?;
    let updater = Updater::new(&config.updaters, backends);
    info!("Library root: {}", updater.library_path());

    match args.command {
        Command::Path { path, kind } => {
            let Some(target) = updater.derive_refresh_target(&path, kind.into()) else {
                anyhow::bail!("could not derive a refresh directory from {}", path);
            };
            if !updater.is_initialized() {
                warn!("No media server is configured; nothing to refresh");
                return Ok(());
            }
            let target = target.as_os_string();
            if updater.refresh_path(&target) {
                info!("Refreshed {}", target);
            } else {
                warn!("No media server refreshed {}", target);
            }
        }
        Command::Item { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut item: MediaItem = serde_json::from_str(&content)
                .with_context(|| format!("parsing media item from {}", file.display()))?;
            let report = updater.run(&mut item);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Target { path, kind } => match updater.derive_refresh_target(&path, kind.into()) {
            Some(target) => println!("{}", target),
            None => anyhow::bail!("could not derive a refresh directory from {}", path),
        },
        Command::Defaults => {}
    }

    Ok(())
}
