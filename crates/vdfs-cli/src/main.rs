//! `vdfs` command-line entry point.
//!
//! Configures the process-wide virtual file system from the command line,
//! loads the requested packages and runs one subcommand against the
//! finalized index.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vdfs::{CollisionPolicy, VfsConfig, global};

#[derive(Parser)]
#[command(
    name = "vdfs",
    about = "Browse the flat virtual file system built from VDF packages",
    version,
    long_about = "Loads VDF packages and mounted directories from a game installation into one flat, case-insensitive namespace, then lists or extracts files from it."
)]
struct Cli {
    /// Game installation directory
    #[arg(long, env = "VDFS_GAME_DIR", default_value = ".", global = true)]
    game_dir: PathBuf,

    /// Directory below the game directory holding the packages [default: Data]
    #[arg(long, global = true)]
    package_dir: Option<PathBuf>,

    /// Package to load, in order (repeatable; default: every discovered package)
    #[arg(short, long = "package", global = true)]
    packages: Vec<String>,

    /// Which definition wins when packages provide the same file
    #[arg(long, value_enum, global = true)]
    policy: Option<Policy>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    /// Later packages override earlier ones
    Last,
    /// The first package providing a file keeps it
    First,
    /// The package with the newer timestamp wins
    Newest,
}

impl From<Policy> for CollisionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Last => Self::LastLoadedWins,
            Policy::First => Self::FirstLoadedWins,
            Policy::Newest => Self::NewestWins,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List packages in the package directory
    Packages,

    /// List indexed files with size and owning package
    Ls {
        /// Only files with this extension
        #[arg(long)]
        ext: Option<String>,
    },

    /// Write a file's bytes to stdout or a file
    Cat {
        /// File name (case-insensitive, directories ignored)
        file: String,

        /// Output path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show a package header and catalog summary
    Info {
        /// Package name
        package: String,
    },
}

impl Cli {
    fn vfs_config(&self) -> Result<VfsConfig> {
        let mut config = match &self.config {
            Some(path) => VfsConfig::from_json_file(path)?,
            None => VfsConfig::default().with_package_subdirectory("Data"),
        };
        if let Some(dir) = &self.package_dir {
            config = config.with_package_subdirectory(dir);
        }
        if let Some(policy) = self.policy {
            config = config.with_collision_policy(policy.into());
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let _vfs = global::ShutdownGuard::init(cli.vfs_config()?)?;
    {
        let mut vfs = global::write()?;
        vfs.set_path_to_engine_executable(std::env::args_os().next().unwrap_or_default());
        vfs.set_game_directory(&cli.game_dir)
            .with_context(|| format!("invalid game directory {}", cli.game_dir.display()))?;
    }

    match cli.command {
        Commands::Packages => commands::packages(&cli.packages),
        Commands::Ls { ext } => commands::ls(&cli.packages, ext.as_deref()),
        Commands::Cat { file, output } => commands::cat(&cli.packages, &file, output.as_deref()),
        Commands::Info { package } => commands::info(&package),
    }
}
