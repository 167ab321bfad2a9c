//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Input Replay - record keyboard and mouse input and play it back
#[derive(Parser, Debug)]
#[command(name = "input-replay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record keyboard and mouse input until the stop hotkey
    Record {
        /// Output file name (".json" is added if missing)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory to save into (defaults to the configured recordings dir)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Stop automatically after this many seconds (0 = until stopped)
        #[arg(short, long, default_value = "0")]
        duration: u64,
    },

    /// Replay a recording
    Replay {
        /// Recording file (defaults to the most recent recording)
        path: Option<PathBuf>,

        /// Speed multiplier, clamped to 0.1..=10
        #[arg(short, long)]
        speed: Option<f64>,

        /// Number of repetitions
        #[arg(short, long)]
        repeat: Option<u32>,

        /// Seconds to wait before starting
        #[arg(long)]
        countdown: Option<u32>,

        /// Log actions instead of injecting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a recording's summary
    Info {
        /// Recording file
        path: PathBuf,
    },

    /// List recordings, newest first
    List {
        /// Directory to list (defaults to the configured recordings dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Path for a new recording in `dir`.
    ///
    /// Without a name the file is timestamped; a bare name gets `.json`.
    pub fn output_path(dir: &Path, name: Option<&str>) -> PathBuf {
        match name {
            Some(name) if Path::new(name).extension().is_some() => dir.join(name),
            Some(name) => dir.join(format!("{name}.json")),
            None => dir.join(crate::timeline::default_file_name()),
        }
    }
}
