// Clap definitions in derive style

use std::path::PathBuf;

use mudup::dedup::{DEFAULT_LOG_NAME, DEFAULT_QUARANTINE_NAME};

#[derive(clap::Parser)]
#[command(name = "mudup", version, about)]
pub struct Cli {
    /// Set the level of verbosity
    /// -v for info, -vv for debug, -vvv for trace
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show what would be moved
    #[arg(short = 'n', long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Name of the quarantine directory created inside the library
    #[arg(short = 'q', long = "quarantine-name", default_value = DEFAULT_QUARANTINE_NAME)]
    pub quarantine_name: String,

    /// Name of the log file inside the quarantine directory
    #[arg(long = "log-name", default_value = DEFAULT_LOG_NAME)]
    pub log_name: String,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Music library path (asked for interactively when omitted)
    #[arg(value_name = "LIBRARY_PATH")]
    pub library_path: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
