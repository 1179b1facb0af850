mod cli;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use log::warn;
use mudup::{Error, LoftyReader, Options};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let library_path = match cli.library_path.clone().or_else(prompt_library_path) {
        Some(path) => path,
        None => {
            eprintln!("No music library path given.");
            return ExitCode::FAILURE;
        }
    };

    // Ctrl-C stops before the next group; the current one still finishes.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let options = Options {
        quarantine_name: cli.quarantine_name.clone(),
        log_name: cli.log_name.clone(),
        dry_run: cli.dry_run,
    };

    let summary = match mudup::run(&library_path, &LoftyReader, &options, &cancel) {
        Ok(summary) => summary,
        Err(Error::DirectoryInvalid { path }) => {
            eprintln!(
                "Invalid path: {} is not a directory, please check and retry.",
                path.display()
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Audio files scanned: {}", summary.files_scanned);
        println!("Duplicate groups found: {}", summary.duplicate_groups);
        if cli.dry_run {
            println!("Dry run: {} groups ranked, nothing moved.", summary.groups_resolved);
        } else {
            println!(
                "Groups resolved: {} ({} files moved, {} failed)",
                summary.groups_resolved, summary.files_moved, summary.move_failures
            );
        }
        if summary.incomplete_tags + summary.unreadable > 0 {
            println!(
                "Skipped: {} with incomplete tags, {} unreadable",
                summary.incomplete_tags, summary.unreadable
            );
        }
        if summary.cancelled {
            println!("Cancelled before all groups were processed.");
        }
    }

    ExitCode::SUCCESS
}

fn prompt_library_path() -> Option<PathBuf> {
    print!("Music library path to scan: ");
    let _ = io::stdout().flush();
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}
