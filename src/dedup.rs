use crate::error::{Error, Result};
use crate::fs::list_audio_files;
use crate::group::group;
use crate::metadata::MetadataSource;
use crate::relocate::{self, Quarantine, ResolutionRecord};
use crate::resolve::{pick_keeper, rank};
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_QUARANTINE_NAME: &str = "duplicates";
pub const DEFAULT_LOG_NAME: &str = "duplicates.log";

/// How a run behaves.
#[derive(Debug, Clone)]
pub struct Options {
    /// Name of the quarantine directory created under the scanned root.
    pub quarantine_name: String,
    /// Name of the log file inside the quarantine directory.
    pub log_name: String,
    /// Rank and report only; touch nothing on disk.
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            quarantine_name: DEFAULT_QUARANTINE_NAME.to_string(),
            log_name: DEFAULT_LOG_NAME.to_string(),
            dry_run: false,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub incomplete_tags: usize,
    pub unreadable: usize,
    pub duplicate_groups: usize,
    pub groups_resolved: usize,
    pub files_moved: usize,
    pub move_failures: usize,
    pub cancelled: bool,
    /// One record per resolved group, as written to the quarantine log.
    pub records: Vec<ResolutionRecord>,
}

/// Scans `root`, then keeps the best track of each duplicate group and
/// quarantines the others.
///
/// Fails before touching anything if `root` is not a directory. `cancel` is
/// checked between groups only, so a group that has started always finishes
/// its moves and its log record.
pub fn run<S: MetadataSource + ?Sized>(
    root: &Path,
    source: &S,
    options: &Options,
    cancel: &AtomicBool,
) -> Result<RunSummary> {
    if !root.is_dir() {
        return Err(Error::DirectoryInvalid {
            path: root.to_path_buf(),
        });
    }

    let quarantine = Quarantine::new(root.join(&options.quarantine_name), &options.log_name);

    let files = list_audio_files(root, Some(quarantine.dir()));
    info!("Scanned {} audio files in {}", files.len(), root.display());

    let grouping = group(&files, source);
    let mut summary = RunSummary {
        files_scanned: files.len(),
        incomplete_tags: grouping.incomplete.len(),
        unreadable: grouping.unreadable.len(),
        ..Default::default()
    };

    let duplicates = grouping.into_duplicates();
    summary.duplicate_groups = duplicates.len();
    info!("Found {} duplicate groups", duplicates.len());

    for dupes in &duplicates {
        if cancel.load(Ordering::SeqCst) {
            warn!(
                "Cancelled, {} groups left unprocessed",
                summary.duplicate_groups - summary.groups_resolved
            );
            summary.cancelled = true;
            break;
        }

        info!(
            "Found {} duplicates for: '{}' by '{}'",
            dupes.len(),
            dupes.key().title,
            dupes.key().artist
        );

        if options.dry_run {
            let ranked = rank(dupes, source);
            if let Some((keeper, losers)) = ranked.split_first() {
                info!("  [Dry Run] KEEPING: {}", keeper);
                for loser in losers {
                    info!(
                        "  [Dry Run] would move {} -> {}",
                        loser,
                        quarantine.planned_destination(loser).display()
                    );
                }
            }
            summary.groups_resolved += 1;
            continue;
        }

        let keeper = pick_keeper(dupes, source);
        let record = relocate::resolve(dupes, keeper, &quarantine)?;
        summary.groups_resolved += 1;
        summary.files_moved += record.moved.len();
        summary.move_failures += record.failed.len();
        summary.records.push(record);
    }

    Ok(summary)
}
