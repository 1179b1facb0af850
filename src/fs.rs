use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::track::TrackHandle;

/// Containers recognized as audio, matched case-insensitively on the extension.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "aac", "ogg"];

pub fn is_audio_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|&known| ext.eq_ignore_ascii_case(known))
    })
}

/// Recursively collects every audio file under `root`.
///
/// Entries are visited sorted by file name so that discovery order is stable
/// between runs. The `skip` directory (the quarantine) is never descended into.
/// Unreadable entries are logged and skipped.
pub fn list_audio_files(root: &Path, skip: Option<&Path>) -> Vec<TrackHandle> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| skip.is_none_or(|skip| entry.path() != skip));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_audio_file(entry.path()) {
                    files.push(TrackHandle::from(entry.into_path()));
                }
            }
            Err(e) => debug!("Skipping unreadable entry: {}", e),
        }
    }

    files
}
