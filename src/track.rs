use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

const MP3_EXTENSION: &str = "mp3";

/// A reference to one audio file found during the scan.
///
/// Handles are immutable for the duration of a run; everything else about the
/// file (tags, size, bitrate) is read on demand through a `MetadataSource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackHandle {
    path: PathBuf,
}

impl TrackHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TrackHandle { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base file name, used as the quarantine name of the file.
    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// True when the file uses the MP3 container (by extension, case-insensitive).
    pub fn is_mp3(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MP3_EXTENSION))
    }
}

impl From<PathBuf> for TrackHandle {
    fn from(path: PathBuf) -> Self {
        TrackHandle { path }
    }
}

impl From<&Path> for TrackHandle {
    fn from(path: &Path) -> Self {
        TrackHandle {
            path: path.to_path_buf(),
        }
    }
}

impl AsRef<Path> for TrackHandle {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
