use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning and resolving duplicates.
///
/// Only `DirectoryInvalid`, `Quarantine` and `Log` stop a run. The per-file
/// variants are recovered by the caller and reported alongside the results.
#[derive(Debug, Error)]
pub enum Error {
    /// The scan root does not exist or is not a directory
    #[error("Not a valid directory: {}", path.display())]
    DirectoryInvalid { path: PathBuf },

    /// Tags could not be read from a file
    #[error("Failed to read tags from {}: {reason}", path.display())]
    MetadataUnreadable { path: PathBuf, reason: String },

    /// A losing duplicate could not be relocated
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The quarantine directory could not be created
    #[error("Failed to create quarantine directory {}: {source}", path.display())]
    Quarantine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resolution record could not be appended to the log
    #[error("Failed to write quarantine log {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
