use crate::error::{Error, Result};
use crate::group::DuplicateGroup;
use crate::metadata::MetadataKey;
use crate::track::TrackHandle;
use log::{error, info};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Gives up looking for a free `name (N).ext` after this many attempts.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// A file moved out of its original location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedTrack {
    pub from: TrackHandle,
    pub to: PathBuf,
}

/// A file that stayed where it was because the move failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub track: TrackHandle,
    pub reason: String,
}

/// The outcome of resolving one duplicate group. Written once to the log, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionRecord {
    pub key: MetadataKey,
    pub kept: TrackHandle,
    pub moved: Vec<MovedTrack>,
    pub failed: Vec<FailedMove>,
}

impl ResolutionRecord {
    /// The human-readable log block for this record.
    pub fn render(&self) -> String {
        let mut block = String::new();
        let kept_name = self
            .kept
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        let _ = writeln!(block);
        let _ = writeln!(block, "Duplicate: {}", kept_name);
        let _ = writeln!(block, "Key: {}", self.key);
        let _ = writeln!(block, "Kept: {}", self.kept);
        if !self.moved.is_empty() {
            let _ = writeln!(block, "Moved:");
            for moved in &self.moved {
                let _ = writeln!(block, "  {} -> {}", moved.from, moved.to.display());
            }
        }
        if !self.failed.is_empty() {
            let _ = writeln!(block, "Not moved:");
            for failed in &self.failed {
                let _ = writeln!(block, "  {} ({})", failed.track, failed.reason);
            }
        }
        block
    }
}

/// The quarantine directory and its append-only log.
///
/// Nothing touches the filesystem until the first group is resolved. The log
/// handle sits behind a mutex so a record is always written whole.
#[derive(Debug)]
pub struct Quarantine {
    dir: PathBuf,
    log_path: PathBuf,
    log: Mutex<Option<File>>,
}

impl Quarantine {
    pub fn new(dir: impl Into<PathBuf>, log_name: impl AsRef<Path>) -> Self {
        let dir = dir.into();
        let log_path = dir.join(log_name);
        Quarantine {
            dir,
            log_path,
            log: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Creates the directory (and missing parents) if absent. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Quarantine {
            path: self.dir.clone(),
            source,
        })
    }

    /// Appends one record and syncs it to disk before returning.
    pub fn append(&self, record: &ResolutionRecord) -> Result<()> {
        let log_error = |source: io::Error| Error::Log {
            path: self.log_path.clone(),
            source,
        };

        let mut guard = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .map_err(log_error)?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            file.write_all(record.render().as_bytes())
                .and_then(|_| file.sync_data())
                .map_err(log_error)?;
        }
        Ok(())
    }

    /// Where `track` would land, ignoring collisions.
    pub fn planned_destination(&self, track: &TrackHandle) -> PathBuf {
        self.dir.join(track.file_name().unwrap_or_default())
    }
}

/// Moves every track of `group` except `keeper` into quarantine, then logs the outcome.
///
/// A failed move leaves that file in place and is reported in the record; it
/// never stops the other moves or the log append. Errors returned here come
/// from the quarantine directory or the log, not from individual files.
pub fn resolve(
    group: &DuplicateGroup,
    keeper: &TrackHandle,
    quarantine: &Quarantine,
) -> Result<ResolutionRecord> {
    quarantine.ensure()?;

    info!("  KEEPING: {}", keeper);

    let mut moved = Vec::new();
    let mut failed = Vec::new();

    for track in group.tracks().iter().filter(|t| *t != keeper) {
        match move_into(track, quarantine.dir()) {
            Ok(to) => {
                info!("  MOVED: {} -> {}", track, to.display());
                moved.push(MovedTrack {
                    from: track.clone(),
                    to,
                });
            }
            Err(e) => {
                error!("{}", e);
                failed.push(FailedMove {
                    track: track.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let record = ResolutionRecord {
        key: group.key().clone(),
        kept: keeper.clone(),
        moved,
        failed,
    };
    quarantine.append(&record)?;

    Ok(record)
}

/// Moves one file into `dir` under a free name and returns the final path.
fn move_into(track: &TrackHandle, dir: &Path) -> Result<PathBuf> {
    let from = track.path();
    let name = track.file_name().ok_or_else(|| Error::MoveFailure {
        from: from.to_path_buf(),
        to: dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;

    if !from.is_file() {
        return Err(Error::MoveFailure {
            from: from.to_path_buf(),
            to: dir.join(name),
            source: io::Error::new(io::ErrorKind::NotFound, "source file is missing"),
        });
    }

    let reservation = reserve_destination(dir, name).map_err(|source| Error::MoveFailure {
        from: from.to_path_buf(),
        to: dir.join(name),
        source,
    })?;

    match move_file(from, reservation.path()) {
        Ok(()) => Ok(reservation.path().to_path_buf()),
        Err(source) => Err(Error::MoveFailure {
            from: from.to_path_buf(),
            to: reservation.path().to_path_buf(),
            source,
        }),
    }
}

/// `stem (n).ext`, or the plain name for n = 0.
fn numbered_name(name: &OsStr, n: u32) -> OsString {
    if n == 0 {
        return name.to_os_string();
    }
    let path = Path::new(name);
    let mut numbered = path.file_stem().unwrap_or(name).to_os_string();
    numbered.push(format!(" ({})", n));
    if let Some(ext) = path.extension() {
        numbered.push(".");
        numbered.push(ext);
    }
    numbered
}

/// `.name.suffix`, a hidden sibling of `path` in the same directory.
fn hidden_sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut hidden = OsString::from(".");
    hidden.push(path.file_name().unwrap_or_default());
    hidden.push(suffix);
    path.with_file_name(hidden)
}

/// A destination name claimed in quarantine.
///
/// The claim is a hidden `.name.reserved` marker next to the free name, so an
/// interrupted move never leaves an empty file under the real name. The
/// marker is removed on drop.
#[derive(Debug)]
struct Reservation {
    path: PathBuf,
    marker: PathBuf,
}

impl Reservation {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.marker);
    }
}

/// Claims the first free name in `dir`, trying `name`, `name (1)`, ...
///
/// The marker is created with create-new semantics, so two writers never hold
/// the same name, and a name whose final file already exists is skipped.
fn reserve_destination(dir: &Path, name: &OsStr) -> io::Result<Reservation> {
    for n in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(numbered_name(name, n));
        let marker = hidden_sibling(&path, ".reserved");
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&marker)
        {
            Ok(_) => {
                let reservation = Reservation { path, marker };
                if reservation.path.symlink_metadata().is_err() {
                    return Ok(reservation);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free name left in quarantine",
    ))
}

/// Moves `from` to the free path `to`.
///
/// The file ends up either at `to` or at `from`, never half-copied.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    copy_then(from, to, |source| fs::remove_file(source))
}

/// Copies `from` into place at `to` through a hidden `.partial` file, then
/// runs `remove_source`. If that fails the copy is deleted again.
fn copy_then(
    from: &Path,
    to: &Path,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    let partial = hidden_sibling(to, ".partial");

    let copied = fs::copy(from, &partial)
        .and_then(|_| File::open(&partial)?.sync_all())
        .and_then(|_| fs::rename(&partial, to));
    if let Err(e) = copied {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    if let Err(e) = remove_source(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}
