use crate::error::{Error, Result};
use crate::track::TrackHandle;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Descriptive tags read from a file. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl TrackTags {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        TrackTags {
            artist: Some(artist.into()),
            title: Some(title.into()),
        }
    }

    /// The grouping key, or `None` when artist or title is absent or empty.
    pub fn key(&self) -> Option<MetadataKey> {
        MetadataKey::new(self.artist.as_deref()?, self.title.as_deref()?)
    }
}

/// Normalized (artist, title) pair. Two tracks are duplicates iff their keys are equal.
///
/// Normalization is lowercasing only: whitespace and punctuation are kept as-is,
/// so "AC/DC" and "AC DC" stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetadataKey {
    pub artist: String,
    pub title: String,
}

impl MetadataKey {
    pub fn new(artist: &str, title: &str) -> Option<Self> {
        if artist.is_empty() || title.is_empty() {
            return None;
        }
        Some(MetadataKey {
            artist: artist.to_lowercase(),
            title: title.to_lowercase(),
        })
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Technical properties used only to rank duplicates.
///
/// Unreadable bitrate or sample rate is stored as 0, which ranks lowest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackProfile {
    pub size_bytes: u64,
    pub bitrate_bps: u32,
    pub sample_rate_hz: u32,
}

impl TrackProfile {
    /// Profile for a file whose audio properties could not be read.
    pub fn size_only(size_bytes: u64) -> Self {
        TrackProfile {
            size_bytes,
            ..Default::default()
        }
    }
}

/// Reads tags and technical properties for a track.
///
/// `read_profile` never fails: anything it cannot determine degrades to 0.
pub trait MetadataSource: Sync {
    fn read_tags(&self, track: &TrackHandle) -> Result<TrackTags>;

    fn read_profile(&self, track: &TrackHandle) -> TrackProfile;
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Reads metadata from the files on disk with lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyReader;

impl MetadataSource for LoftyReader {
    fn read_tags(&self, track: &TrackHandle) -> Result<TrackTags> {
        let tagged_file =
            lofty::read_from_path(track.path()).map_err(|e| Error::MetadataUnreadable {
                path: track.path().to_path_buf(),
                reason: e.to_string(),
            })?;

        let tag = lofty::file::TaggedFileExt::primary_tag(&tagged_file)
            .or_else(|| lofty::file::TaggedFileExt::first_tag(&tagged_file));

        Ok(match tag {
            Some(tag) => TrackTags {
                artist: lofty::tag::Accessor::artist(tag).map(|s| s.to_string()),
                title: lofty::tag::Accessor::title(tag).map(|s| s.to_string()),
            },
            None => TrackTags::default(),
        })
    }

    fn read_profile(&self, track: &TrackHandle) -> TrackProfile {
        let size_bytes = file_size(track.path());

        match lofty::read_from_path(track.path()) {
            Ok(tagged_file) => {
                use lofty::file::AudioFile;
                let properties = tagged_file.properties();
                TrackProfile {
                    size_bytes,
                    // lofty reports kbps
                    bitrate_bps: properties
                        .audio_bitrate()
                        .map_or(0, |kbps| kbps.saturating_mul(1000)),
                    sample_rate_hz: properties.sample_rate().unwrap_or(0),
                }
            }
            Err(e) => {
                debug!("Falling back to size-only profile for {}: {}", track, e);
                TrackProfile::size_only(size_bytes)
            }
        }
    }
}

/// Metadata held in memory.
///
/// Mainly a test fixture: it lets the whole pipeline run over a tree of
/// placeholder files with no real audio. It also suits callers that already
/// know their tracks' tags from elsewhere (a database, a previous scan).
///
/// Files with no registered tags are reported as unreadable. Files with no
/// registered profile fall back to their size on disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tags: HashMap<PathBuf, TrackTags>,
    profiles: HashMap<PathBuf, TrackProfile>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tags(&mut self, path: impl Into<PathBuf>, tags: TrackTags) {
        self.tags.insert(path.into(), tags);
    }

    pub fn insert_profile(&mut self, path: impl Into<PathBuf>, profile: TrackProfile) {
        self.profiles.insert(path.into(), profile);
    }

    /// Registers a fully tagged track with its profile.
    pub fn with_track(
        mut self,
        path: impl Into<PathBuf>,
        artist: &str,
        title: &str,
        profile: TrackProfile,
    ) -> Self {
        let path = path.into();
        self.insert_tags(path.clone(), TrackTags::new(artist, title));
        self.insert_profile(path, profile);
        self
    }
}

impl MetadataSource for MemorySource {
    fn read_tags(&self, track: &TrackHandle) -> Result<TrackTags> {
        self.tags
            .get(track.path())
            .cloned()
            .ok_or_else(|| Error::MetadataUnreadable {
                path: track.path().to_path_buf(),
                reason: "no tags registered".to_string(),
            })
    }

    fn read_profile(&self, track: &TrackHandle) -> TrackProfile {
        self.profiles
            .get(track.path())
            .copied()
            .unwrap_or_else(|| TrackProfile::size_only(file_size(track.path())))
    }
}
