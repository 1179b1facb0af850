use crate::metadata::{MetadataKey, MetadataSource};
use crate::track::TrackHandle;
use log::{debug, error, warn};
use rayon::prelude::*;
use std::collections::HashMap;

/// Two or more tracks sharing a `MetadataKey`, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    key: MetadataKey,
    tracks: Vec<TrackHandle>,
}

impl DuplicateGroup {
    /// Returns `None` for fewer than two tracks: a lone track is not a duplicate.
    pub fn new(key: MetadataKey, tracks: Vec<TrackHandle>) -> Option<Self> {
        (tracks.len() >= 2).then_some(DuplicateGroup { key, tracks })
    }

    pub fn key(&self) -> &MetadataKey {
        &self.key
    }

    pub fn tracks(&self) -> &[TrackHandle] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Result of partitioning a scan by metadata key.
#[derive(Debug, Default)]
pub struct Grouping {
    /// Every complete key seen, with its tracks in discovery order.
    pub buckets: HashMap<MetadataKey, Vec<TrackHandle>>,
    /// Tracks missing an artist or title.
    pub incomplete: Vec<TrackHandle>,
    /// Tracks whose tags could not be read at all.
    pub unreadable: Vec<TrackHandle>,
}

impl Grouping {
    /// Drops singleton buckets and returns the rest ordered by key.
    pub fn into_duplicates(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .buckets
            .into_iter()
            .filter_map(|(key, tracks)| DuplicateGroup::new(key, tracks))
            .collect();
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        groups
    }
}

/// Partitions `files` by normalized (artist, title).
///
/// Tags are read in parallel; insertion into the buckets follows the order of
/// `files`. Tracks without a complete key belong to no bucket.
pub fn group<S: MetadataSource + ?Sized>(files: &[TrackHandle], source: &S) -> Grouping {
    let keys: Vec<_> = files
        .par_iter()
        .map(|track| source.read_tags(track).map(|tags| tags.key()))
        .collect();

    let mut grouping = Grouping::default();

    for (track, key) in files.iter().zip(keys) {
        match key {
            Ok(Some(key)) => {
                debug!("{} -> {}", track, key);
                grouping.buckets.entry(key).or_default().push(track.clone());
            }
            Ok(None) => {
                warn!("Incomplete artist/title tags, skipping: {}", track);
                grouping.incomplete.push(track.clone());
            }
            Err(e) => {
                error!("{}", e);
                grouping.unreadable.push(track.clone());
            }
        }
    }

    grouping
}
