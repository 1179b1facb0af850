use crate::group::DuplicateGroup;
use crate::metadata::{MetadataSource, TrackProfile};
use crate::track::TrackHandle;
use log::debug;
use std::cmp::Reverse;

/// Composite ranking key; smaller ranks better.
///
/// Field order is significance order: container tier first (non-MP3 before MP3),
/// then size, bitrate and sample rate, each descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
    is_mp3: bool,
    size_bytes: Reverse<u64>,
    bitrate_bps: Reverse<u32>,
    sample_rate_hz: Reverse<u32>,
}

impl RankKey {
    pub fn new(track: &TrackHandle, profile: &TrackProfile) -> Self {
        RankKey {
            is_mp3: track.is_mp3(),
            size_bytes: Reverse(profile.size_bytes),
            bitrate_bps: Reverse(profile.bitrate_bps),
            sample_rate_hz: Reverse(profile.sample_rate_hz),
        }
    }
}

/// Orders the group best-first.
///
/// Profiles are read fresh for every call. The sort is stable, so tracks that
/// tie on every key keep their discovery order and the first one seen wins.
pub fn rank<'a, S: MetadataSource + ?Sized>(
    group: &'a DuplicateGroup,
    source: &S,
) -> Vec<&'a TrackHandle> {
    let mut ranked: Vec<(RankKey, &TrackHandle)> = group
        .tracks()
        .iter()
        .map(|track| {
            let profile = source.read_profile(track);
            debug!(
                "{}: {} bytes, {} bps, {} Hz",
                track, profile.size_bytes, profile.bitrate_bps, profile.sample_rate_hz
            );
            (RankKey::new(track, &profile), track)
        })
        .collect();

    ranked.sort_by_key(|(key, _)| *key);
    ranked.into_iter().map(|(_, track)| track).collect()
}

/// The single track to keep from a duplicate group.
pub fn pick_keeper<'a, S: MetadataSource + ?Sized>(
    group: &'a DuplicateGroup,
    source: &S,
) -> &'a TrackHandle {
    // A DuplicateGroup always holds at least two tracks.
    rank(group, source)
        .into_iter()
        .next()
        .unwrap_or(&group.tracks()[0])
}
