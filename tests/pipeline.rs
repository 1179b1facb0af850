use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use mudup::{Error, MemorySource, Options, TrackProfile, TrackTags, run};

const MB: u64 = 1024 * 1024;

fn profile(size_bytes: u64, kbps: u32) -> TrackProfile {
    TrackProfile {
        size_bytes,
        bitrate_bps: kbps * 1000,
        sample_rate_hz: 44_100,
    }
}

fn touch(path: &Path, contents: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

/// Two duplicate groups, one singleton and one untagged file.
fn library(root: &Path) -> MemorySource {
    let mut source = MemorySource::new()
        .with_track(
            touch(&root.join("Queen/Opera/Bohemian Rhapsody.mp3"), "opera mp3"),
            "Queen",
            "Bohemian Rhapsody",
            profile(8 * MB, 320),
        )
        .with_track(
            touch(&root.join("Queen/Hits/Bohemian Rhapsody.flac"), "hits flac"),
            "QUEEN",
            "bohemian rhapsody",
            profile(30 * MB, 900),
        )
        .with_track(
            touch(&root.join("Misc/Bohemian Rhapsody.mp3"), "misc mp3"),
            "queen",
            "Bohemian Rhapsody",
            profile(4 * MB, 128),
        )
        .with_track(
            touch(&root.join("A/Song.mp3"), "a small"),
            "Abba",
            "Song",
            profile(4 * MB, 320),
        )
        .with_track(
            touch(&root.join("B/Song.mp3"), "b large"),
            "Abba",
            "Song",
            profile(6 * MB, 128),
        )
        .with_track(
            touch(&root.join("Solo/Unique.ogg"), "unique"),
            "Someone",
            "Unique",
            profile(3 * MB, 160),
        );
    source.insert_tags(
        touch(&root.join("Loose/untitled.wav"), "no title"),
        TrackTags {
            artist: Some("Someone".to_string()),
            title: None,
        },
    );
    touch(&root.join("notes.txt"), "not audio");
    source
}

#[test]
fn resolves_every_group_and_logs_each_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);

    let summary = run(root, &source, &Options::default(), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.files_scanned, 7);
    assert_eq!(summary.incomplete_tags, 1);
    assert_eq!(summary.unreadable, 0);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.groups_resolved, 2);
    assert_eq!(summary.files_moved, 3);
    assert_eq!(summary.move_failures, 0);
    assert!(!summary.cancelled);

    // Keepers stay in place.
    assert!(root.join("Queen/Hits/Bohemian Rhapsody.flac").is_file());
    assert!(root.join("B/Song.mp3").is_file());
    assert!(root.join("Solo/Unique.ogg").is_file());
    assert!(root.join("Loose/untitled.wav").is_file());

    // Losers are quarantined by base name, colliding names numbered.
    let quarantine = root.join("duplicates");
    assert!(!root.join("A/Song.mp3").exists());
    assert_eq!(fs::read_to_string(quarantine.join("Song.mp3")).unwrap(), "a small");
    let mut rhapsodies = vec![
        fs::read_to_string(quarantine.join("Bohemian Rhapsody.mp3")).unwrap(),
        fs::read_to_string(quarantine.join("Bohemian Rhapsody (1).mp3")).unwrap(),
    ];
    rhapsodies.sort();
    assert_eq!(rhapsodies, vec!["misc mp3", "opera mp3"]);

    let log = fs::read_to_string(quarantine.join("duplicates.log")).unwrap();
    assert_eq!(log.matches("Duplicate: ").count(), 2);
    assert!(log.contains("Key: abba - song"));
    assert!(log.contains("Key: queen - bohemian rhapsody"));
    assert!(!log.contains("Unique"));
}

#[test]
fn summary_json_carries_every_group_record() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);

    let summary = run(root, &source, &Options::default(), &AtomicBool::new(false)).unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["key"]["artist"], "abba");
    assert_eq!(
        records[0]["kept"],
        root.join("B/Song.mp3").to_string_lossy().as_ref()
    );
    assert_eq!(
        records[0]["moved"][0]["from"],
        root.join("A/Song.mp3").to_string_lossy().as_ref()
    );
    assert_eq!(records[1]["key"]["title"], "bohemian rhapsody");
    assert_eq!(records[1]["moved"].as_array().unwrap().len(), 2);
    assert!(records[1]["failed"].as_array().unwrap().is_empty());
    assert_eq!(json["files_moved"], 3);
}

#[test]
fn second_run_leaves_quarantine_alone() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);
    run(root, &source, &Options::default(), &AtomicBool::new(false)).unwrap();
    let log_before = fs::read_to_string(root.join("duplicates/duplicates.log")).unwrap();

    let summary = run(root, &source, &Options::default(), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.files_scanned, 4);
    assert_eq!(summary.duplicate_groups, 0);
    let log_after = fs::read_to_string(root.join("duplicates/duplicates.log")).unwrap();
    assert_eq!(log_before, log_after);
}

#[test]
fn missing_root_is_fatal_and_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let err = run(
        &missing,
        &MemorySource::new(),
        &Options::default(),
        &AtomicBool::new(false),
    )
    .unwrap_err();

    assert!(matches!(err, Error::DirectoryInvalid { .. }));
    assert!(!missing.exists());
    assert!(!missing.join("duplicates").exists());
}

#[test]
fn file_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = touch(&dir.path().join("track.mp3"), "x");

    let err = run(
        &file,
        &MemorySource::new(),
        &Options::default(),
        &AtomicBool::new(false),
    )
    .unwrap_err();

    assert!(matches!(err, Error::DirectoryInvalid { .. }));
}

#[test]
fn no_duplicates_means_no_quarantine_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = MemorySource::new()
        .with_track(touch(&root.join("a.mp3"), "a"), "A", "One", profile(MB, 128))
        .with_track(touch(&root.join("b.mp3"), "b"), "B", "Two", profile(MB, 128));

    let summary = run(root, &source, &Options::default(), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.duplicate_groups, 0);
    assert!(!root.join("duplicates").exists());
}

#[test]
fn cancelled_run_processes_no_groups() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);

    let summary = run(root, &source, &Options::default(), &AtomicBool::new(true)).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.groups_resolved, 0);
    assert!(root.join("A/Song.mp3").is_file());
    assert!(!root.join("duplicates").exists());
}

#[test]
fn dry_run_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);
    let options = Options {
        dry_run: true,
        ..Default::default()
    };

    let summary = run(root, &source, &options, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.groups_resolved, 2);
    assert_eq!(summary.files_moved, 0);
    assert!(summary.records.is_empty());
    assert!(root.join("A/Song.mp3").is_file());
    assert!(root.join("Queen/Opera/Bohemian Rhapsody.mp3").is_file());
    assert!(!root.join("duplicates").exists());
}

#[test]
fn custom_quarantine_and_log_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = library(root);
    let options = Options {
        quarantine_name: "Duplicate Music".to_string(),
        log_name: "moves.txt".to_string(),
        dry_run: false,
    };

    run(root, &source, &options, &AtomicBool::new(false)).unwrap();

    assert!(root.join("Duplicate Music/moves.txt").is_file());
    assert!(root.join("Duplicate Music/Song.mp3").is_file());
}
