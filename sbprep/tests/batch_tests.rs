//! Batch Placement Tests
//! Test File: batch_tests.rs
//!
//! End-to-end runs of the batch runner against temporary board folders,
//! with real WAV fixtures and a stand-in converter.

mod helpers;

use std::fs;
use std::path::{Path, PathBuf};

use helpers::{generate_test_wav, AudioConfig, FakeConverter, UnstrippableTags};
use sbprep::decision::{FixedPolicy, Resolution};
use sbprep::error::PrepError;
use sbprep::models::{BatchReport, PendingAsset, PlacedEntry};
use sbprep::services::{BatchRunner, BatchSettings, LoftyProbe};
use sbprep_common::config::TomlConfig;
use sbprep_common::ranges::{RangeEntry, RangeSelection};
use sbprep_common::{RangeTable, SoundCategory, Variant};
use tempfile::TempDir;

const KICKOUT_PRIMARY: RangeSelection = RangeSelection::Category {
    category: SoundCategory::Kickout,
    variant: Variant::Primary,
};

struct Fixture {
    sources: TempDir,
    target: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            sources: TempDir::new().unwrap(),
            target: TempDir::new().unwrap(),
        }
    }

    /// Board-conformant WAV source
    fn wav(&self, name: &str) -> PathBuf {
        generate_test_wav(&self.sources.path().join(name), &AudioConfig::board()).unwrap()
    }

    fn wav_with(&self, name: &str, config: &AudioConfig) -> PathBuf {
        generate_test_wav(&self.sources.path().join(name), config).unwrap()
    }

    /// Source that only the converter can handle
    fn mp3(&self, name: &str) -> PathBuf {
        let path = self.sources.path().join(name);
        fs::write(&path, b"ID3\x03\x00\x00\x00\x00\x00\x00not really mpeg").unwrap();
        path
    }

    /// Pre-existing entry in the board folder
    fn occupy(&self, file_name: &str) -> PathBuf {
        let path = self.target.path().join(file_name);
        fs::write(&path, b"existing").unwrap();
        path
    }

    fn settings(&self) -> BatchSettings {
        BatchSettings::from_config(&TomlConfig::default(), self.target.path().to_path_buf())
    }

    fn runner<'a>(
        &self,
        converter: &'a FakeConverter,
    ) -> BatchRunner<LoftyProbe, &'a FakeConverter> {
        BatchRunner::new(self.settings(), LoftyProbe::new(), converter)
    }

    fn target_names(&self) -> Vec<String> {
        target_names(self.target.path())
    }
}

fn target_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn prefixes(report: &BatchReport) -> Vec<u16> {
    report.placed.iter().map(|p| p.prefix).collect()
}

fn run(
    fixture: &Fixture,
    converter: &FakeConverter,
    sources: &[PathBuf],
    resolution: Resolution,
) -> BatchReport {
    fixture
        .runner(converter)
        .run(
            sources,
            &KICKOUT_PRIMARY,
            &RangeTable::canonical(),
            &mut FixedPolicy(resolution),
        )
        .unwrap()
}

// =============================================================================
// Allocation scenarios
// =============================================================================

/// Empty interval, three distinct names: consecutive prefixes from the low bound
#[test]
fn test_empty_interval_assigns_in_order() {
    // Given: Empty board folder and three conformant sources
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let sources = vec![
        fixture.wav("kick1.wav"),
        fixture.wav("kick2.wav"),
        fixture.wav("kick3.wav"),
    ];

    // When: Placing into Kickout/Primary
    let report = run(&fixture, &converter, &sources, Resolution::Skip);

    // Then: 21, 22, 23 in order, copied without conversion
    assert_eq!(prefixes(&report), vec![21, 22, 23]);
    assert_eq!(
        fixture.target_names(),
        vec!["021_kick1.wav", "022_kick2.wav", "023_kick3.wav"]
    );
    assert!(report.placed.iter().all(|p| !p.converted));
    assert!(converter.calls().is_empty());
    assert!(report.is_complete());
    assert!(report.finished_at.is_some());
}

/// Existing base name surfaces a conflict before any assignment
#[test]
fn test_existing_base_name_reports_conflict() {
    // Given: 025_bell.wav already placed
    let fixture = Fixture::new();
    fixture.occupy("025_bell.wav");
    let converter = FakeConverter::conformant();
    let sources = vec![fixture.wav("bell.wav")];

    // When: Placing bell.wav with a resolver that records what it was shown
    let mut shown = Vec::new();
    let mut resolver = |asset: &PendingAsset, existing: &[PlacedEntry]| {
        let prefixes: Vec<u16> = existing.iter().map(|e| e.prefix).collect();
        shown.push((asset.base_name.clone(), prefixes));
        Resolution::Skip
    };
    let report = fixture
        .runner(&converter)
        .run(&sources, &KICKOUT_PRIMARY, &RangeTable::canonical(), &mut resolver)
        .unwrap();

    // Then: Conflict against prefix 25, nothing placed
    assert_eq!(shown, vec![("bell.wav".to_string(), vec![25])]);
    assert!(report.placed.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].existing_prefixes, vec![25]);
    assert_eq!(fixture.target_names(), vec!["025_bell.wav"]);
}

/// A single gap inside an occupied interval is filled
#[test]
fn test_gap_is_filled() {
    // Given: 21..=29 occupied except 26
    let fixture = Fixture::new();
    for prefix in (21..=29).filter(|p| *p != 26) {
        fixture.occupy(&format!("{:03}_slot{}.wav", prefix, prefix));
    }
    let converter = FakeConverter::conformant();

    // When: Placing one asset
    let report = run(&fixture, &converter, &[fixture.wav("new.wav")], Resolution::Skip);

    // Then: Prefix 26
    assert_eq!(prefixes(&report), vec![26]);
    assert!(fixture.target.path().join("026_new.wav").exists());
}

/// Fully occupied interval: Exhausted and no files written
#[test]
fn test_full_interval_is_exhausted_without_writes() {
    // Given: 21..=29 all occupied
    let fixture = Fixture::new();
    for prefix in 21..=29 {
        fixture.occupy(&format!("{:03}_slot{}.wav", prefix, prefix));
    }
    let before = fixture.target_names();
    let converter = FakeConverter::conformant();
    let sources = vec![fixture.wav("one.wav"), fixture.wav("two.wav")];

    // When: Placing two assets
    let report = run(&fixture, &converter, &sources, Resolution::Skip);

    // Then: Exhausted, both unplaced, folder and sources untouched
    assert!(report.exhausted);
    assert!(report.placed.is_empty());
    assert_eq!(report.unplaced, sources);
    assert_eq!(fixture.target_names(), before);
    assert!(sources.iter().all(|s| s.exists()));
}

/// Cursor never moves backwards within a batch
#[test]
fn test_prefixes_strictly_increase_within_batch() {
    // Given: 22 and 25 occupied
    let fixture = Fixture::new();
    fixture.occupy("022_a.wav");
    fixture.occupy("025_b.wav");
    let converter = FakeConverter::conformant();
    let sources: Vec<PathBuf> = ["c.wav", "d.wav", "e.wav", "f.wav"]
        .iter()
        .map(|n| fixture.wav(n))
        .collect();

    // When: Placing four assets
    let report = run(&fixture, &converter, &sources, Resolution::Skip);

    // Then: 21, 23, 24, 26
    assert_eq!(prefixes(&report), vec![21, 23, 24, 26]);
}

/// A fresh batch searches from the low bound again
#[test]
fn test_freed_prefix_is_reused_by_next_batch() {
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();

    // Given: First batch placed 21, 22, 23
    let first: Vec<PathBuf> = ["a.wav", "b.wav", "c.wav"].iter().map(|n| fixture.wav(n)).collect();
    assert_eq!(prefixes(&run(&fixture, &converter, &first, Resolution::Skip)), vec![21, 22, 23]);

    // When: 022 is removed and a second batch runs
    fs::remove_file(fixture.target.path().join("022_b.wav")).unwrap();
    let report = run(&fixture, &converter, &[fixture.wav("d.wav")], Resolution::Skip);

    // Then: The freed prefix is used
    assert_eq!(prefixes(&report), vec![22]);
}

/// Entries written with a hyphen separator are recognized
#[test]
fn test_hyphen_separated_entries_are_recognized() {
    let fixture = Fixture::new();
    fixture.occupy("021-bell.wav");
    let converter = FakeConverter::conformant();

    let report = run(
        &fixture,
        &converter,
        &[fixture.wav("bell.wav"), fixture.wav("horn.wav")],
        Resolution::Skip,
    );

    // bell.wav conflicts with 021-bell.wav; horn.wav skips the occupied 21
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(prefixes(&report), vec![22]);
    assert_eq!(fixture.target_names(), vec!["021-bell.wav", "022_horn.wav"]);
}

// =============================================================================
// Duplicate resolutions
// =============================================================================

#[test]
fn test_replace_removes_existing_entry() {
    // Given: 021_bell.wav already placed
    let fixture = Fixture::new();
    let old = fixture.occupy("021_bell.wav");
    let converter = FakeConverter::conformant();

    // When: Placing bell.wav with Replace
    let report = run(&fixture, &converter, &[fixture.wav("bell.wav")], Resolution::Replace);

    // Then: The vacated prefix is reused and the old content is gone
    assert_eq!(prefixes(&report), vec![21]);
    assert_eq!(report.placed[0].replaced, vec![old.clone()]);
    assert_eq!(fixture.target_names(), vec!["021_bell.wav"]);
    assert_ne!(fs::read(&old).unwrap(), b"existing".to_vec());
}

#[test]
fn test_replace_into_exhausted_interval_keeps_existing_entry() {
    // Given: Manual interval 21..=22; 021_bell.wav placed
    let fixture = Fixture::new();
    fixture.occupy("021_bell.wav");
    let converter = FakeConverter::conformant();
    let sources = vec![fixture.wav("horn.wav"), fixture.wav("bell.wav")];

    // When: horn takes 22, then bell asks to replace with the cursor past the interval
    let report = fixture
        .runner(&converter)
        .run(
            &sources,
            &RangeSelection::Manual { low: 21, high: 22 },
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Replace),
        )
        .unwrap();

    // Then: Exhausted before anything was deleted
    assert_eq!(prefixes(&report), vec![22]);
    assert!(report.exhausted);
    assert_eq!(report.unplaced, vec![sources[1].clone()]);
    assert_eq!(fixture.target_names(), vec!["021_bell.wav", "022_horn.wav"]);
    assert_eq!(
        fs::read(fixture.target.path().join("021_bell.wav")).unwrap(),
        b"existing".to_vec()
    );
}

/// A Replace whose commit fails leaves the existing entry where it was
#[test]
fn test_replace_commit_failure_restores_existing_entry() {
    // Given: 021_bell.wav placed, and a folder named 022_bell.wav that the
    // scan does not count but that blocks the destination
    let fixture = Fixture::new();
    fixture.occupy("021_bell.wav");
    fs::create_dir(fixture.target.path().join("022_bell.wav")).unwrap();
    let converter = FakeConverter::conformant();

    // When: Replacing bell.wav into 22..=29
    let report = fixture
        .runner(&converter)
        .run(
            &[fixture.wav("bell.wav")],
            &RangeSelection::Manual { low: 22, high: 29 },
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Replace),
        )
        .unwrap();

    // Then: Write failure recorded, old entry back under its own name
    assert!(report.placed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].error_code, "WRITE_FAILED");
    assert_eq!(fixture.target_names(), vec!["021_bell.wav", "022_bell.wav"]);
    assert_eq!(
        fs::read(fixture.target.path().join("021_bell.wav")).unwrap(),
        b"existing".to_vec()
    );
}

/// Replacing under a new prefix removes the old entry only after the commit
#[test]
fn test_replace_into_later_prefix_removes_old_entry() {
    // Given: 021_bell.wav placed; cursor starts above it
    let fixture = Fixture::new();
    let old = fixture.occupy("021_bell.wav");
    let converter = FakeConverter::conformant();

    // When: Replacing bell.wav into 25..=29
    let report = fixture
        .runner(&converter)
        .run(
            &[fixture.wav("bell.wav")],
            &RangeSelection::Manual { low: 25, high: 29 },
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Replace),
        )
        .unwrap();

    // Then: New entry at 25, old one gone, no parked leftovers
    assert_eq!(prefixes(&report), vec![25]);
    assert_eq!(report.placed[0].replaced, vec![old]);
    assert_eq!(fixture.target_names(), vec!["025_bell.wav"]);
}

#[test]
fn test_keep_both_places_under_new_prefix() {
    let fixture = Fixture::new();
    fixture.occupy("021_bell.wav");
    let converter = FakeConverter::conformant();

    let report = run(&fixture, &converter, &[fixture.wav("bell.wav")], Resolution::KeepBoth);

    assert_eq!(prefixes(&report), vec![22]);
    assert!(report.placed[0].duplicate_kept);
    assert_eq!(fixture.target_names(), vec!["021_bell.wav", "022_bell.wav"]);
}

/// Earlier placements in the same batch take part in duplicate checks
#[test]
fn test_duplicate_within_batch_is_detected() {
    // Given: Two sources that normalize to the same base name
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let sources = vec![fixture.wav("01 bell.wav"), fixture.wav("02 bell.wav")];

    // When: Skipping duplicates
    let report = run(&fixture, &converter, &sources, Resolution::Skip);

    // Then: The first is placed, the second conflicts with it
    assert_eq!(prefixes(&report), vec![21]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].source, sources[1]);
    assert_eq!(report.skipped[0].existing_prefixes, vec![21]);
    assert_eq!(fixture.target_names(), vec!["021_bell.wav"]);
}

// =============================================================================
// Conversion and validation
// =============================================================================

#[test]
fn test_non_wav_source_is_converted_and_renamed() {
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let source = fixture.mp3("03 02 MySong.mp3");

    let report = run(&fixture, &converter, &[source.clone()], Resolution::Skip);

    assert_eq!(converter.calls(), vec![source]);
    assert!(report.placed[0].converted);
    assert_eq!(report.placed[0].file_name, "021_MySong.wav");
    assert_eq!(fixture.target_names(), vec!["021_MySong.wav"]);
}

#[test]
fn test_wav_in_wrong_format_is_converted() {
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let source = fixture.wav_with("hi_rate.wav", &AudioConfig::at_rate(48000));

    let report = run(&fixture, &converter, &[source.clone()], Resolution::Skip);

    assert_eq!(converter.calls(), vec![source]);
    assert!(report.placed[0].converted);
}

/// Conversion failure drops the asset, keeps the source, and frees no slot
#[test]
fn test_conversion_failure_continues_batch() {
    // Given: Two sources; the first fails to convert
    let fixture = Fixture::new();
    let bad = fixture.mp3("bad.mp3");
    let good = fixture.mp3("good.mp3");
    let converter = FakeConverter::conformant().failing_on(bad.clone());

    // When: Running the batch
    let report = run(&fixture, &converter, &[bad.clone(), good], Resolution::Skip);

    // Then: Failure recorded, second asset takes the first prefix
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, bad);
    assert_eq!(report.failed[0].error_code, "CONVERSION_FAILED");
    assert!(bad.exists());
    assert_eq!(prefixes(&report), vec![21]);
    assert_eq!(fixture.target_names(), vec!["021_good.wav"]);
}

/// Tags that cannot be removed keep the file out of the board folder
#[test]
fn test_tag_strip_failure_drops_asset() {
    // Given: A conformant source and a reader that cannot strip tags
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let source = fixture.wav("bell.wav");
    let runner = BatchRunner::new(fixture.settings(), UnstrippableTags::default(), &converter);

    // When: Running the batch
    let report = runner
        .run(
            &[source.clone()],
            &KICKOUT_PRIMARY,
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Skip),
        )
        .unwrap();

    // Then: Recorded as a per-asset failure; nothing placed, source kept
    assert!(report.placed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, source);
    assert_eq!(report.failed[0].error_code, "PROBE_FAILED");
    assert!(source.exists());
    assert!(fixture.target_names().is_empty());
}

#[test]
fn test_converted_file_failing_validation_is_dropped() {
    // Given: A converter that produces mono output
    let fixture = Fixture::new();
    let converter = FakeConverter::producing(AudioConfig::mono());
    let source = fixture.mp3("mono.mp3");

    // When: Running the batch
    let report = run(&fixture, &converter, &[source.clone()], Resolution::Skip);

    // Then: Validation failure names the channel mismatch; nothing placed
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].error_code, "VALIDATION_FAILED");
    assert!(report.failed[0].error_message.contains("1 channel(s) (expected 2)"));
    assert!(source.exists());
    assert!(fixture.target_names().is_empty());
}

// =============================================================================
// Batch-level behaviour
// =============================================================================

#[test]
fn test_move_sources_removes_placed_sources_only() {
    let fixture = Fixture::new();
    fixture.occupy("021_bell.wav");
    let converter = FakeConverter::conformant();
    let placed = fixture.wav("horn.wav");
    let skipped = fixture.wav("bell.wav");

    let mut settings = fixture.settings();
    settings.move_sources = true;
    let report = BatchRunner::new(settings, LoftyProbe::new(), &converter)
        .run(
            &[placed.clone(), skipped.clone()],
            &KICKOUT_PRIMARY,
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Skip),
        )
        .unwrap();

    assert_eq!(prefixes(&report), vec![22]);
    assert!(!placed.exists());
    assert!(skipped.exists());
}

/// Once the last slot is taken, later sources are not converted at all
#[test]
fn test_exhausted_batch_stops_before_converting() {
    // Given: A one-slot interval; the second source would fail conversion
    let fixture = Fixture::new();
    let first = fixture.wav("kick.wav");
    let second = fixture.mp3("horn.mp3");
    let converter = FakeConverter::conformant().failing_on(second.clone());

    // When: Running the batch
    let report = fixture
        .runner(&converter)
        .run(
            &[first, second.clone()],
            &RangeSelection::Manual { low: 21, high: 21 },
            &RangeTable::canonical(),
            &mut FixedPolicy(Resolution::Skip),
        )
        .unwrap();

    // Then: The second source is unplaced, not failed, and never converted
    assert_eq!(prefixes(&report), vec![21]);
    assert!(report.exhausted);
    assert_eq!(report.unplaced, vec![second]);
    assert!(report.failed.is_empty());
    assert!(converter.calls().is_empty());
}

#[test]
fn test_unreachable_target_fails_batch() {
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let missing = fixture.target.path().join("not-there");
    let settings = BatchSettings::from_config(&TomlConfig::default(), missing.clone());

    let result = BatchRunner::new(settings, LoftyProbe::new(), &converter).run(
        &[fixture.wav("a.wav")],
        &KICKOUT_PRIMARY,
        &RangeTable::canonical(),
        &mut FixedPolicy(Resolution::Skip),
    );

    assert!(matches!(result, Err(PrepError::UnreachableTarget { .. })));
    assert!(!missing.exists());
}

/// Selection errors are reported before the target folder is looked at
#[test]
fn test_bad_selection_fails_before_scanning() {
    let fixture = Fixture::new();
    let converter = FakeConverter::conformant();
    let settings = BatchSettings::from_config(
        &TomlConfig::default(),
        fixture.target.path().join("not-there"),
    );
    let runner = BatchRunner::new(settings, LoftyProbe::new(), &converter);
    let sources = vec![fixture.wav("a.wav")];

    let malformed = runner.run(
        &sources,
        &RangeSelection::Manual { low: 50, high: 40 },
        &RangeTable::canonical(),
        &mut FixedPolicy(Resolution::Skip),
    );
    assert!(matches!(
        malformed,
        Err(PrepError::Common(sbprep_common::Error::MalformedInterval(_)))
    ));

    let music_only = RangeTable::from_entries(&[RangeEntry {
        category: SoundCategory::Music,
        variant: Variant::Primary,
        low: 101,
        high: 199,
    }])
    .unwrap();
    let unknown = runner.run(
        &sources,
        &KICKOUT_PRIMARY,
        &music_only,
        &mut FixedPolicy(Resolution::Skip),
    );
    assert!(matches!(
        unknown,
        Err(PrepError::Common(sbprep_common::Error::UnknownCategory(_)))
    ));
}
