//! Batch results
//!
//! Summary of one placement run: what landed where, what was skipped by a
//! duplicate decision, what failed and why, and what was never attempted
//! because the interval ran out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sbprep_common::ClosedInterval;
use std::path::PathBuf;

/// One committed placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub source: PathBuf,
    pub prefix: u16,
    pub file_name: String,
    /// Converted by the external tool rather than copied
    pub converted: bool,
    /// Entries removed by a Replace decision
    pub replaced: Vec<PathBuf>,
    /// Placed despite an existing entry with the same base name
    pub duplicate_kept: bool,
}

/// Asset left unplaced by a Skip decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAsset {
    pub source: PathBuf,
    pub base_name: String,
    /// Prefixes already holding the same base name
    pub existing_prefixes: Vec<u16>,
}

/// Per-asset failure; the source file is left where it was
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFailure {
    pub source: PathBuf,
    /// Short machine-readable code (e.g. `CONVERSION_FAILED`)
    pub error_code: String,
    pub error_message: String,
}

/// Outcome of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub interval: ClosedInterval,
    pub target_dir: PathBuf,
    pub placed: Vec<Placement>,
    pub skipped: Vec<SkippedAsset>,
    pub failed: Vec<AssetFailure>,
    /// Sources never placed because the interval was exhausted
    pub unplaced: Vec<PathBuf>,
    pub exhausted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchReport {
    pub fn new(interval: ClosedInterval, target_dir: PathBuf) -> Self {
        Self {
            interval,
            target_dir,
            placed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            unplaced: Vec::new(),
            exhausted: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when every presented source was placed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty() && self.unplaced.is_empty()
    }
}
