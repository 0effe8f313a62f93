//! Assets awaiting placement and entries already in the target folder

use serde::Serialize;
use std::path::PathBuf;

/// A conformant file ready for placement
///
/// Created once the source is known to produce a file matching the target
/// profile. Consumed by a successful placement, otherwise left unplaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    /// Normalized name, without prefix (e.g. `bell.wav`)
    pub base_name: String,
    /// Absolute path of the original source file
    pub source_path: PathBuf,
    /// Conformant WAV in the staging folder
    pub staged_path: PathBuf,
}

/// A file resident in the target folder with a parsed prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedEntry {
    pub prefix: u16,
    /// Portion of the file name after the separator
    pub base_name: String,
    pub path: PathBuf,
}

impl PlacedEntry {
    /// Render `<prefix:03><separator><base_name>`
    pub fn file_name_for(prefix: u16, separator: char, base_name: &str) -> String {
        format!("{:03}{}{}", prefix, separator, base_name)
    }
}

/// Occupancy of the target folder as read by one directory scan
///
/// Always built from a fresh listing; never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    entries: Vec<PlacedEntry>,
}

impl DirectoryState {
    /// Entries are kept sorted by prefix, then base name
    pub fn new(mut entries: Vec<PlacedEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.prefix
                .cmp(&b.prefix)
                .then_with(|| a.base_name.cmp(&b.base_name))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[PlacedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry holds `prefix`
    pub fn is_occupied(&self, prefix: u16) -> bool {
        self.entries.iter().any(|e| e.prefix == prefix)
    }

    /// Entries whose base name equals `base_name` exactly (case-sensitive)
    pub fn with_base_name(&self, base_name: &str) -> Vec<&PlacedEntry> {
        self.entries
            .iter()
            .filter(|e| e.base_name == base_name)
            .collect()
    }

    /// Prefixes held by more than one file (names that break injectivity)
    pub fn contested_prefixes(&self) -> Vec<u16> {
        let mut contested: Vec<u16> = self
            .entries
            .windows(2)
            .filter(|w| w[0].prefix == w[1].prefix)
            .map(|w| w[0].prefix)
            .collect();
        contested.dedup();
        contested
    }
}
