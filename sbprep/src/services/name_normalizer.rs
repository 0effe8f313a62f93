//! File name normalization
//!
//! Ripped or downloaded audio usually carries disc/track numbering in front of
//! the title (`03 02 MySong.wav`, `01 - Intro.flac`, `1.02 Theme.mp3`). That
//! numbering is removed so base names are canonical before any prefix is
//! allocated.
//!
//! A title that genuinely starts with digits followed by a separator
//! (`808 kick.wav`) is indistinguishable from numbering and is stripped too.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// One or more digit groups, each followed by separator characters
static LEADING_NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+[\s._-]+)+").expect("leading numbering regex must compile")
});

/// Extension of every placed file
pub const OUTPUT_EXTENSION: &str = "wav";

/// Remove leading disc/track numbering from a file name
///
/// Only the stem is inspected; the extension is kept. When stripping would
/// leave nothing of the stem, the name is returned unchanged. Idempotent:
/// the repeated pattern consumes every leading `digits + separator` group in
/// one pass, so a second pass finds nothing to remove.
pub fn strip(file_name: &str) -> String {
    let (stem, extension) = split_extension(file_name);

    let stripped = LEADING_NUMBERING.replace(stem, "");
    if stripped.is_empty() {
        return file_name.to_string();
    }

    match extension {
        Some(ext) => format!("{}.{}", stripped, ext),
        None => stripped.into_owned(),
    }
}

/// Base name a source file will be placed under
///
/// Strips numbering and swaps the extension for `.wav`, since every placed
/// file is PCM WAV regardless of the source format. Returns `None` for paths
/// without a UTF-8 file name.
pub fn placed_base_name(source: &Path) -> Option<String> {
    let file_name = source.file_name()?.to_str()?;
    let stripped = strip(file_name);
    let (stem, _) = split_extension(&stripped);
    if stem.trim().is_empty() {
        return None;
    }
    Some(format!("{}.{}", stem, OUTPUT_EXTENSION))
}

/// Split at the last dot, ignoring a leading dot (hidden files)
fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], Some(&file_name[idx + 1..])),
        _ => (file_name, None),
    }
}
