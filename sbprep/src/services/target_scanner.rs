//! Target folder occupancy scan
//!
//! Lists the flat target folder and parses `<3 digits><separator><base name>`
//! file names into [`PlacedEntry`] values. The listing is taken fresh on every
//! call; files added or removed out-of-band between runs are always seen.
//!
//! Every non-directory counts: regular files, symlinks (dangling ones too) and
//! names that are not valid UTF-8. Such a name still holds its prefix; its base
//! name is decoded lossily.

use std::ffi::OsStr;
use std::path::Path;

use crate::error::{PrepError, PrepResult};
use crate::models::{DirectoryState, PlacedEntry};

/// Width of the numeric prefix
pub const PREFIX_WIDTH: usize = 3;

/// Target folder scanner
#[derive(Debug, Clone)]
pub struct TargetScanner {
    accepted_separators: Vec<char>,
}

impl TargetScanner {
    /// Create scanner recognizing the given prefix separators
    pub fn new(accepted_separators: Vec<char>) -> Self {
        Self {
            accepted_separators,
        }
    }

    /// Parse a target file name into `(prefix, base name)`
    ///
    /// The first three bytes must be ASCII digits, followed by an accepted
    /// separator; the remainder (non-empty) is the base name.
    /// `1234_x.wav` or `025bell.wav` are not entries.
    pub fn parse_entry_name(&self, file_name: &OsStr) -> Option<(u16, String)> {
        let bytes = file_name.as_encoded_bytes();
        let digits = bytes.get(..PREFIX_WIDTH)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }

        let rest = &bytes[PREFIX_WIDTH..];
        let base_name = self.accepted_separators.iter().find_map(|separator| {
            let mut buf = [0u8; 4];
            rest.strip_prefix(separator.encode_utf8(&mut buf).as_bytes())
        })?;
        if base_name.is_empty() {
            return None;
        }

        let prefix = digits
            .iter()
            .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
        Some((prefix, String::from_utf8_lossy(base_name).into_owned()))
    }

    /// Fail unless the folder exists and can be listed
    pub fn check_reachable(&self, target_dir: &Path) -> PrepResult<()> {
        if !target_dir.is_dir() {
            return Err(PrepError::UnreachableTarget {
                path: target_dir.to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }
        std::fs::read_dir(target_dir)
            .map(|_| ())
            .map_err(|e| unreachable_target(target_dir, e))
    }

    /// Read current occupancy of the target folder
    pub fn scan(&self, target_dir: &Path) -> PrepResult<DirectoryState> {
        let listing = std::fs::read_dir(target_dir).map_err(|e| unreachable_target(target_dir, e))?;

        let mut entries = Vec::new();
        for dir_entry in listing {
            let dir_entry = dir_entry.map_err(|e| unreachable_target(target_dir, e))?;
            let path = dir_entry.path();

            match dir_entry.file_type() {
                Ok(file_type) if file_type.is_dir() => continue,
                // Follows the link; a dangling link is not a directory
                Ok(file_type) if file_type.is_symlink() && path.is_dir() => continue,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat entry");
                    continue;
                }
            }

            let file_name = dir_entry.file_name();
            match self.parse_entry_name(&file_name) {
                Some((prefix, base_name)) => entries.push(PlacedEntry {
                    prefix,
                    base_name,
                    path,
                }),
                None => {
                    tracing::debug!(
                        file = %file_name.to_string_lossy(),
                        "Ignoring file without a numeric prefix"
                    );
                }
            }
        }

        let state = DirectoryState::new(entries);
        for prefix in state.contested_prefixes() {
            tracing::warn!(prefix, "Prefix {:03} is held by more than one file", prefix);
        }

        tracing::debug!(
            target = %target_dir.display(),
            entries = state.len(),
            "Scanned target folder"
        );
        Ok(state)
    }
}

impl Default for TargetScanner {
    fn default() -> Self {
        Self::new(vec!['_', '-'])
    }
}

fn unreachable_target(path: &Path, err: std::io::Error) -> PrepError {
    PrepError::UnreachableTarget {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
