//! Placement into the target folder
//!
//! A Replace never deletes before the new file is in place: the old entries
//! are first renamed to hidden `.<name>.replaced` files in the same folder,
//! which the occupancy scan ignores, then released after the commit or
//! renamed back when it fails.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{PrepError, PrepResult};
use crate::models::PlacedEntry;

/// An existing entry parked under a hidden name during a Replace
#[derive(Debug)]
pub struct SetAside {
    entry: PlacedEntry,
    parked: PathBuf,
}

impl SetAside {
    pub fn parked_path(&self) -> &Path {
        &self.parked
    }
}

/// Moves staged files into the target folder under their assigned prefix
#[derive(Debug, Clone)]
pub struct TargetWriter {
    target_dir: PathBuf,
    separator: char,
}

impl TargetWriter {
    pub fn new(target_dir: impl Into<PathBuf>, separator: char) -> Self {
        Self {
            target_dir: target_dir.into(),
            separator,
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Final path for a prefix and base name
    pub fn destination(&self, prefix: u16, base_name: &str) -> PathBuf {
        self.target_dir
            .join(PlacedEntry::file_name_for(prefix, self.separator, base_name))
    }

    /// Move `staged` into place as `<prefix><sep><base_name>`
    ///
    /// Never overwrites: an existing destination is a write error. Falls back
    /// to copy + remove when a rename crosses file systems.
    pub fn commit(&self, staged: &Path, prefix: u16, base_name: &str) -> PrepResult<PlacedEntry> {
        let destination = self.destination(prefix, base_name);

        if destination.exists() || destination.is_symlink() {
            return Err(PrepError::Write {
                path: destination,
                reason: "destination already exists".to_string(),
            });
        }

        if let Err(rename_err) = std::fs::rename(staged, &destination) {
            tracing::debug!(
                from = %staged.display(),
                to = %destination.display(),
                error = %rename_err,
                "Rename failed, copying instead"
            );
            copy_then_remove(staged, &destination)?;
        }

        tracing::info!(file = %destination.display(), prefix, "Placed file");

        Ok(PlacedEntry {
            prefix,
            base_name: base_name.to_string(),
            path: destination,
        })
    }

    /// Rename an existing entry to a hidden name (first half of a Replace)
    pub fn set_aside(&self, entry: &PlacedEntry) -> PrepResult<SetAside> {
        let parked = parked_path(&entry.path);
        std::fs::rename(&entry.path, &parked).map_err(|e| PrepError::Write {
            path: entry.path.clone(),
            reason: format!("could not set existing entry aside: {}", e),
        })?;
        tracing::debug!(
            file = %entry.path.display(),
            parked = %parked.display(),
            "Set entry aside"
        );
        Ok(SetAside {
            entry: entry.clone(),
            parked,
        })
    }

    /// Put a parked entry back under its own name
    pub fn restore(&self, aside: SetAside) -> PrepResult<()> {
        std::fs::rename(&aside.parked, &aside.entry.path).map_err(|e| PrepError::Write {
            path: aside.entry.path.clone(),
            reason: format!(
                "could not restore existing entry (left at {}): {}",
                aside.parked.display(),
                e
            ),
        })?;
        tracing::info!(file = %aside.entry.path.display(), "Restored existing entry");
        Ok(())
    }

    /// Delete a parked entry once its replacement has committed
    ///
    /// Returns the path the entry used to have.
    pub fn release(&self, aside: SetAside) -> PathBuf {
        match std::fs::remove_file(&aside.parked) {
            Ok(()) => tracing::info!(
                file = %aside.entry.path.display(),
                prefix = aside.entry.prefix,
                "Removed replaced entry"
            ),
            Err(e) => tracing::warn!(
                file = %aside.parked.display(),
                error = %e,
                "Could not remove replaced entry"
            ),
        }
        aside.entry.path
    }
}

/// `.<file name>.replaced` next to `path`
fn parked_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(file_name) = path.file_name() {
        name.push(file_name);
    }
    name.push(".replaced");
    path.with_file_name(name)
}

/// Copy fallback for a rename that cannot be done in place
fn copy_then_remove(staged: &Path, destination: &Path) -> PrepResult<()> {
    std::fs::copy(staged, destination).map_err(|e| PrepError::Write {
        path: destination.to_path_buf(),
        reason: e.to_string(),
    })?;
    if let Err(e) = std::fs::remove_file(staged) {
        tracing::warn!(file = %staged.display(), error = %e, "Could not remove staged file");
    }
    Ok(())
}
