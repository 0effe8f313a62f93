//! Source file discovery
//!
//! Collects the audio files a batch will process, in a stable order:
//! directories are walked sorted by file name, explicit files keep the order
//! they were given in.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Source scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Source audio scanner
pub struct SourceScanner {
    ignore_patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl SourceScanner {
    /// Create new scanner with default ignore patterns
    ///
    /// Ignores hidden files and system files like .DS_Store, Thumbs.db.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "desktop.ini".to_string(),
            ],
            max_depth: None,
        }
    }

    /// Limit directory recursion (1 = only the given folder)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Expand inputs into the ordered list of source files
    ///
    /// Directories contribute every verified audio file below them; files
    /// named explicitly are taken as given. Each path appears once.
    pub fn collect(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        for input in inputs {
            if !input.exists() {
                return Err(ScanError::PathNotFound(input.clone()));
            }

            let found = if input.is_dir() {
                self.scan(input)
            } else {
                vec![input.clone()]
            };

            for file in found {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        tracing::debug!(count = files.len(), "Collected source files");
        Ok(files)
    }

    /// Walk a directory for audio files, sorted by file name
    pub fn scan(&self, root_path: &Path) -> Vec<PathBuf> {
        let mut symlink_visited = HashSet::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.path();
                    match self.is_audio_file(path) {
                        Ok(true) => files.push(path.to_path_buf()),
                        Ok(false) => {
                            tracing::debug!(file = %path.display(), "Skipping non-audio file")
                        }
                        Err(e) => tracing::warn!("Error verifying {}: {}", path.display(), e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        files
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let file_name = entry.file_name().to_string_lossy();

        // The walk root itself is always processed
        if entry.depth() > 0 && file_name.starts_with('.') {
            return false;
        }
        if self.ignore_patterns.iter().any(|p| file_name == p.as_str()) {
            return false;
        }

        // Detect symlink loops
        if entry.file_type().is_symlink() {
            if let Ok(canonical) = entry.path().canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", entry.path().display());
                    return false;
                }
            }
        }

        true
    }

    /// Extension check first (fast), then magic bytes (reliable)
    fn is_audio_file(&self, path: &Path) -> Result<bool, ScanError> {
        match path.extension() {
            Some(ext) if is_audio_extension(&ext.to_string_lossy().to_lowercase()) => {
                self.verify_magic_bytes(path)
            }
            _ => Ok(false),
        }
    }

    fn verify_magic_bytes(&self, path: &Path) -> Result<bool, ScanError> {
        let mut file = File::open(path)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        let mut buffer = [0u8; 12];
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        if bytes_read < 4 {
            return Ok(false);
        }

        let is_audio = match &buffer[..bytes_read] {
            // MP3
            [0xFF, 0xFB, ..] | [0xFF, 0xF3, ..] | [0xFF, 0xF2, ..] => true,
            [b'I', b'D', b'3', ..] => true,

            // FLAC
            [b'f', b'L', b'a', b'C', ..] => true,

            // OGG (Vorbis/Opus)
            [b'O', b'g', b'g', b'S', ..] => true,

            // M4A/AAC (MP4 container)
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => true,

            // ADTS AAC
            [0xFF, 0xF1, ..] | [0xFF, 0xF9, ..] => true,

            // WAV
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E'] => true,

            // AIFF / AIFF-C
            [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', _] => true,

            // WMA (ASF header GUID)
            [0x30, 0x26, 0xB2, 0x75, ..] => true,

            _ => false,
        };

        Ok(is_audio)
    }
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Extensions treated as audio sources
pub fn is_audio_extension(ext: &str) -> bool {
    matches!(
        ext,
        "wav" | "mp3" | "flac" | "ogg" | "oga" | "m4a" | "aac" | "aiff" | "aif" | "opus" | "wma"
    )
}
