//! Error types for sbprep
//!
//! Errors fall in two groups:
//! - per-batch: the batch cannot start or continue (configuration, unreachable target)
//! - per-asset: one source file is dropped and the batch moves on

use std::path::PathBuf;
use thiserror::Error;

use crate::services::format_validator::Mismatch;
use crate::services::source_scanner::ScanError;

/// Preparation error type
#[derive(Debug, Error)]
pub enum PrepError {
    /// Range selection or configuration problem (fatal before any I/O)
    #[error(transparent)]
    Common(#[from] sbprep_common::Error),

    /// Target folder missing or unreadable (fatal at batch start)
    #[error("Target folder unreachable: {path}: {reason}")]
    UnreachableTarget { path: PathBuf, reason: String },

    /// External converter failed for one asset
    #[error("Conversion failed for {path}: {reason}")]
    ConversionFailed { path: PathBuf, reason: String },

    /// Produced file still does not match the target profile
    #[error(
        "Converted file for {path} does not match the target profile: {}",
        describe(.mismatches)
    )]
    ValidationFailed {
        path: PathBuf,
        mismatches: Vec<Mismatch>,
    },

    /// File could not be opened or decoded by the metadata probe
    #[error("Probe failed for {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    /// Placement into the target folder failed
    #[error("Write to {path} failed: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Source path missing or unreadable
    #[error("Source scan error: {0}")]
    Scan(#[from] ScanError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrepError {
    /// Whether the error only affects the asset that raised it
    pub fn is_per_asset(&self) -> bool {
        matches!(
            self,
            PrepError::ConversionFailed { .. }
                | PrepError::ValidationFailed { .. }
                | PrepError::Probe { .. }
                | PrepError::Write { .. }
        )
    }

    /// Short machine-readable code for batch reports
    pub fn code(&self) -> &'static str {
        match self {
            PrepError::Common(sbprep_common::Error::UnknownCategory(_)) => "UNKNOWN_CATEGORY",
            PrepError::Common(sbprep_common::Error::MalformedInterval(_)) => "MALFORMED_INTERVAL",
            PrepError::Common(_) => "CONFIG_ERROR",
            PrepError::UnreachableTarget { .. } => "UNREACHABLE_TARGET",
            PrepError::ConversionFailed { .. } => "CONVERSION_FAILED",
            PrepError::ValidationFailed { .. } => "VALIDATION_FAILED",
            PrepError::Probe { .. } => "PROBE_FAILED",
            PrepError::Write { .. } => "WRITE_FAILED",
            PrepError::Scan(_) => "SCAN_FAILED",
            PrepError::Io(_) => "IO_ERROR",
        }
    }
}

fn describe(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for preparation operations
pub type PrepResult<T> = Result<T, PrepError>;
