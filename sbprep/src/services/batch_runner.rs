//! Batch placement
//!
//! Drives one batch of sources into one prefix interval:
//!
//! 1. Resolve the interval (configuration errors fail before any I/O)
//! 2. Check the target folder is reachable
//! 3. Per source, in presentation order:
//!    - normalize the name
//!    - stage a conformant WAV (copy when the source already conforms,
//!      otherwise convert and re-validate)
//!    - strip tags from the staged copy
//!    - rescan the target folder, allocate, resolve duplicates, commit
//! 4. Stop at `Exhausted`, or before staging once the cursor has passed the
//!    high bound; remaining sources are reported as unplaced
//!
//! Per-asset failures are recorded and the batch continues. Nothing already
//! placed is rolled back.

use std::path::{Path, PathBuf};

use sbprep_common::config::TomlConfig;
use sbprep_common::ranges::RangeSelection;
use sbprep_common::{RangeTable, TargetProfile};

use crate::decision::{DuplicateResolver, Resolution};
use crate::error::{PrepError, PrepResult};
use crate::models::{AssetFailure, BatchReport, PendingAsset, PlacedEntry, Placement, SkippedAsset};
use crate::services::conversion_gateway::ConversionGateway;
use crate::services::format_validator::{FormatValidator, Validation};
use crate::services::metadata_probe::MetadataProbe;
use crate::services::name_normalizer;
use crate::services::prefix_allocator::{PrefixAllocator, PrefixDecision};
use crate::services::target_scanner::TargetScanner;
use crate::services::target_writer::{SetAside, TargetWriter};

/// Immutable settings for one batch
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub target_dir: PathBuf,
    /// Parent of the per-batch staging folder (system temp dir when `None`)
    pub staging_parent: Option<PathBuf>,
    /// Separator written between prefix and base name
    pub separator: char,
    /// Separators recognized in existing target names
    pub accepted_separators: Vec<char>,
    /// Delete each source once its placement has committed
    pub move_sources: bool,
    pub profile: TargetProfile,
}

impl BatchSettings {
    pub fn from_config(config: &TomlConfig, target_dir: PathBuf) -> Self {
        Self {
            target_dir,
            staging_parent: config.staging_dir.clone(),
            separator: config.separator,
            accepted_separators: config.accepted_separators.clone(),
            move_sources: false,
            profile: TargetProfile::BOARD,
        }
    }
}

/// Result of staging one source
struct Staged {
    asset: PendingAsset,
    converted: bool,
}

/// Batch runner over a metadata probe and a conversion gateway
pub struct BatchRunner<P, C> {
    settings: BatchSettings,
    probe: P,
    converter: C,
    validator: FormatValidator,
    scanner: TargetScanner,
    writer: TargetWriter,
}

impl<P: MetadataProbe, C: ConversionGateway> BatchRunner<P, C> {
    pub fn new(settings: BatchSettings, probe: P, converter: C) -> Self {
        let validator = FormatValidator::new(settings.profile);
        let scanner = TargetScanner::new(settings.accepted_separators.clone());
        let writer = TargetWriter::new(settings.target_dir.clone(), settings.separator);
        Self {
            settings,
            probe,
            converter,
            validator,
            scanner,
            writer,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Place `sources` into the interval chosen by `selection`
    ///
    /// Errors returned here are per-batch (bad selection, unreachable target,
    /// staging folder creation, target folder vanishing mid-batch). Everything
    /// else lands in the report.
    pub fn run(
        &self,
        sources: &[PathBuf],
        selection: &RangeSelection,
        table: &RangeTable,
        resolver: &mut dyn DuplicateResolver,
    ) -> PrepResult<BatchReport> {
        let interval = selection.resolve(table)?;
        let target_dir = &self.settings.target_dir;
        self.scanner.check_reachable(target_dir)?;

        let initial = self.scanner.scan(target_dir)?;
        tracing::info!(
            selection = %selection,
            interval = %interval,
            target = %target_dir.display(),
            sources = sources.len(),
            existing_entries = initial.len(),
            "Starting batch"
        );

        let staging = self.staging_dir()?;
        let mut allocator = PrefixAllocator::new(interval);
        let mut report = BatchReport::new(interval, target_dir.clone());

        for (index, source) in sources.iter().enumerate() {
            // No slot left: stop before converting anything else
            if allocator.is_exhausted() {
                stop_exhausted(&mut report, &sources[index..]);
                break;
            }

            let staged = match self.stage(index, source, staging.path()) {
                Ok(staged) => staged,
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "Asset dropped");
                    report.failed.push(failure(source, &e));
                    continue;
                }
            };

            let state = self.scanner.scan(target_dir)?;
            let allocated = allocator.allocate(&staged.asset, &state);
            let (decision, to_replace, duplicate_kept) = match allocated {
                PrefixDecision::DuplicateConflict { existing } => {
                    match resolver.resolve(&staged.asset, &existing) {
                        Resolution::Skip => {
                            tracing::info!(
                                base_name = %staged.asset.base_name,
                                "Skipped duplicate"
                            );
                            report.skipped.push(SkippedAsset {
                                source: source.clone(),
                                base_name: staged.asset.base_name.clone(),
                                existing_prefixes: existing.iter().map(|e| e.prefix).collect(),
                            });
                            discard(&staged.asset.staged_path);
                            continue;
                        }
                        Resolution::KeepBoth => {
                            tracing::warn!(
                                base_name = %staged.asset.base_name,
                                "Keeping both copies of a duplicate base name"
                            );
                            (allocator.claim_slot(&state), Vec::new(), true)
                        }
                        Resolution::Replace => {
                            (allocator.claim_slot_vacating(&state, &existing), existing, false)
                        }
                    }
                }
                other => (other, Vec::new(), false),
            };

            let prefix = match decision {
                PrefixDecision::Assign(prefix) => prefix,
                PrefixDecision::Exhausted => {
                    discard(&staged.asset.staged_path);
                    stop_exhausted(&mut report, &sources[index..]);
                    break;
                }
                PrefixDecision::DuplicateConflict { .. } => {
                    // Slot search never reports a conflict
                    discard(&staged.asset.staged_path);
                    continue;
                }
            };

            match self.place(&staged, prefix, &to_replace) {
                Ok(placement) => {
                    if self.settings.move_sources {
                        if let Err(e) = std::fs::remove_file(source) {
                            tracing::warn!(
                                source = %source.display(),
                                error = %e,
                                "Could not remove source"
                            );
                        }
                    }
                    report.placed.push(Placement {
                        duplicate_kept,
                        ..placement
                    });
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "Placement failed");
                    report.failed.push(failure(source, &e));
                }
            }
        }

        report.finish();
        tracing::info!(
            placed = report.placed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            unplaced = report.unplaced.len(),
            exhausted = report.exhausted,
            "Batch finished"
        );
        Ok(report)
    }

    fn staging_dir(&self) -> PrepResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sbprep-");
        let dir = match &self.settings.staging_parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(staging = %dir.path().display(), "Created staging folder");
        Ok(dir)
    }

    /// Produce a conformant, tag-free WAV for one source
    fn stage(&self, index: usize, source: &Path, staging: &Path) -> PrepResult<Staged> {
        let base_name = name_normalizer::placed_base_name(source).ok_or_else(|| PrepError::Probe {
            path: source.to_path_buf(),
            reason: "file name is not usable as a base name".to_string(),
        })?;
        let staged_path = staging.join(format!("{:04}-{}", index, base_name));

        let conforms = match self.probe.measure(source) {
            Ok(measurement) => {
                measurement.is_wav && self.validator.validate(&measurement.format).is_pass()
            }
            Err(e) => {
                tracing::debug!(
                    source = %source.display(),
                    error = %e,
                    "Source not measurable, converting"
                );
                false
            }
        };

        let converted = if conforms {
            std::fs::copy(source, &staged_path)?;
            false
        } else {
            self.converter
                .convert(source, &staged_path, &self.settings.profile)?;
            let measured = self.probe.measure(&staged_path);
            let outcome = measured.map(|m| self.validator.validate(&m.format));
            match outcome {
                Ok(Validation::Pass) => {}
                Ok(Validation::Fail(mismatches)) => {
                    discard(&staged_path);
                    return Err(PrepError::ValidationFailed {
                        path: source.to_path_buf(),
                        mismatches,
                    });
                }
                Err(e) => {
                    discard(&staged_path);
                    return Err(e);
                }
            }
            true
        };

        if let Err(e) = self.probe.strip_tags(&staged_path) {
            discard(&staged_path);
            return Err(PrepError::Probe {
                path: source.to_path_buf(),
                reason: format!("could not strip tags from staged copy: {}", e),
            });
        }

        tracing::debug!(
            source = %source.display(),
            base_name = %base_name,
            converted,
            "Staged asset"
        );

        Ok(Staged {
            asset: PendingAsset {
                base_name,
                source_path: source.to_path_buf(),
                staged_path,
            },
            converted,
        })
    }

    /// Commit, applying a Replace (if any)
    ///
    /// Replaced entries are set aside first and only deleted once the new
    /// file is in place; a failed commit puts them back.
    fn place(
        &self,
        staged: &Staged,
        prefix: u16,
        to_replace: &[PlacedEntry],
    ) -> PrepResult<Placement> {
        let mut parked = Vec::with_capacity(to_replace.len());
        for entry in to_replace {
            match self.writer.set_aside(entry) {
                Ok(aside) => parked.push(aside),
                Err(e) => {
                    self.restore_all(parked);
                    return Err(e);
                }
            }
        }

        let committed = self
            .writer
            .commit(&staged.asset.staged_path, prefix, &staged.asset.base_name);
        let entry = match committed {
            Ok(entry) => entry,
            Err(e) => {
                self.restore_all(parked);
                discard(&staged.asset.staged_path);
                return Err(e);
            }
        };

        let replaced: Vec<PathBuf> = parked
            .into_iter()
            .map(|aside| self.writer.release(aside))
            .collect();

        let file_name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(
            source = %staged.asset.source_path.display(),
            prefix,
            file = %file_name,
            replaced = replaced.len(),
            "Placed asset"
        );

        Ok(Placement {
            source: staged.asset.source_path.clone(),
            prefix,
            file_name,
            converted: staged.converted,
            replaced,
            duplicate_kept: false,
        })
    }

    fn restore_all(&self, parked: Vec<SetAside>) {
        for aside in parked {
            if let Err(e) = self.writer.restore(aside) {
                tracing::error!(error = %e, "Replaced entry could not be restored");
            }
        }
    }
}

fn stop_exhausted(report: &mut BatchReport, remaining: &[PathBuf]) {
    report.exhausted = true;
    report.unplaced.extend(remaining.iter().cloned());
    tracing::warn!(
        interval = %report.interval,
        unplaced = report.unplaced.len(),
        "Interval exhausted, stopping batch"
    );
}

fn failure(source: &Path, err: &PrepError) -> AssetFailure {
    AssetFailure {
        source: source.to_path_buf(),
        error_code: err.code().to_string(),
        error_message: err.to_string(),
    }
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(file = %path.display(), error = %e, "Could not remove staged file");
        }
    }
}
