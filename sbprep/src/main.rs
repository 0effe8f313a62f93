//! sbprep - sound-board asset preparation
//!
//! Converts source audio to the board's PCM profile and places it in the
//! board's sound folder under a category prefix.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sbprep::decision::resolver_for;
use sbprep::models::BatchReport;
use sbprep::services::{
    BatchRunner, BatchSettings, FfmpegGateway, FormatValidator, LoftyProbe, MetadataProbe,
    SourceScanner, TargetScanner, Validation,
};
use sbprep_common::config::{resolve_target_dir, DuplicatePolicy, TomlConfig};
use sbprep_common::ranges::RangeSelection;
use sbprep_common::{RangeTable, SoundCategory, Variant};

/// Command-line arguments for sbprep
#[derive(Parser, Debug)]
#[command(name = "sbprep")]
#[command(about = "Prepare audio assets for a pinball sound board")]
#[command(version)]
struct Args {
    /// Configuration file (default: <config dir>/sbprep/config.toml)
    #[arg(short, long, global = true, env = "SBPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert sources and place them in the board folder
    Place {
        /// Source files or folders (folders are scanned for audio files)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Board sound folder
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Sound category (kickout, rollover, tilt, music)
        #[arg(long, requires = "variant", required_unless_present = "range")]
        category: Option<SoundCategory>,

        /// Category variant (primary, alternate)
        #[arg(long, requires = "category")]
        variant: Option<Variant>,

        /// Manual prefix interval, e.g. 301-350
        #[arg(
            long,
            conflicts_with_all = ["category", "variant"],
            value_parser = parse_manual_range
        )]
        range: Option<(i64, i64)>,

        /// Duplicate base name handling (prompt, replace, keep-both, skip)
        #[arg(long)]
        on_duplicate: Option<DuplicatePolicy>,

        /// Delete each source once it has been placed
        #[arg(long)]
        move_sources: bool,

        /// Limit recursion into source folders (1 = only the folder's own files)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the prefixed files currently in the board folder
    Scan {
        /// Board sound folder
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Check files against the board's PCM profile
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also list the tag items each file carries
        #[arg(long)]
        tags: bool,
    },

    /// Print the active category range table
    Ranges,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let (config, config_source) = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "sbprep v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_source {
        Some(path) => info!(config = %path.display(), "Using configuration file"),
        None => warn!("No configuration file found, using defaults"),
    }

    let table = config.range_table()?;

    match args.command {
        Command::Place {
            sources,
            target,
            category,
            variant,
            range,
            on_duplicate,
            move_sources,
            max_depth,
            json,
        } => {
            let selection = match (range, category, variant) {
                (Some((low, high)), _, _) => RangeSelection::Manual { low, high },
                (None, Some(category), Some(variant)) => {
                    RangeSelection::Category { category, variant }
                }
                _ => anyhow::bail!("Either --category with --variant, or --range is required"),
            };
            // Fail on a bad selection before touching any folder
            let interval = selection.resolve(&table)?;
            info!(selection = %selection, interval = %interval, "Selected prefix interval");

            let target_dir = resolve_target_dir(target.as_deref(), &config)?;
            let policy = on_duplicate.unwrap_or(config.on_duplicate);

            let mut source_scanner = SourceScanner::new();
            if let Some(depth) = max_depth {
                source_scanner = source_scanner.with_max_depth(depth);
            }
            let files = source_scanner
                .collect(&sources)
                .context("Failed to collect source files")?;
            if files.is_empty() {
                warn!("No audio files found in the given sources");
                return Ok(ExitCode::SUCCESS);
            }

            let converter = FfmpegGateway::from_config(&config.converter);
            match converter.detect() {
                Ok(banner) => info!(converter = %banner, "Converter available"),
                Err(e) => warn!(
                    error = %e,
                    "Converter not available; only conformant WAV sources can be placed"
                ),
            }

            let mut settings = BatchSettings::from_config(&config, target_dir);
            settings.move_sources = move_sources;
            let runner = BatchRunner::new(settings, LoftyProbe::new(), converter);

            let mut resolver = resolver_for(policy);
            let report = runner
                .run(&files, &selection, &table, resolver.as_mut())
                .context("Batch aborted")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }

        Command::Scan { target } => {
            let target_dir = resolve_target_dir(target.as_deref(), &config)?;
            scan_target(&target_dir, &config, &table)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Check { files, tags } => {
            let probe = LoftyProbe::new();
            let validator = FormatValidator::default();
            let mut failures = 0;

            for file in &files {
                match probe.measure(file) {
                    Ok(measurement) => match validator.validate(&measurement.format) {
                        Validation::Pass => {
                            println!("OK    {} ({})", file.display(), measurement.container)
                        }
                        Validation::Fail(mismatches) => {
                            failures += 1;
                            let detail: Vec<String> =
                                mismatches.iter().map(|m| m.to_string()).collect();
                            println!(
                                "FAIL  {} ({}): {}",
                                file.display(),
                                measurement.container,
                                detail.join(", ")
                            );
                        }
                    },
                    Err(e) => {
                        failures += 1;
                        println!("ERROR {}: {}", file.display(), e);
                        continue;
                    }
                }

                if tags {
                    match probe.probe(file) {
                        Ok(items) => {
                            for (name, value) in items {
                                println!("      {} = {}", name, value);
                            }
                        }
                        Err(e) => warn!(file = %file.display(), error = %e, "Could not read tags"),
                    }
                }
            }

            Ok(if failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }

        Command::Ranges => {
            for (category, variant, interval) in table.iter() {
                println!("{:<10} {:<10} {}", category, variant, interval);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parse `low-high` without range checks; those happen on resolve
fn parse_manual_range(s: &str) -> std::result::Result<(i64, i64), String> {
    let (low, high) = s
        .split_once('-')
        .ok_or_else(|| format!("expected <low>-<high>, got '{}'", s))?;
    let low = low
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("bad low bound '{}': {}", low, e))?;
    let high = high
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("bad high bound '{}': {}", high, e))?;
    Ok((low, high))
}

fn scan_target(target_dir: &Path, config: &TomlConfig, table: &RangeTable) -> Result<()> {
    let scanner = TargetScanner::new(config.accepted_separators.clone());
    scanner.check_reachable(target_dir)?;
    let state = scanner.scan(target_dir)?;

    for (category, variant, interval) in table.iter() {
        let held: Vec<_> = state
            .entries()
            .iter()
            .filter(|e| interval.contains(e.prefix))
            .collect();
        println!(
            "{}/{} {}: {} of {} used",
            category,
            variant,
            interval,
            held.len(),
            interval.len()
        );
        for entry in held {
            println!("  {:03} {}", entry.prefix, entry.base_name);
        }
    }

    let outside: Vec<_> = state
        .entries()
        .iter()
        .filter(|e| table.owner_of(e.prefix).is_none())
        .collect();
    if !outside.is_empty() {
        println!("outside any category:");
        for entry in outside {
            println!("  {:03} {}", entry.prefix, entry.base_name);
        }
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("Interval {} in {}", report.interval, report.target_dir.display());
    for placement in &report.placed {
        let mut notes = Vec::new();
        if placement.converted {
            notes.push("converted".to_string());
        }
        if placement.duplicate_kept {
            notes.push("duplicate kept".to_string());
        }
        if !placement.replaced.is_empty() {
            notes.push(format!("replaced {}", placement.replaced.len()));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        println!("  placed   {} <- {}{}", placement.file_name, placement.source.display(), notes);
    }
    for skipped in &report.skipped {
        println!(
            "  skipped  {} (already at {:?})",
            skipped.source.display(),
            skipped.existing_prefixes
        );
    }
    for failure in &report.failed {
        println!(
            "  failed   {} [{}] {}",
            failure.source.display(),
            failure.error_code,
            failure.error_message
        );
    }
    if report.exhausted {
        println!("Interval exhausted; {} source(s) not placed:", report.unplaced.len());
        for source in &report.unplaced {
            println!("  unplaced {}", source.display());
        }
    }
}
