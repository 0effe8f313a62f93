//! Configuration loading and target folder resolution
//!
//! Configuration lives in a TOML file (default `<config_dir>/sbprep/config.toml`).
//! A missing default file is not an error: defaults are used instead.
//! The parsed [`TomlConfig`] is immutable once loaded and is passed explicitly
//! to whatever needs it.

use crate::ranges::{RangeEntry, RangeTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the target folder
pub const TARGET_DIR_ENV: &str = "SBPREP_TARGET_DIR";

/// Separator written between prefix and base name
pub const DEFAULT_SEPARATOR: char = '_';

/// What to do when an asset's base name is already placed under another prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Ask the operator for every conflict
    #[default]
    Prompt,
    /// Delete the existing entry, then place the new asset
    Replace,
    /// Place the new asset under a new prefix and keep the old one
    KeepBoth,
    /// Leave the new asset unplaced
    Skip,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(DuplicatePolicy::Prompt),
            "replace" => Ok(DuplicatePolicy::Replace),
            "keep-both" | "keepboth" => Ok(DuplicatePolicy::KeepBoth),
            "skip" => Ok(DuplicatePolicy::Skip),
            other => Err(Error::InvalidInput(format!(
                "unknown duplicate policy '{}' (expected prompt, replace, keep-both or skip)",
                other
            ))),
        }
    }
}

/// External converter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Program name or path of the converter (ffmpeg-compatible command line)
    pub program: String,
    /// Extra arguments inserted before the output path
    pub extra_args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of the TOML configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Board sound folder receiving prefixed files
    pub target_dir: Option<PathBuf>,
    /// Parent for per-batch staging folders (system temp dir when unset)
    pub staging_dir: Option<PathBuf>,
    /// Separator written between prefix and base name
    pub separator: char,
    /// Separators recognized when parsing names already in the target folder
    pub accepted_separators: Vec<char>,
    /// Default duplicate-conflict policy
    pub on_duplicate: DuplicatePolicy,
    pub converter: ConverterConfig,
    pub logging: LoggingConfig,
    /// Custom range table; empty means the canonical board layout
    pub ranges: Vec<RangeEntry>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            target_dir: None,
            staging_dir: None,
            separator: DEFAULT_SEPARATOR,
            accepted_separators: vec!['_', '-'],
            on_duplicate: DuplicatePolicy::default(),
            converter: ConverterConfig::default(),
            logging: LoggingConfig::default(),
            ranges: Vec::new(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from an explicit path, or the default location
    ///
    /// Returns the configuration together with the file it came from. An
    /// explicitly requested file must exist; when falling back to the default
    /// location, a missing file yields defaults and `None`.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match default_config_path() {
            Some(path) if path.exists() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        for sep in std::iter::once(&self.separator).chain(self.accepted_separators.iter()) {
            if sep.is_ascii_digit() || sep.is_whitespace() || *sep == '.' {
                return Err(Error::Config(format!(
                    "'{}' cannot be used as a prefix separator",
                    sep
                )));
            }
        }
        if !self.accepted_separators.contains(&self.separator) {
            return Err(Error::Config(format!(
                "separator '{}' must also be listed in accepted_separators",
                self.separator
            )));
        }
        if self.converter.program.trim().is_empty() {
            return Err(Error::Config("converter program must not be empty".to_string()));
        }
        self.range_table().map(|_| ())
    }

    /// Range table in effect: the custom table when one is configured
    pub fn range_table(&self) -> Result<RangeTable> {
        if self.ranges.is_empty() {
            Ok(RangeTable::canonical())
        } else {
            RangeTable::from_entries(&self.ranges)
        }
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sbprep").join("config.toml"))
}

/// Resolve the target folder
///
/// Priority order:
/// 1. Command-line argument
/// 2. `SBPREP_TARGET_DIR` environment variable
/// 3. TOML config file
///
/// No compiled default exists; an unresolved target is a configuration error.
pub fn resolve_target_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(TARGET_DIR_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    if let Some(path) = &config.target_dir {
        return Ok(path.clone());
    }

    Err(Error::Config(format!(
        "Target folder not configured. Use one of:\n\
         1. Command line: --target <DIR>\n\
         2. Environment: {}=<DIR>\n\
         3. TOML config: target_dir = \"<DIR>\"",
        TARGET_DIR_ENV
    )))
}
