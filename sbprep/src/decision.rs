//! Duplicate-conflict decisions
//!
//! When an asset's base name is already placed under another prefix the batch
//! runner asks a [`DuplicateResolver`] what to do. Resolvers never default to
//! overwriting: an unreadable or unrecognized answer resolves to
//! [`Resolution::Skip`].

use std::io::{self, BufRead, Write};

use sbprep_common::config::DuplicatePolicy;

use crate::models::{PendingAsset, PlacedEntry};

/// Answer to a duplicate conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Delete every existing entry with the base name, then place the asset
    Replace,
    /// Place the asset under a new prefix and keep the existing entries
    KeepBoth,
    /// Leave the asset unplaced
    Skip,
}

/// Source of duplicate-conflict decisions
pub trait DuplicateResolver {
    fn resolve(&mut self, asset: &PendingAsset, existing: &[PlacedEntry]) -> Resolution;
}

impl<F> DuplicateResolver for F
where
    F: FnMut(&PendingAsset, &[PlacedEntry]) -> Resolution,
{
    fn resolve(&mut self, asset: &PendingAsset, existing: &[PlacedEntry]) -> Resolution {
        self(asset, existing)
    }
}

/// Same answer for every conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPolicy(pub Resolution);

impl DuplicateResolver for FixedPolicy {
    fn resolve(&mut self, _asset: &PendingAsset, _existing: &[PlacedEntry]) -> Resolution {
        self.0
    }
}

/// Asks the operator on `output`, reads the answer from `input`
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
    max_attempts: usize,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            max_attempts: 3,
        }
    }

    fn ask(
        &mut self,
        asset: &PendingAsset,
        existing: &[PlacedEntry],
    ) -> io::Result<Option<Resolution>> {
        let names: Vec<String> = existing
            .iter()
            .map(|e| {
                e.path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{:03} {}", e.prefix, e.base_name))
            })
            .collect();

        writeln!(
            self.output,
            "'{}' ({}) is already placed as {}",
            asset.base_name,
            asset.source_path.display(),
            names.join(", ")
        )?;

        for _ in 0..self.max_attempts {
            write!(self.output, "[r]eplace / [k]eep both / [s]kip? ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match parse_answer(&line) {
                Some(resolution) => return Ok(Some(resolution)),
                None => writeln!(self.output, "Please answer r, k or s.")?,
            }
        }

        Ok(None)
    }
}

impl<R: BufRead, W: Write> DuplicateResolver for PromptResolver<R, W> {
    fn resolve(&mut self, asset: &PendingAsset, existing: &[PlacedEntry]) -> Resolution {
        match self.ask(asset, existing) {
            Ok(Some(resolution)) => resolution,
            Ok(None) => {
                tracing::warn!(
                    base_name = %asset.base_name,
                    "No answer to duplicate prompt, skipping"
                );
                Resolution::Skip
            }
            Err(e) => {
                tracing::warn!(
                    base_name = %asset.base_name,
                    error = %e,
                    "Duplicate prompt failed, skipping"
                );
                Resolution::Skip
            }
        }
    }
}

fn parse_answer(line: &str) -> Option<Resolution> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "replace" => Some(Resolution::Replace),
        "k" | "keep" | "keep-both" | "keep both" => Some(Resolution::KeepBoth),
        "s" | "skip" => Some(Resolution::Skip),
        _ => None,
    }
}

/// Resolver for a configured policy; `Prompt` reads stdin and writes stderr
pub fn resolver_for(policy: DuplicatePolicy) -> Box<dyn DuplicateResolver> {
    match policy {
        DuplicatePolicy::Prompt => Box::new(PromptResolver::new(io::stdin().lock(), io::stderr())),
        DuplicatePolicy::Replace => Box::new(FixedPolicy(Resolution::Replace)),
        DuplicatePolicy::KeepBoth => Box::new(FixedPolicy(Resolution::KeepBoth)),
        DuplicatePolicy::Skip => Box::new(FixedPolicy(Resolution::Skip)),
    }
}
