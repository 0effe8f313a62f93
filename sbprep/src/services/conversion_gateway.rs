//! External conversion tool
//!
//! Codec work is delegated to an external program. The gateway only builds
//! the command line, runs it, and reports success or failure.

use sbprep_common::config::ConverterConfig;
use sbprep_common::TargetProfile;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::error::{PrepError, PrepResult};

/// Lines of converter stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 5;

/// Produces a file matching `profile` from an arbitrary input
pub trait ConversionGateway {
    fn convert(&self, input: &Path, output: &Path, profile: &TargetProfile) -> PrepResult<()>;
}

impl<T: ConversionGateway + ?Sized> ConversionGateway for &T {
    fn convert(&self, input: &Path, output: &Path, profile: &TargetProfile) -> PrepResult<()> {
        (**self).convert(input, output, profile)
    }
}

/// ffmpeg-compatible converter process
#[derive(Debug, Clone)]
pub struct FfmpegGateway {
    program: String,
    extra_args: Vec<String>,
}

impl FfmpegGateway {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one conversion
    ///
    /// Video streams and all source metadata are dropped; audio is resampled
    /// and written as signed little-endian PCM.
    pub fn command_args(
        &self,
        input: &Path,
        output: &Path,
        profile: &TargetProfile,
    ) -> Vec<OsString> {
        let codec = format!("pcm_s{}le", profile.bits_per_sample);

        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vn".into(),
            "-map_metadata".into(),
            "-1".into(),
            "-ar".into(),
            profile.sample_rate_hz.to_string().into(),
            "-ac".into(),
            profile.channel_count.to_string().into(),
            "-c:a".into(),
            codec.into(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Check the converter can be launched; returns its version banner line
    pub fn detect(&self) -> PrepResult<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .map_err(|e| PrepError::ConversionFailed {
                path: self.program.clone().into(),
                reason: format!("converter not available: {}", e),
            })?;

        if !output.status.success() {
            return Err(PrepError::ConversionFailed {
                path: self.program.clone().into(),
                reason: format!("'{} -version' exited with {}", self.program, output.status),
            });
        }

        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(banner)
    }
}

impl Default for FfmpegGateway {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

impl ConversionGateway for FfmpegGateway {
    fn convert(&self, input: &Path, output: &Path, profile: &TargetProfile) -> PrepResult<()> {
        let args = self.command_args(input, output, profile);
        tracing::debug!(
            program = %self.program,
            input = %input.display(),
            output = %output.display(),
            "Running converter"
        );

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| PrepError::ConversionFailed {
                path: input.to_path_buf(),
                reason: format!("failed to launch '{}': {}", self.program, e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ");
            discard_partial(output);
            return Err(PrepError::ConversionFailed {
                path: input.to_path_buf(),
                reason: format!("'{}' exited with {}: {}", self.program, result.status, tail),
            });
        }

        if !output.is_file() {
            return Err(PrepError::ConversionFailed {
                path: input.to_path_buf(),
                reason: format!("'{}' reported success but wrote no output", self.program),
            });
        }

        Ok(())
    }
}

fn discard_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            tracing::warn!(file = %output.display(), error = %e, "Could not remove partial output");
        }
    }
}
