//! Conversion gateway stand-in
//!
//! Writes a generated WAV instead of running an external converter, so the
//! batch pipeline can be exercised without ffmpeg installed.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use sbprep::error::{PrepError, PrepResult};
use sbprep::services::ConversionGateway;
use sbprep_common::TargetProfile;

use super::audio_generator::{generate_test_wav, AudioConfig};

pub struct FakeConverter {
    /// Format of the file "produced" by conversion
    output: AudioConfig,
    /// Inputs whose conversion fails
    failing: Vec<PathBuf>,
    calls: RefCell<Vec<PathBuf>>,
}

impl FakeConverter {
    /// Produces files matching the board profile
    pub fn conformant() -> Self {
        Self::producing(AudioConfig::board())
    }

    /// Produces files in the given format, conformant or not
    pub fn producing(output: AudioConfig) -> Self {
        Self {
            output,
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, input: impl Into<PathBuf>) -> Self {
        self.failing.push(input.into());
        self
    }

    /// Inputs passed to `convert`, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl ConversionGateway for FakeConverter {
    fn convert(&self, input: &Path, output: &Path, _profile: &TargetProfile) -> PrepResult<()> {
        self.calls.borrow_mut().push(input.to_path_buf());

        if self.failing.iter().any(|f| f == input) {
            return Err(PrepError::ConversionFailed {
                path: input.to_path_buf(),
                reason: "simulated decoder error".to_string(),
            });
        }

        generate_test_wav(output, &self.output).map_err(|e| PrepError::ConversionFailed {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
