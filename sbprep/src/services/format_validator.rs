//! Target profile validation
//!
//! Decides whether measured audio properties match the board's fixed PCM
//! profile. Every field is checked so the operator sees all deviations at once.

use sbprep_common::TargetProfile;
use serde::Serialize;
use std::fmt;

/// Audio properties as measured by a probe
///
/// `None` means the probe could not determine the property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeasuredFormat {
    pub sample_rate_hz: Option<u32>,
    pub channel_count: Option<u16>,
    pub bits_per_sample: Option<u16>,
}

/// One field that deviates from the target profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Mismatch {
    SampleRate { expected: u32, actual: Option<u32> },
    Channels { expected: u16, actual: Option<u16> },
    BitsPerSample { expected: u16, actual: Option<u16> },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn actual<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        }

        match self {
            Mismatch::SampleRate { expected, actual: a } => {
                write!(f, "sample rate {} Hz (expected {} Hz)", actual(a), expected)
            }
            Mismatch::Channels { expected, actual: a } => {
                write!(f, "{} channel(s) (expected {})", actual(a), expected)
            }
            Mismatch::BitsPerSample { expected, actual: a } => {
                write!(f, "{} bits per sample (expected {})", actual(a), expected)
            }
        }
    }
}

/// Validation verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Pass,
    Fail(Vec<Mismatch>),
}

impl Validation {
    pub fn is_pass(&self) -> bool {
        matches!(self, Validation::Pass)
    }
}

/// Checks measured formats against one target profile
#[derive(Debug, Clone, Copy)]
pub struct FormatValidator {
    profile: TargetProfile,
}

impl FormatValidator {
    pub fn new(profile: TargetProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Compare every field; mismatches are collected, never short-circuited
    pub fn validate(&self, measured: &MeasuredFormat) -> Validation {
        let mut mismatches = Vec::new();

        if measured.sample_rate_hz != Some(self.profile.sample_rate_hz) {
            mismatches.push(Mismatch::SampleRate {
                expected: self.profile.sample_rate_hz,
                actual: measured.sample_rate_hz,
            });
        }
        if measured.channel_count != Some(self.profile.channel_count) {
            mismatches.push(Mismatch::Channels {
                expected: self.profile.channel_count,
                actual: measured.channel_count,
            });
        }
        if measured.bits_per_sample != Some(self.profile.bits_per_sample) {
            mismatches.push(Mismatch::BitsPerSample {
                expected: self.profile.bits_per_sample,
                actual: measured.bits_per_sample,
            });
        }

        if mismatches.is_empty() {
            Validation::Pass
        } else {
            Validation::Fail(mismatches)
        }
    }
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new(TargetProfile::BOARD)
    }
}
