//! Fixed PCM profile expected by the sound-trigger board

use serde::{Deserialize, Serialize};

/// Target audio format every placed file must conform to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
}

impl TargetProfile {
    /// 44.1 kHz, stereo, 16-bit signed PCM
    pub const BOARD: TargetProfile = TargetProfile {
        sample_rate_hz: 44_100,
        channel_count: 2,
        bits_per_sample: 16,
    };
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self::BOARD
    }
}

impl std::fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz / {} ch / {}-bit PCM",
            self.sample_rate_hz, self.channel_count, self.bits_per_sample
        )
    }
}
