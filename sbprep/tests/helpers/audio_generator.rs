//! Audio Test Fixture Generator
//!
//! Writes short PCM WAV files with chosen format properties

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioConfig {
    /// Board profile: 44.1 kHz, stereo, 16 bit
    pub fn board() -> Self {
        Self::default()
    }

    pub fn mono() -> Self {
        Self {
            channels: 1,
            ..Self::default()
        }
    }

    pub fn at_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.1,
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

/// Generate a WAV file with a 440 Hz tone
///
/// 8 and 16 bit depths are written as integer samples, 24 bit as `i32`.
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: config.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
    let full_scale = ((1i64 << (config.bits_per_sample - 1)) - 1) as f32;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = (0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * full_scale) as i32;

        for _ in 0..config.channels {
            match config.bits_per_sample {
                8 => writer.write_sample(value as i8)?,
                16 => writer.write_sample(value as i16)?,
                _ => writer.write_sample(value)?,
            }
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_board_wav() {
        let temp_dir = TempDir::new().unwrap();
        let wav_path = temp_dir.path().join("tone.wav");

        generate_test_wav(&wav_path, &AudioConfig::board()).unwrap();

        let reader = hound::WavReader::open(&wav_path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
    }
}
