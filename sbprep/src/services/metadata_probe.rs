//! Audio probing and tag sanitization
//!
//! **MetadataProbe** is the seam to whatever reads audio properties and tags.
//! The shipped implementation uses lofty in-process.
//!
//! Extracts:
//! - Sample rate, channel count, bit depth
//! - Container type
//! - Tag items as name → text pairs

use lofty::file::FileType;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemValue, TagType};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PrepError, PrepResult};
use crate::services::format_validator::MeasuredFormat;

/// Audio properties plus container information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Container name (WAV, MP3, FLAC, ...)
    pub container: String,
    /// RIFF/WAVE container, which can be copied when the format passes
    pub is_wav: bool,
    pub format: MeasuredFormat,
}

/// Reads properties and tags from audio files
pub trait MetadataProbe {
    /// Tag items as name → value (text values only)
    fn probe(&self, path: &Path) -> PrepResult<BTreeMap<String, String>>;

    /// Container and PCM properties
    fn measure(&self, path: &Path) -> PrepResult<Measurement>;

    /// Remove every tag block from the file; returns how many were removed
    fn strip_tags(&self, path: &Path) -> PrepResult<usize>;
}

/// lofty-backed probe
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyProbe;

impl LoftyProbe {
    pub fn new() -> Self {
        Self
    }

    fn read(&self, path: &Path) -> PrepResult<lofty::file::TaggedFile> {
        Probe::open(path)
            .map_err(|e| probe_error(path, e))?
            .read()
            .map_err(|e| probe_error(path, e))
    }
}

impl MetadataProbe for LoftyProbe {
    fn probe(&self, path: &Path) -> PrepResult<BTreeMap<String, String>> {
        let tagged_file = self.read(path)?;
        let mut tags = BTreeMap::new();

        for tag in tagged_file.tags() {
            for item in tag.items() {
                if let ItemValue::Text(text) = item.value() {
                    tags.entry(item_name(item.key())).or_insert_with(|| text.clone());
                }
            }
        }

        tracing::debug!(file = %path.display(), tag_count = tags.len(), "Probed tags");
        Ok(tags)
    }

    fn measure(&self, path: &Path) -> PrepResult<Measurement> {
        let tagged_file = self.read(path)?;
        let properties = tagged_file.properties();

        let container = match tagged_file.file_type() {
            FileType::Mpeg => "MP3",
            FileType::Flac => "FLAC",
            FileType::Opus => "Opus",
            FileType::Vorbis => "OGG Vorbis",
            FileType::Aac => "AAC",
            FileType::Aiff => "AIFF",
            FileType::Wav => "WAV",
            FileType::WavPack => "WavPack",
            FileType::Mp4 => "MP4",
            _ => "Unknown",
        };

        let measurement = Measurement {
            container: container.to_string(),
            is_wav: tagged_file.file_type() == FileType::Wav,
            format: MeasuredFormat {
                sample_rate_hz: properties.sample_rate(),
                channel_count: properties.channels().map(u16::from),
                bits_per_sample: properties.bit_depth().map(u16::from),
            },
        };

        tracing::debug!(
            file = %path.display(),
            container = %measurement.container,
            sample_rate = ?measurement.format.sample_rate_hz,
            channels = ?measurement.format.channel_count,
            bits = ?measurement.format.bits_per_sample,
            "Measured audio properties"
        );

        Ok(measurement)
    }

    fn strip_tags(&self, path: &Path) -> PrepResult<usize> {
        let tagged_file = self.read(path)?;
        let tag_types: Vec<TagType> = tagged_file.tags().iter().map(|t| t.tag_type()).collect();

        for tag_type in &tag_types {
            tag_type
                .remove_from_path(path)
                .map_err(|e| probe_error(path, e))?;
        }

        if !tag_types.is_empty() {
            tracing::debug!(file = %path.display(), removed = tag_types.len(), "Stripped tags");
        }
        Ok(tag_types.len())
    }
}

fn item_name(key: &ItemKey) -> String {
    match key {
        ItemKey::Unknown(name) => name.clone(),
        other => format!("{:?}", other),
    }
}

fn probe_error(path: &Path, err: lofty::error::LoftyError) -> PrepError {
    PrepError::Probe {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
