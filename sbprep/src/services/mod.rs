//! Service modules for the placement workflow
//!
//! Leaf services (normalizer, validator, probe, converter, scanners, writer)
//! know nothing of each other; [`batch_runner`] composes them.

pub mod batch_runner;
pub mod conversion_gateway;
pub mod format_validator;
pub mod metadata_probe;
pub mod name_normalizer;
pub mod prefix_allocator;
pub mod source_scanner;
pub mod target_scanner;
pub mod target_writer;

pub use batch_runner::{BatchRunner, BatchSettings};
pub use conversion_gateway::{ConversionGateway, FfmpegGateway};
pub use format_validator::{FormatValidator, MeasuredFormat, Mismatch, Validation};
pub use metadata_probe::{LoftyProbe, Measurement, MetadataProbe};
pub use prefix_allocator::{PrefixAllocator, PrefixDecision};
pub use source_scanner::{ScanError, SourceScanner};
pub use target_scanner::TargetScanner;
pub use target_writer::{SetAside, TargetWriter};
