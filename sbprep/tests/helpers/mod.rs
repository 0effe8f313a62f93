//! Test Helper Utilities
//!
//! Shared utilities for testing sbprep

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_converter;
pub mod unstrippable_tags;

// Re-export commonly used items
pub use audio_generator::{generate_test_wav, AudioConfig};
pub use fake_converter::FakeConverter;
pub use unstrippable_tags::UnstrippableTags;
