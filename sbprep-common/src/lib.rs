//! # sbprep Common Library
//!
//! Shared code for the sound-board preparation tools including:
//! - Error and result types
//! - Configuration loading (TOML file + environment overrides)
//! - The fixed PCM target profile
//! - Category range table and prefix intervals

pub mod config;
pub mod error;
pub mod profile;
pub mod ranges;

pub use error::{Error, Result};
pub use profile::TargetProfile;
pub use ranges::{ClosedInterval, RangeTable, SoundCategory, Variant};
