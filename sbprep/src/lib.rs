//! sbprep library interface
//!
//! Prepares audio assets for a pinball sound-trigger board: converts sources
//! to the board's PCM profile, strips metadata, and places each file in the
//! board folder under a 3-digit prefix taken from the category's interval.
//!
//! Exposes the services for the CLI and for integration testing.

pub mod decision;
pub mod error;
pub mod models;
pub mod services;

pub use crate::decision::{DuplicateResolver, FixedPolicy, PromptResolver, Resolution};
pub use crate::error::{PrepError, PrepResult};
pub use crate::models::{BatchReport, DirectoryState, PendingAsset, PlacedEntry};
pub use crate::services::{BatchRunner, BatchSettings, PrefixAllocator, PrefixDecision};
