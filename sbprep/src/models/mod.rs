//! Data models for the placement workflow

pub mod asset;
pub mod batch_report;

pub use asset::{DirectoryState, PendingAsset, PlacedEntry};
pub use batch_report::{AssetFailure, BatchReport, Placement, SkippedAsset};
