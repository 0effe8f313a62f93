//! Prefix allocation
//!
//! Assigns each pending asset the lowest free prefix at or after a batch-wide
//! cursor, after checking that no file with the same base name already sits in
//! the target folder under another prefix.
//!
//! **Algorithm (per asset, one batch against one interval):**
//! 1. The cursor starts at the interval's low bound when the allocator is
//!    created and is never reset for the rest of the batch
//! 2. Duplicate check: any placed entry with the same base name (exact,
//!    case-sensitive) yields `DuplicateConflict`; no slot is consumed
//! 3. Slot search: skip prefixes occupied in the supplied directory state;
//!    past the high bound the allocator is `Exhausted` for good
//! 4. A free slot is returned as `Assign` and the cursor moves past it, so
//!    later assets never reuse a slot claimed earlier in the batch even
//!    before that claim is written
//!
//! The caller commits each assignment and rescans the target folder before
//! asking for the next asset, so earlier placements are visible to later
//! duplicate checks.

use sbprep_common::ClosedInterval;

use crate::models::{DirectoryState, PendingAsset, PlacedEntry};

/// Allocation outcome for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixDecision {
    /// Free prefix claimed for the asset
    Assign(u16),
    /// Same base name already placed; a resolution decision is required
    DuplicateConflict {
        /// Every entry with the asset's base name, lowest prefix first
        existing: Vec<PlacedEntry>,
    },
    /// No free prefix remains in the interval for this batch
    Exhausted,
}

/// Batch-scoped allocator over one interval
#[derive(Debug, Clone)]
pub struct PrefixAllocator {
    interval: ClosedInterval,
    cursor: u16,
}

impl PrefixAllocator {
    /// Start a batch; the cursor begins at the interval's low bound
    pub fn new(interval: ClosedInterval) -> Self {
        Self {
            interval,
            cursor: interval.low(),
        }
    }

    pub fn interval(&self) -> ClosedInterval {
        self.interval
    }

    /// Next prefix the slot search will consider
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor > self.interval.high()
    }

    /// Decide the prefix for `asset` against a fresh directory scan
    pub fn allocate(&mut self, asset: &PendingAsset, state: &DirectoryState) -> PrefixDecision {
        if self.is_exhausted() {
            return PrefixDecision::Exhausted;
        }

        let existing: Vec<PlacedEntry> = state
            .with_base_name(&asset.base_name)
            .into_iter()
            .cloned()
            .collect();
        if !existing.is_empty() {
            tracing::info!(
                base_name = %asset.base_name,
                prefixes = ?existing.iter().map(|e| e.prefix).collect::<Vec<_>>(),
                "Base name already placed"
            );
            return PrefixDecision::DuplicateConflict { existing };
        }

        self.claim_slot(state)
    }

    /// Slot search only, without the duplicate check
    ///
    /// Used once a duplicate conflict has been resolved in favour of placing
    /// the asset anyway.
    pub fn claim_slot(&mut self, state: &DirectoryState) -> PrefixDecision {
        self.claim_slot_vacating(state, &[])
    }

    /// Slot search treating `vacated` entries as already removed
    ///
    /// Lets a Replace resolution find its slot before anything is deleted,
    /// so an exhausted interval never costs the operator the existing file.
    pub fn claim_slot_vacating(
        &mut self,
        state: &DirectoryState,
        vacated: &[PlacedEntry],
    ) -> PrefixDecision {
        let occupied = |prefix: u16| {
            state
                .entries()
                .iter()
                .filter(|e| e.prefix == prefix)
                .any(|e| !vacated.contains(e))
        };

        let mut candidate = self.cursor;
        while candidate <= self.interval.high() {
            if !occupied(candidate) {
                self.cursor = candidate + 1;
                tracing::debug!(prefix = candidate, "Assigned prefix");
                return PrefixDecision::Assign(candidate);
            }
            candidate += 1;
        }

        self.cursor = candidate;
        tracing::warn!(interval = %self.interval, "Prefix interval exhausted");
        PrefixDecision::Exhausted
    }
}
