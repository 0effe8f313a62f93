//! Category range table
//!
//! Maps each (sound category, collection variant) pair to the closed interval
//! of numeric prefixes reserved for it in the target directory. Intervals never
//! overlap, so a prefix alone identifies the category that owns it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Functional class of a sound on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Kickout,
    Rollover,
    Tilt,
    Music,
}

impl SoundCategory {
    pub const ALL: [SoundCategory; 4] = [
        SoundCategory::Kickout,
        SoundCategory::Rollover,
        SoundCategory::Tilt,
        SoundCategory::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCategory::Kickout => "kickout",
            SoundCategory::Rollover => "rollover",
            SoundCategory::Tilt => "tilt",
            SoundCategory::Music => "music",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        SoundCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

/// Sub-collection within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Primary,
    Alternate,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Primary, Variant::Alternate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Primary => "primary",
            Variant::Alternate => "alternate",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownCategory(format!("variant '{}'", s)))
    }
}

/// Inclusive prefix interval `[low, high]`
///
/// Bounds are positive and at most [`ClosedInterval::MAX_PREFIX`] so every
/// member renders as a 3-digit prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClosedInterval {
    low: u16,
    high: u16,
}

impl ClosedInterval {
    /// Largest prefix representable in three digits
    pub const MAX_PREFIX: u16 = 999;

    /// Build a validated interval
    ///
    /// Takes signed bounds so operator input can be checked before any
    /// conversion: both bounds must be positive, `low <= high`, and
    /// `high <= 999`.
    pub fn new(low: i64, high: i64) -> Result<Self> {
        if low < 1 || high < 1 {
            return Err(Error::MalformedInterval(format!(
                "bounds must be positive integers (got {}..{})",
                low, high
            )));
        }
        if low > high {
            return Err(Error::MalformedInterval(format!(
                "low bound {} exceeds high bound {}",
                low, high
            )));
        }
        if high > i64::from(Self::MAX_PREFIX) {
            return Err(Error::MalformedInterval(format!(
                "high bound {} does not fit a 3-digit prefix (max {})",
                high,
                Self::MAX_PREFIX
            )));
        }

        Ok(Self {
            low: low as u16,
            high: high as u16,
        })
    }

    pub fn low(&self) -> u16 {
        self.low
    }

    pub fn high(&self) -> u16 {
        self.high
    }

    /// Distance between the bounds (`high - low`)
    pub fn width(&self) -> u16 {
        self.high - self.low
    }

    /// Number of prefixes in the interval
    pub fn len(&self) -> usize {
        usize::from(self.width()) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, prefix: u16) -> bool {
        (self.low..=self.high).contains(&prefix)
    }

    pub fn overlaps(&self, other: &ClosedInterval) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    pub fn prefixes(&self) -> RangeInclusive<u16> {
        self.low..=self.high
    }
}

impl fmt::Display for ClosedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:03}, {:03}]", self.low, self.high)
    }
}

/// Parses `"low-high"`, e.g. `"300-399"`
impl FromStr for ClosedInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedInterval(format!("expected LOW-HIGH, got '{}'", s));

        let (low, high) = s.trim().split_once('-').ok_or_else(malformed)?;
        let low: i64 = low.trim().parse().map_err(|_| malformed())?;
        let high: i64 = high.trim().parse().map_err(|_| malformed())?;

        ClosedInterval::new(low, high)
    }
}

/// One row of a range table as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub category: SoundCategory,
    pub variant: Variant,
    pub low: i64,
    pub high: i64,
}

/// Canonical board layout
const CANONICAL: [(SoundCategory, Variant, u16, u16); 8] = [
    (SoundCategory::Kickout, Variant::Primary, 21, 29),
    (SoundCategory::Kickout, Variant::Alternate, 31, 39),
    (SoundCategory::Rollover, Variant::Primary, 41, 49),
    (SoundCategory::Rollover, Variant::Alternate, 51, 59),
    (SoundCategory::Tilt, Variant::Primary, 61, 69),
    (SoundCategory::Tilt, Variant::Alternate, 71, 79),
    (SoundCategory::Music, Variant::Primary, 101, 199),
    (SoundCategory::Music, Variant::Alternate, 201, 299),
];

/// Immutable mapping from (category, variant) to prefix interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTable {
    entries: BTreeMap<(SoundCategory, Variant), ClosedInterval>,
}

impl RangeTable {
    /// Widest allowed `high - low` for a single entry
    pub const MAX_WIDTH: u16 = 99;

    /// The eight fixed intervals of the board layout
    pub fn canonical() -> Self {
        let entries = CANONICAL
            .iter()
            .map(|&(category, variant, low, high)| {
                ((category, variant), ClosedInterval { low, high })
            })
            .collect();
        Self { entries }
    }

    /// Build a custom table, replacing the canonical one entirely
    ///
    /// Every entry must be well-formed, no wider than [`Self::MAX_WIDTH`],
    /// listed once, and disjoint from every other entry.
    pub fn from_entries(rows: &[RangeEntry]) -> Result<Self> {
        let mut entries: BTreeMap<(SoundCategory, Variant), ClosedInterval> = BTreeMap::new();

        for row in rows {
            let interval = ClosedInterval::new(row.low, row.high).map_err(|e| {
                Error::Config(format!("range {}/{}: {}", row.category, row.variant, e))
            })?;

            if interval.width() > Self::MAX_WIDTH {
                return Err(Error::Config(format!(
                    "range {}/{} {} is wider than {}",
                    row.category,
                    row.variant,
                    interval,
                    Self::MAX_WIDTH
                )));
            }

            if let Some(((category, variant), other)) =
                entries.iter().find(|(_, other)| other.overlaps(&interval))
            {
                return Err(Error::Config(format!(
                    "range {}/{} {} overlaps {}/{} {}",
                    row.category, row.variant, interval, category, variant, other
                )));
            }

            if entries.insert((row.category, row.variant), interval).is_some() {
                return Err(Error::Config(format!(
                    "range {}/{} listed more than once",
                    row.category, row.variant
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Look up the interval reserved for a category and variant
    pub fn range_for(&self, category: SoundCategory, variant: Variant) -> Result<ClosedInterval> {
        self.entries
            .get(&(category, variant))
            .copied()
            .ok_or_else(|| Error::UnknownCategory(format!("{}/{}", category, variant)))
    }

    /// Which category and variant own a prefix, if any
    pub fn owner_of(&self, prefix: u16) -> Option<(SoundCategory, Variant)> {
        self.entries
            .iter()
            .find(|(_, interval)| interval.contains(prefix))
            .map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SoundCategory, Variant, ClosedInterval)> + '_ {
        self.entries
            .iter()
            .map(|(&(category, variant), &interval)| (category, variant, interval))
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::canonical()
    }
}

/// How the operator picked the interval for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSelection {
    /// Predefined category and variant from the table
    Category {
        category: SoundCategory,
        variant: Variant,
    },
    /// Arbitrary interval for assets that fit no category (validated on resolve)
    Manual { low: i64, high: i64 },
}

impl RangeSelection {
    /// Resolve to a single interval, failing before any I/O happens
    pub fn resolve(&self, table: &RangeTable) -> Result<ClosedInterval> {
        match *self {
            RangeSelection::Category { category, variant } => table.range_for(category, variant),
            RangeSelection::Manual { low, high } => ClosedInterval::new(low, high),
        }
    }
}

impl fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSelection::Category { category, variant } => write!(f, "{}/{}", category, variant),
            RangeSelection::Manual { low, high } => write!(f, "manual {}-{}", low, high),
        }
    }
}
