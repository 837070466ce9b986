//! Skip reasons and their tallies
use std::collections::HashMap;
use std::fmt;

/// Why a candidate image was not downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// URL extension or content-type is in the excluded set (webp by default)
    ExcludedFormat,

    /// Staged payload is smaller than the minimum byte size
    TooSmallSize,

    /// Decoded width or height is below the minimum
    TooSmallDimensions,

    /// Leading bytes match an image accepted earlier in this run
    Duplicate,

    /// The destination file is already present
    AlreadyExists,
}

impl SkipReason {
    /// Stable lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExcludedFormat => "excluded_format",
            Self::TooSmallSize => "too_small_size",
            Self::TooSmallDimensions => "too_small_dimensions",
            Self::Duplicate => "duplicate",
            Self::AlreadyExists => "already_exists",
        }
    }

    /// Human-readable label for the summary table
    pub fn describe(&self) -> &'static str {
        match self {
            Self::ExcludedFormat => "Excluded format",
            Self::TooSmallSize => "Too small (size)",
            Self::TooSmallDimensions => "Too small (dimensions)",
            Self::Duplicate => "Duplicates",
            Self::AlreadyExists => "Already exists",
        }
    }

    /// All reasons in filter-stage order
    pub fn all() -> [SkipReason; 5] {
        [
            Self::ExcludedFormat,
            Self::TooSmallSize,
            Self::TooSmallDimensions,
            Self::Duplicate,
            Self::AlreadyExists,
        ]
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-reason skip counters
///
/// Counters only ever grow during a run; the report reads them at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipStats {
    counts: HashMap<SkipReason, u64>,
}

impl SkipStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one skip for the given reason
    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    /// Number of skips recorded for a reason
    pub fn count(&self, reason: SkipReason) -> u64 {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    /// Total skips across all reasons
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Non-zero counters in filter-stage order
    pub fn non_zero(&self) -> Vec<(SkipReason, u64)> {
        SkipReason::all()
            .into_iter()
            .map(|reason| (reason, self.count(reason)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
