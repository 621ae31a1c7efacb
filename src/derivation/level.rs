use crate::error::SeriesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far the derivation ladder has been climbed
///
/// Every level extends the columns of the level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CacheLevel {
    /// Nothing derived, caching disabled
    None = 0,
    /// Cumulative totals, percentages, per-million values and doubling time
    Mandatory = 1,
    /// Level 1 plus rolling averages of daily cases/deaths and the incidence
    Averages = 2,
    /// Level 2 plus the reproduction estimate
    Reproduction = 3,
    /// Level 3 plus the smoothed reproduction estimate
    SmoothedReproduction = 4,
}

impl CacheLevel {
    pub const ALL: [CacheLevel; 5] = [
        CacheLevel::None,
        CacheLevel::Mandatory,
        CacheLevel::Averages,
        CacheLevel::Reproduction,
        CacheLevel::SmoothedReproduction,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// This level and every level above it
    pub fn at_least(self) -> impl Iterator<Item = CacheLevel> {
        CacheLevel::ALL.into_iter().filter(move |l| *l >= self)
    }

    /// Levels below this one, highest first
    pub fn below(self) -> impl Iterator<Item = CacheLevel> {
        CacheLevel::ALL.into_iter().rev().filter(move |l| *l < self)
    }
}

impl TryFrom<u8> for CacheLevel {
    type Error = SeriesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CacheLevel::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| SeriesError::Validation(format!("Cache level must be 0-4, got {}", value)))
    }
}

impl From<CacheLevel> for u8 {
    fn from(level: CacheLevel) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for CacheLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.as_u8())
    }
}
