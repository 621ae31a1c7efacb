use crate::derivation::CacheLevel;
use chrono::NaiveDate;
use std::fmt;

const SUFFIX: &str = "-cache.csv";

/// Identity of a cache entry: generation date, source and enrichment level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub generated: NaiveDate,
    pub source: String,
    pub level: CacheLevel,
}

impl CacheKey {
    pub fn new(generated: NaiveDate, source: impl Into<String>, level: CacheLevel) -> Self {
        Self {
            generated,
            source: source.into(),
            level,
        }
    }

    pub fn with_level(&self, level: CacheLevel) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    /// `2021-01-31-WHO-L2-cache.csv`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}{}",
            self.generated.format("%Y-%m-%d"),
            self.source,
            self.level,
            SUFFIX
        )
    }

    /// Inverse of [`CacheKey::file_name`]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(SUFFIX)?;
        if stem.len() < 12 || !stem.is_char_boundary(10) {
            return None;
        }
        let (date, rest) = stem.split_at(10);
        let generated = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let (source, level) = rest.strip_prefix('-')?.rsplit_once("-L")?;
        let level = CacheLevel::try_from(level.parse::<u8>().ok()?).ok()?;

        if source.is_empty() {
            return None;
        }

        Some(Self::new(generated, source, level))
    }

    /// Whole days between generation and `as_of`
    pub fn age_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.generated).num_days()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.generated, self.source, self.level)
    }
}
