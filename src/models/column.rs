//! Typed identifiers for the columns of a derived series

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

/// A single per-day quantity of a region series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
pub enum Metric {
    DailyCases,
    DailyDeaths,
    CumulativeCases,
    CumulativeDeaths,
    PercentDeaths,
    CasesPerMillionPopulation,
    DeathsPerMillionPopulation,
    DoublingTime,
    #[strum(serialize = "Incidence7DayPer100K")]
    Incidence7DayPer100K,
    R,
    /// Days since the since-N-cases threshold was reached
    Index,
}

impl Metric {
    /// Whether the metric is read straight from the ingested records
    pub fn is_raw(&self) -> bool {
        matches!(self, Metric::DailyCases | Metric::DailyDeaths)
    }
}

/// Column of a derived series: a metric, or a rolling average over one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Metric(Metric),
    RollingAverage { source: Metric, window: usize },
}

impl Column {
    pub const CUMULATIVE_CASES: Column = Column::Metric(Metric::CumulativeCases);
    pub const CUMULATIVE_DEATHS: Column = Column::Metric(Metric::CumulativeDeaths);
    pub const PERCENT_DEATHS: Column = Column::Metric(Metric::PercentDeaths);
    pub const CASES_PER_MILLION: Column = Column::Metric(Metric::CasesPerMillionPopulation);
    pub const DEATHS_PER_MILLION: Column = Column::Metric(Metric::DeathsPerMillionPopulation);
    pub const DOUBLING_TIME: Column = Column::Metric(Metric::DoublingTime);
    pub const INCIDENCE: Column = Column::Metric(Metric::Incidence7DayPer100K);
    pub const REPRODUCTION: Column = Column::Metric(Metric::R);
    pub const INDEX: Column = Column::Metric(Metric::Index);

    pub fn rolling(source: Metric, window: usize) -> Self {
        Column::RollingAverage { source, window }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Column::Metric(m) if m.is_raw())
    }
}

impl From<Metric> for Column {
    fn from(metric: Metric) -> Self {
        Column::Metric(metric)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Metric(metric) => write!(f, "{}", metric),
            // DailyCases7, R7, ...
            Column::RollingAverage { source, window } => write!(f, "{}{}", source, window),
        }
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(metric) = Metric::from_str(s) {
            return Ok(Column::Metric(metric));
        }

        let split = s
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)
            .ok_or_else(|| format!("Unknown column: {}", s))?;

        let (name, digits) = s.split_at(split);
        let source = Metric::from_str(name).map_err(|_| format!("Unknown column: {}", s))?;
        let window = digits
            .parse::<usize>()
            .map_err(|e| format!("Invalid window in column {}: {}", s, e))?;

        if window == 0 {
            return Err(format!("Invalid window in column {}: 0", s));
        }

        Ok(Column::RollingAverage { source, window })
    }
}
