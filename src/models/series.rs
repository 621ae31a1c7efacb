use crate::error::{Result, SeriesError};
use crate::models::{Column, DailyRecord, DerivedRecord, Metric};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;

/// Identity of a region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Stable short code such as an ISO 3166 alpha-2 id
    pub id: String,
    pub name: String,
    pub continent: Option<String>,
}

impl RegionInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, continent: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            continent,
        }
    }
}

/// One region's daily records in ascending date order
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    info: RegionInfo,
    population: u64,
    records: Vec<DailyRecord>,
}

impl RegionSeries {
    /// Sort records chronologically and reject repeated dates
    ///
    /// Missing days are not synthesized. The region population is taken from
    /// the most recent record.
    pub fn new(info: RegionInfo, mut records: Vec<DailyRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.date);

        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeriesError::DuplicateDate {
                region: info.id.clone(),
                date: pair[0].date,
            });
        }

        let population = records.last().map(|r| r.population).unwrap_or_default();

        Ok(Self {
            info,
            population,
            records,
        })
    }

    pub fn info(&self) -> &RegionInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A region series together with the columns derived from it so far
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    series: RegionSeries,
    columns: BTreeMap<Column, Vec<f64>>,
}

impl From<RegionSeries> for DerivedSeries {
    fn from(series: RegionSeries) -> Self {
        Self {
            series,
            columns: BTreeMap::new(),
        }
    }
}

impl DerivedSeries {
    pub fn series(&self) -> &RegionSeries {
        &self.series
    }

    pub fn info(&self) -> &RegionInfo {
        self.series.info()
    }

    pub fn id(&self) -> &str {
        self.series.id()
    }

    pub fn records(&self) -> &[DailyRecord] {
        self.series.records()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn has(&self, column: Column) -> bool {
        column.is_raw() || self.columns.contains_key(&column)
    }

    /// Derived columns present, in stable order
    pub fn derived_columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.keys().copied()
    }

    /// Values of a column, computed on the fly for raw metrics
    pub fn values(&self, column: Column) -> Option<Cow<'_, [f64]>> {
        match column {
            Column::Metric(Metric::DailyCases) => Some(Cow::Owned(
                self.records().iter().map(|r| r.daily_new_cases as f64).collect(),
            )),
            Column::Metric(Metric::DailyDeaths) => Some(Cow::Owned(
                self.records().iter().map(|r| r.daily_new_deaths as f64).collect(),
            )),
            other => self.columns.get(&other).map(|v| Cow::Borrowed(v.as_slice())),
        }
    }

    pub fn value(&self, column: Column, index: usize) -> Option<f64> {
        self.values(column).and_then(|v| v.get(index).copied())
    }

    /// Store a column, replacing any previous values
    pub fn insert(&mut self, column: Column, values: Vec<f64>) -> Result<()> {
        if column.is_raw() {
            return Err(SeriesError::Validation(format!(
                "Column {} is read from the records and cannot be stored",
                column
            )));
        }
        if values.len() != self.len() {
            return Err(SeriesError::Validation(format!(
                "Column {} of region {} has {} values, expected {}",
                column,
                self.id(),
                values.len(),
                self.len()
            )));
        }
        // undefined values are stored as the canonical NaN
        let values = values
            .into_iter()
            .map(|v| if v.is_nan() { f64::NAN } else { v })
            .collect();
        self.columns.insert(column, values);
        Ok(())
    }

    /// Keep only the records (and column values) within `range`
    pub fn slice(&self, range: Range<usize>) -> DerivedSeries {
        let records = self.series.records[range.clone()].to_vec();
        let columns = self
            .columns
            .iter()
            .map(|(column, values)| (*column, values[range.clone()].to_vec()))
            .collect();

        DerivedSeries {
            series: RegionSeries {
                info: self.series.info.clone(),
                population: self.series.population,
                records,
            },
            columns,
        }
    }

    /// Row view of one day
    ///
    /// The averaged case and death fields are read from the `average_window`
    /// columns, the smoothed reproduction estimate from `reproduction_window`.
    pub fn row_with_windows(&self, index: usize, average_window: usize, reproduction_window: usize) -> Option<DerivedRecord> {
        let record = *self.records().get(index)?;
        let get = |column: Column| self.value(column, index).unwrap_or(f64::NAN);

        Some(DerivedRecord {
            record,
            cumulative_cases: get(Column::CUMULATIVE_CASES),
            cumulative_deaths: get(Column::CUMULATIVE_DEATHS),
            percent_deaths: get(Column::PERCENT_DEATHS),
            cases_per_million_pop: get(Column::CASES_PER_MILLION),
            deaths_per_million_pop: get(Column::DEATHS_PER_MILLION),
            doubling_time_days: get(Column::DOUBLING_TIME),
            incidence_7d_per_100k: get(Column::INCIDENCE),
            rolling_average_cases: get(Column::rolling(Metric::DailyCases, average_window)),
            rolling_average_deaths: get(Column::rolling(Metric::DailyDeaths, average_window)),
            reproduction_estimate: get(Column::REPRODUCTION),
            rolling_average_reproduction: get(Column::rolling(Metric::R, reproduction_window)),
        })
    }

    /// Equality that treats two `NaN`s with the same bit pattern as equal
    pub fn bit_identical(&self, other: &DerivedSeries) -> bool {
        self.series == other.series
            && self.columns.len() == other.columns.len()
            && self.columns.iter().zip(other.columns.iter()).all(|((ca, va), (cb, vb))| {
                ca == cb
                    && va.len() == vb.len()
                    && va.iter().zip(vb).all(|(a, b)| a.to_bits() == b.to_bits())
            })
    }
}
