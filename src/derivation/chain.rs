//! Ordered, idempotent application of the engine transforms to one region
//!
//! Later steps read columns written by earlier ones, so each step first makes
//! sure its inputs exist. A step whose output column is already present is
//! skipped, which lets a partially derived series (for example one loaded from
//! the cache) be enriched incrementally.

use crate::config::EngineConfig;
use crate::derivation::engine::{self, ZeroBlockPolicy};
use crate::derivation::CacheLevel;
use crate::error::{Result, SeriesError};
use crate::models::{Column, DerivedSeries, Metric};

/// Incidence is always reported over one week
pub const INCIDENCE_WINDOW: usize = 7;

/// Derivation steps parameterized by the engine configuration
#[derive(Debug, Clone)]
pub struct DerivationChain {
    rolling_window: usize,
    block_size: usize,
}

impl DerivationChain {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rolling_window: config.rolling_window,
            block_size: config.reproduction_block_size,
        }
    }

    pub fn rolling_window(&self) -> usize {
        self.rolling_window
    }

    /// Cumulative totals, percent deaths, per-million values and doubling time
    pub fn apply_mandatory(&self, series: &mut DerivedSeries) -> Result<()> {
        if !series.has(Column::CUMULATIVE_CASES) {
            let daily: Vec<u64> = series.records().iter().map(|r| r.daily_new_cases).collect();
            series.insert(Column::CUMULATIVE_CASES, as_f64(&engine::cumulative_sum(&daily)))?;
        } else {
            skipped(series, Column::CUMULATIVE_CASES);
        }

        if !series.has(Column::CUMULATIVE_DEATHS) {
            let daily: Vec<u64> = series.records().iter().map(|r| r.daily_new_deaths).collect();
            series.insert(Column::CUMULATIVE_DEATHS, as_f64(&engine::cumulative_sum(&daily)))?;
        } else {
            skipped(series, Column::CUMULATIVE_DEATHS);
        }

        if !series.has(Column::PERCENT_DEATHS) {
            let values = engine::percent_of_ratio(
                &required(series, Column::CUMULATIVE_DEATHS)?,
                &required(series, Column::CUMULATIVE_CASES)?,
            );
            series.insert(Column::PERCENT_DEATHS, values)?;
        } else {
            skipped(series, Column::PERCENT_DEATHS);
        }

        if !series.has(Column::CASES_PER_MILLION) || !series.has(Column::DEATHS_PER_MILLION) {
            let population = checked_population(series)?;

            if !series.has(Column::CASES_PER_MILLION) {
                let values = engine::per_million_population(
                    &required(series, Column::CUMULATIVE_CASES)?,
                    &population,
                );
                series.insert(Column::CASES_PER_MILLION, values)?;
            }

            if !series.has(Column::DEATHS_PER_MILLION) {
                let values = engine::per_million_population(
                    &required(series, Column::CUMULATIVE_DEATHS)?,
                    &population,
                );
                series.insert(Column::DEATHS_PER_MILLION, values)?;
            }
        } else {
            skipped(series, Column::CASES_PER_MILLION);
        }

        if !series.has(Column::DOUBLING_TIME) {
            let values = engine::doubling_time(&required(series, Column::CUMULATIVE_CASES)?);
            series.insert(Column::DOUBLING_TIME, values)?;
        } else {
            skipped(series, Column::DOUBLING_TIME);
        }

        Ok(())
    }

    /// Rolling average of any present column
    pub fn add_rolling_average(&self, series: &mut DerivedSeries, source: Metric, window: usize) -> Result<()> {
        if window == 0 {
            return Err(SeriesError::Validation(format!(
                "Rolling average window of {} must be at least one day",
                source
            )));
        }

        let column = Column::rolling(source, window);
        if series.has(column) {
            skipped(series, column);
            return Ok(());
        }

        let values = engine::rolling_average(&required(series, Column::Metric(source))?, window);
        series.insert(column, values)
    }

    /// Rolling averages of daily cases and deaths using the configured window
    pub fn add_daily_averages(&self, series: &mut DerivedSeries) -> Result<()> {
        self.add_rolling_average(series, Metric::DailyCases, self.rolling_window)?;
        self.add_rolling_average(series, Metric::DailyDeaths, self.rolling_window)
    }

    pub fn add_incidence(&self, series: &mut DerivedSeries) -> Result<()> {
        if series.has(Column::INCIDENCE) {
            skipped(series, Column::INCIDENCE);
            return Ok(());
        }

        let population = checked_population(series)?;
        let daily: Vec<u64> = series.records().iter().map(|r| r.daily_new_cases).collect();
        let values = engine::incidence_per_100k(&daily, &population, INCIDENCE_WINDOW);
        series.insert(Column::INCIDENCE, values)
    }

    pub fn add_reproduction(&self, series: &mut DerivedSeries, policy: ZeroBlockPolicy) -> Result<()> {
        if series.has(Column::REPRODUCTION) {
            skipped(series, Column::REPRODUCTION);
            return Ok(());
        }

        let daily: Vec<u64> = series.records().iter().map(|r| r.daily_new_cases).collect();
        let values = engine::reproduction_estimate(&daily, self.block_size, policy);
        series.insert(Column::REPRODUCTION, values)
    }

    /// Rolling average of the reproduction estimate, deriving the estimate first if needed
    pub fn add_smoothed_reproduction(&self, series: &mut DerivedSeries, policy: ZeroBlockPolicy) -> Result<()> {
        self.add_reproduction(series, policy)?;
        self.add_rolling_average(series, Metric::R, self.rolling_window)
    }

    /// Climb the ladder up to `level`
    pub fn derive_to_level(&self, series: &mut DerivedSeries, level: CacheLevel, policy: ZeroBlockPolicy) -> Result<()> {
        if level >= CacheLevel::Mandatory {
            self.apply_mandatory(series)?;
        }
        if level >= CacheLevel::Averages {
            self.add_daily_averages(series)?;
            self.add_incidence(series)?;
        }
        if level >= CacheLevel::Reproduction {
            self.add_reproduction(series, policy)?;
        }
        if level >= CacheLevel::SmoothedReproduction {
            self.add_smoothed_reproduction(series, policy)?;
        }
        Ok(())
    }

    /// Columns present after climbing to `level`
    pub fn columns_for_level(&self, level: CacheLevel) -> Vec<Column> {
        let mut columns = Vec::new();
        if level >= CacheLevel::Mandatory {
            columns.extend([
                Column::CUMULATIVE_CASES,
                Column::CUMULATIVE_DEATHS,
                Column::PERCENT_DEATHS,
                Column::CASES_PER_MILLION,
                Column::DEATHS_PER_MILLION,
                Column::DOUBLING_TIME,
            ]);
        }
        if level >= CacheLevel::Averages {
            columns.extend([
                Column::rolling(Metric::DailyCases, self.rolling_window),
                Column::rolling(Metric::DailyDeaths, self.rolling_window),
                Column::INCIDENCE,
            ]);
        }
        if level >= CacheLevel::Reproduction {
            columns.push(Column::REPRODUCTION);
        }
        if level >= CacheLevel::SmoothedReproduction {
            columns.push(Column::rolling(Metric::R, self.rolling_window));
        }
        columns
    }
}

fn as_f64(values: &[u64]) -> Vec<f64> {
    values.iter().map(|v| *v as f64).collect()
}

fn required(series: &DerivedSeries, column: Column) -> Result<Vec<f64>> {
    series
        .values(column)
        .map(|v| v.into_owned())
        .ok_or_else(|| {
            SeriesError::Validation(format!(
                "Column {} has not been derived for region {}",
                column,
                series.id()
            ))
        })
}

/// Every normalized metric depends on a positive population
fn checked_population(series: &DerivedSeries) -> Result<Vec<u64>> {
    series
        .records()
        .iter()
        .map(|r| {
            if r.population == 0 {
                Err(SeriesError::InvalidPopulation {
                    region: series.id().to_string(),
                    date: r.date,
                    population: r.population,
                })
            } else {
                Ok(r.population)
            }
        })
        .collect()
}

fn skipped(series: &DerivedSeries, column: Column) {
    tracing::debug!(region = %series.id(), column = %column, "Column already present, skipping");
}
