use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of one region as published by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub daily_new_cases: u64,
    pub daily_new_deaths: u64,
    pub population: u64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, daily_new_cases: u64, daily_new_deaths: u64, population: u64) -> Self {
        Self {
            date,
            daily_new_cases,
            daily_new_deaths,
            population,
        }
    }
}

/// A row of the normalized raw table, one per region per day in arbitrary order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: NaiveDate,
    pub geo_id: String,
    pub geo_name: String,
    pub population: u64,
    pub continent: Option<String>,
    pub daily_cases: u64,
    pub daily_deaths: u64,
}

impl RawRow {
    pub fn record(&self) -> DailyRecord {
        DailyRecord::new(self.date, self.daily_cases, self.daily_deaths, self.population)
    }
}

/// A derived view of one day
///
/// Every computed field is `NaN` until the step producing it has run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: DailyRecord,
    pub cumulative_cases: f64,
    pub cumulative_deaths: f64,
    pub percent_deaths: f64,
    pub cases_per_million_pop: f64,
    pub deaths_per_million_pop: f64,
    pub doubling_time_days: f64,
    pub incidence_7d_per_100k: f64,
    pub rolling_average_cases: f64,
    pub rolling_average_deaths: f64,
    pub reproduction_estimate: f64,
    pub rolling_average_reproduction: f64,
}
