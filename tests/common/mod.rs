//! Builders shared by the integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use covid_series::{
    config::EngineConfig,
    models::RawRow,
    repository::SeriesRepository,
    sources::WhoSource,
};
use std::sync::Arc;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
}

/// Raw rows of one region, one per entry of `daily_cases`, starting at [`start_date`]
pub fn region_rows(id: &str, name: &str, population: u64, daily_cases: &[u64], daily_deaths: &[u64]) -> Vec<RawRow> {
    daily_cases
        .iter()
        .enumerate()
        .map(|(i, cases)| RawRow {
            date: start_date() + Duration::days(i as i64),
            geo_id: id.to_string(),
            geo_name: name.to_string(),
            population,
            continent: Some("Europe".to_string()),
            daily_cases: *cases,
            daily_deaths: daily_deaths.get(i).copied().unwrap_or(0),
        })
        .collect()
}

/// Germany and the United Kingdom over 30 days plus a region that stays below 100 cases
pub fn sample_rows() -> Vec<RawRow> {
    let de_cases: Vec<u64> = (0..30).map(|i| if i < 5 { 0 } else { 10 + i * 3 }).collect();
    let de_deaths: Vec<u64> = (0..30).map(|i| if i < 10 { 0 } else { i / 5 }).collect();
    let gb_cases: Vec<u64> = (0..30).map(|i| 20 + (i % 7) * 4).collect();
    let is_cases: Vec<u64> = vec![1; 30];

    let mut rows = region_rows("DE", "Germany", 83_000_000, &de_cases, &de_deaths);
    rows.extend(region_rows("GB", "United Kingdom", 67_000_000, &gb_cases, &[]));
    rows.extend(region_rows("IS", "Iceland", 360_000, &is_cases, &[]));
    rows
}

pub fn engine_config(parallel_min_regions: usize) -> EngineConfig {
    EngineConfig {
        parallel_min_regions,
        ..EngineConfig::default()
    }
}

pub fn sample_repository() -> SeriesRepository {
    SeriesRepository::from_rows(sample_rows(), Arc::new(WhoSource), &EngineConfig::default()).unwrap()
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
