mod common;

use common::{engine_config, ids, sample_repository, sample_rows, start_date};
use chrono::Duration;
use covid_series::{
    derivation::{CacheLevel, ZeroBlockPolicy},
    error::SeriesError,
    models::{Column, Metric},
    repository::SeriesRepository,
    sources::{parse_raw_table, WhoSource},
};
use std::io::Cursor;
use std::sync::Arc;

#[test]
fn test_both_window_arguments_rejected() {
    let repo = sample_repository();

    for (last, since) in [(1, 1), (7, 100), (30, 5)] {
        let result = repo.get_by_region_ids(&ids(&["DE"]), last, since);
        assert!(matches!(
            result,
            Err(SeriesError::InvalidParameterCombination { .. })
        ));
    }

    // Checked before the ids are looked up
    let result = repo.get_by_region_ids(&ids(&["ZZ"]), 7, 100);
    assert!(matches!(
        result,
        Err(SeriesError::InvalidParameterCombination { .. })
    ));
}

#[test]
fn test_request_order_and_aliases() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["UK", "DE"]), 0, 0).unwrap();

    assert_eq!(dataset.region_ids(), vec!["GB", "DE"]);
    assert_eq!(dataset.total_rows(), 60);
    assert_eq!(repo.review_region_id_list(&ids(&["EL", "UK", "FR"])), ids(&["GR", "GB", "FR"]));
}

#[test]
fn test_unknown_region_after_alias_correction() {
    let repo = sample_repository();
    let result = repo.get_by_region_ids(&ids(&["DE", "EL"]), 0, 0);
    assert!(matches!(result, Err(SeriesError::RegionNotFound(id)) if id == "GR"));
}

#[test]
fn test_last_days_keeps_full_history_totals() {
    let repo = sample_repository();
    let full = repo.get_by_region_ids(&ids(&["DE"]), 0, 0).unwrap();
    let tail = repo.get_by_region_ids(&ids(&["DE"]), 7, 0).unwrap();

    let full = full.get("DE").unwrap();
    let tail = tail.get("DE").unwrap();
    assert_eq!(tail.len(), 7);
    assert_eq!(tail.records()[6].date, start_date() + Duration::days(29));
    assert_eq!(
        tail.values(Column::CUMULATIVE_CASES).unwrap().as_ref(),
        &full.values(Column::CUMULATIVE_CASES).unwrap()[23..]
    );
}

#[test]
fn test_since_cases_window() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["DE"]), 0, 100).unwrap();
    let de = dataset.get("DE").unwrap();

    // 25 + 28 + 31 + 34 = 118 on the ninth day
    assert_eq!(de.len(), 22);
    assert_eq!(de.records()[0].date, start_date() + Duration::days(8));
    assert_eq!(de.value(Column::CUMULATIVE_CASES, 0), Some(118.0));
    assert_eq!(de.value(Column::INDEX, 0), Some(0.0));
    assert_eq!(de.value(Column::INDEX, 21), Some(21.0));
}

#[test]
fn test_threshold_never_reached_fails_whole_request() {
    let repo = sample_repository();
    let result = repo.get_by_region_ids(&ids(&["DE", "IS", "GB"]), 0, 100);

    assert!(matches!(
        result,
        Err(SeriesError::ThresholdNeverReached { region, threshold: 100 }) if region == "IS"
    ));
}

#[test]
fn test_enrichment_is_idempotent() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["DE", "GB"]), 0, 0).unwrap();

    let once = repo.add_rolling_average(dataset, Metric::DailyCases, 7).unwrap();
    let once = repo.add_reproduction_estimate(once, ZeroBlockPolicy::Nan).unwrap();
    let once = repo.add_incidence(once).unwrap();

    let twice = repo.add_rolling_average(once.clone(), Metric::DailyCases, 7).unwrap();
    let twice = repo.add_reproduction_estimate(twice, ZeroBlockPolicy::Zero).unwrap();
    let twice = repo.add_incidence(twice).unwrap();

    assert!(once.bit_identical(&twice));
    let de = twice.get("DE").unwrap();
    // the first call's sentinel is kept
    assert!(de.value(Column::REPRODUCTION, 7).unwrap().is_nan());
}

#[test]
fn test_smoothed_reproduction_adds_estimate() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["GB"]), 0, 0).unwrap();
    let dataset = repo
        .add_smoothed_reproduction_estimate(dataset, ZeroBlockPolicy::Zero)
        .unwrap();
    let gb = dataset.get("GB").unwrap();

    assert!(gb.has(Column::REPRODUCTION));
    assert!(gb.has(Column::rolling(Metric::R, 7)));
    assert!(gb.value(Column::REPRODUCTION, 29).unwrap().is_finite());
}

#[test]
fn test_parallel_and_sequential_results_match() {
    let parallel = SeriesRepository::from_rows(sample_rows(), Arc::new(WhoSource), &engine_config(1)).unwrap();
    let sequential = SeriesRepository::from_rows(sample_rows(), Arc::new(WhoSource), &engine_config(1000)).unwrap();

    let a = parallel.derive_all(CacheLevel::SmoothedReproduction, ZeroBlockPolicy::Nan).unwrap();
    let b = sequential.derive_all(CacheLevel::SmoothedReproduction, ZeroBlockPolicy::Nan).unwrap();

    assert_eq!(a.region_ids(), vec!["DE", "GB", "IS"]);
    assert!(a.bit_identical(&b));
}

#[test]
fn test_region_listing() {
    let repo = sample_repository();

    let listed: Vec<String> = repo.list_available_regions().into_iter().map(|(id, _)| id).collect();
    assert_eq!(listed, ids(&["DE", "GB", "IS"]));
    assert_eq!(repo.regions_in_continent("europe").len(), 3);
    assert!(repo.regions_in_continent("Asia").is_empty());
}

#[test]
fn test_repository_from_raw_table() {
    let table = "\
Date,GeoID,GeoName,Population,Continent,DailyCases,DailyDeaths
2020-03-02,GB,United Kingdom,67000000,Europe,20,1
2020-03-01,GB,United Kingdom,67000000,Europe,10,0
2020-03-01,XC,Saba,2000,,1,0
";
    let rows = parse_raw_table(Cursor::new(table), &WhoSource).unwrap();
    let repo = SeriesRepository::from_rows(rows, Arc::new(WhoSource), &engine_config(2)).unwrap();

    assert_eq!(repo.region_count(), 1);
    let dataset = repo.get_by_region_ids(&ids(&["UK"]), 0, 0).unwrap();
    let gb = dataset.get("GB").unwrap();
    assert_eq!(gb.records()[0].daily_new_cases, 10);
    assert_eq!(gb.value(Column::CUMULATIVE_CASES, 1), Some(30.0));
}

#[test]
fn test_row_view_reads_smoothed_reproduction_at_chain_window() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["GB"]), 0, 0).unwrap();
    let dataset = repo.add_rolling_average(dataset, Metric::DailyCases, 14).unwrap();
    let dataset = repo
        .add_smoothed_reproduction_estimate(dataset, ZeroBlockPolicy::Nan)
        .unwrap();
    let gb = dataset.get("GB").unwrap();

    let row = gb.row_with_windows(29, 14, repo.chain().rolling_window()).unwrap();
    let smoothed = gb.value(Column::rolling(Metric::R, 7), 29).unwrap();
    assert!(smoothed.is_finite());
    assert_eq!(row.rolling_average_reproduction, smoothed);
    assert_eq!(
        Some(row.rolling_average_cases),
        gb.value(Column::rolling(Metric::DailyCases, 14), 29)
    );
}

#[test]
fn test_empty_rolling_window_rejected() {
    let repo = sample_repository();
    let dataset = repo.get_by_region_ids(&ids(&["DE", "GB"]), 0, 0).unwrap();

    let result = repo.add_rolling_average(dataset, Metric::DailyCases, 0);
    assert!(matches!(result, Err(SeriesError::Validation(_))));
}
