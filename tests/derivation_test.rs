use chrono::{Duration, NaiveDate};
use covid_series::{
    config::EngineConfig,
    derivation::{
        engine::{self, ZeroBlockPolicy},
        CacheLevel, DerivationChain,
    },
    models::{Column, DailyRecord, DerivedSeries, Metric, RegionInfo, RegionSeries},
};

fn series(id: &str, days: usize, cases: u64, deaths: u64, population: u64) -> DerivedSeries {
    let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    let records = (0..days)
        .map(|i| DailyRecord::new(start + Duration::days(i as i64), cases, deaths, population))
        .collect();
    DerivedSeries::from(RegionSeries::new(RegionInfo::new(id, id, None), records).unwrap())
}

fn chain() -> DerivationChain {
    DerivationChain::new(&EngineConfig::default())
}

#[test]
fn test_cumulative_sum_accumulates_daily_values() {
    let daily = [0, 7, 3, 0, 0, 12, 1, 40];
    let cumulative = engine::cumulative_sum(&daily);

    assert_eq!(cumulative[0], daily[0]);
    for i in 1..daily.len() {
        assert_eq!(cumulative[i], cumulative[i - 1] + daily[i]);
    }
}

#[test]
fn test_mandatory_chain_is_idempotent() {
    let chain = chain();
    let mut once = series("FR", 20, 30, 2, 67_000_000);
    chain.apply_mandatory(&mut once).unwrap();

    let mut twice = once.clone();
    chain.apply_mandatory(&mut twice).unwrap();

    assert!(once.bit_identical(&twice));
}

#[test]
fn test_rolling_average_ramps_up() {
    let values = [4.0, 8.0, 12.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    let averages = engine::rolling_average(&values, 7);

    assert_eq!(averages[0], 4.0);
    assert_eq!(averages[2], 8.0);
    assert_eq!(averages[8], 18.0 / 7.0);
}

#[test]
fn test_doubling_time_undefined_on_first_day() {
    for input in [vec![1.0], vec![5.0, 10.0], vec![0.0, 0.0, 3.0], vec![100.0, 200.0, 400.0]] {
        assert!(engine::doubling_time(&input)[0].is_nan());
    }
    let doubling = engine::doubling_time(&[100.0, 200.0, 400.0]);
    assert!((doubling[1] - 1.0).abs() < 1e-12);
    assert!((doubling[2] - 1.0).abs() < 1e-12);
}

#[test]
fn test_incidence_of_constant_cases() {
    let daily = [10u64; 10];
    let population = [100_000u64; 10];
    let incidence = engine::incidence_per_100k(&daily, &population, 7);

    for value in &incidence[6..] {
        assert_eq!(*value, 70.0);
    }
}

#[test]
fn test_reproduction_zero_prior_block_uses_sentinel() {
    let daily = [0, 0, 0, 0, 5, 5, 5, 5];

    let nan = engine::reproduction_estimate(&daily, 4, ZeroBlockPolicy::Nan);
    assert!(nan[7].is_nan());

    let zero = engine::reproduction_estimate(&daily, 4, ZeroBlockPolicy::Zero);
    assert_eq!(zero[7], 0.0);
    assert!(zero.iter().all(|v| !v.is_infinite()));
    assert!(zero[..7].iter().all(|v| v.is_nan()));
}

#[test]
fn test_germany_scenario() {
    let mut de = series("DE", 14, 100, 1, 10_000_000);
    chain().apply_mandatory(&mut de).unwrap();

    assert_eq!(de.value(Column::CUMULATIVE_CASES, 13), Some(1400.0));
    assert_eq!(de.value(Column::CUMULATIVE_DEATHS, 13), Some(14.0));
    assert_eq!(de.value(Column::CASES_PER_MILLION, 13), Some(140.0));
    assert_eq!(de.value(Column::PERCENT_DEATHS, 13), Some(1.0));
}

#[test]
fn test_single_record_is_defined() {
    let mut single = series("LI", 1, 5, 0, 1_000_000);
    let chain = chain();
    chain
        .derive_to_level(&mut single, CacheLevel::SmoothedReproduction, ZeroBlockPolicy::Nan)
        .unwrap();

    assert_eq!(single.len(), 1);
    assert!(single.value(Column::DOUBLING_TIME, 0).unwrap().is_nan());
    assert_eq!(single.value(Column::rolling(Metric::DailyCases, 7), 0), Some(5.0));
    assert_eq!(single.value(Column::INCIDENCE, 0), Some(3.5));
    for column in chain.columns_for_level(CacheLevel::SmoothedReproduction) {
        assert!(single.has(column), "missing {}", column);
    }
}

#[test]
fn test_zero_population_fails_region() {
    let mut empty = series("XX", 3, 1, 0, 0);
    assert!(chain().apply_mandatory(&mut empty).is_err());
}
