//! Pure per-sequence transforms over one region's chronologically ordered records
//!
//! Every function returns a sequence of the same length as its input and never
//! mutates the input. Indeterminate values (division by zero, not enough history)
//! are reported as `NaN` rather than errors.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Value reported by the reproduction estimate when the prior block sums to zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZeroBlockPolicy {
    #[default]
    Nan,
    Zero,
}

impl ZeroBlockPolicy {
    pub fn sentinel(&self) -> f64 {
        match self {
            ZeroBlockPolicy::Nan => f64::NAN,
            ZeroBlockPolicy::Zero => 0.0,
        }
    }
}

/// Running total of a daily field
pub fn cumulative_sum(daily: &[u64]) -> Vec<u64> {
    daily
        .iter()
        .scan(0u64, |total, value| {
            *total = total.saturating_add(*value);
            Some(*total)
        })
        .collect()
}

/// `numerator * 100 / denominator`, `NaN` where the denominator is zero
pub fn percent_of_ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| if *d == 0.0 { f64::NAN } else { n * 100.0 / d })
        .collect()
}

/// Cumulative value per million inhabitants
///
/// Callers guarantee every population is positive.
pub fn per_million_population(cumulative: &[f64], population: &[u64]) -> Vec<f64> {
    cumulative
        .iter()
        .zip(population)
        .map(|(value, pop)| value / (*pop as f64 / 1_000_000.0))
        .collect()
}

/// Days needed to double the cumulative cases at the day-over-day growth ratio
///
/// Index 0 has no prior day and is always `NaN`. A quotient of 1 (no growth)
/// or 0 is undefined as well.
pub fn doubling_time(cumulative_cases: &[f64]) -> Vec<f64> {
    let mut result = Vec::with_capacity(cumulative_cases.len());

    for i in 0..cumulative_cases.len() {
        if i == 0 {
            result.push(f64::NAN);
            continue;
        }

        let previous = cumulative_cases[i - 1];
        let quotient = if previous != 0.0 {
            cumulative_cases[i] / previous
        } else {
            f64::NAN
        };

        if quotient.is_nan() || quotient == 1.0 || quotient == 0.0 {
            result.push(f64::NAN);
        } else {
            result.push(std::f64::consts::LN_2 / quotient.ln());
        }
    }

    result
}

/// Mean over `[max(0, i - window + 1), i]`
///
/// The window grows from one element at the start of the series until it
/// reaches full width. A `NaN` anywhere in the window yields `NaN`.
pub fn rolling_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Ratio of the most recent block of daily cases to the block before it
///
/// Indices below `2 * block_size - 1` do not have two full blocks and are `NaN`.
/// When the prior block sums to zero the policy's sentinel is reported.
pub fn reproduction_estimate(daily_cases: &[u64], block_size: usize, policy: ZeroBlockPolicy) -> Vec<f64> {
    let block_size = block_size.max(1);
    let first = 2 * block_size - 1;

    (0..daily_cases.len())
        .map(|i| {
            if i < first {
                return f64::NAN;
            }

            let recent: u64 = daily_cases[i + 1 - block_size..=i].iter().sum();
            let prior: u64 = daily_cases[i + 1 - 2 * block_size..=i - block_size].iter().sum();

            if prior == 0 {
                policy.sentinel()
            } else {
                recent as f64 / prior as f64
            }
        })
        .collect()
}

/// Trailing `window` day sum of new cases per 100,000 inhabitants
///
/// While the window is still growing the partial sum is scaled by
/// `window / (i + 1)` to represent a full window.
pub fn incidence_per_100k(daily_cases: &[u64], population: &[u64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    (0..daily_cases.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &daily_cases[start..=i];
            let sum = slice.iter().sum::<u64>() as f64;
            let scaled = sum * window as f64 / slice.len() as f64;
            scaled / (population[i] as f64 / 100_000.0)
        })
        .collect()
}
