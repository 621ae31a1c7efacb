use crate::error::{Result, SeriesError};
use crate::models::{Column, DerivedSeries};

/// Which part of a derived series a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    #[default]
    All,
    /// The trailing N records
    LastDays(usize),
    /// Records from the first day cumulative cases reach N onward
    SinceCases(u64),
}

impl Window {
    /// Build a window from the two mutually exclusive query arguments, zero meaning unset
    pub fn from_args(last_n_days: usize, since_n_cases: u64) -> Result<Self> {
        match (last_n_days, since_n_cases) {
            (0, 0) => Ok(Window::All),
            (n, 0) => Ok(Window::LastDays(n)),
            (0, n) => Ok(Window::SinceCases(n)),
            (last_n_days, since_n_cases) => Err(SeriesError::InvalidParameterCombination {
                last_n_days,
                since_n_cases,
            }),
        }
    }

    /// Cut a series that already carries its cumulative cases
    ///
    /// `SinceCases` adds an `Index` column counting days since the threshold.
    pub fn apply(&self, series: DerivedSeries) -> Result<DerivedSeries> {
        match *self {
            Window::All => Ok(series),
            Window::LastDays(n) => {
                let len = series.len();
                if n >= len {
                    Ok(series)
                } else {
                    Ok(series.slice(len - n..len))
                }
            }
            Window::SinceCases(threshold) => {
                let cumulative = series.values(Column::CUMULATIVE_CASES).ok_or_else(|| {
                    SeriesError::Validation(format!(
                        "Cumulative cases missing for region {}",
                        series.id()
                    ))
                })?;

                let start = cumulative
                    .iter()
                    .position(|v| *v >= threshold as f64)
                    .ok_or_else(|| SeriesError::ThresholdNeverReached {
                        region: series.id().to_string(),
                        threshold,
                    })?;

                let mut windowed = series.slice(start..series.len());
                let index = (0..windowed.len()).map(|i| i as f64).collect();
                windowed.insert(Column::INDEX, index)?;
                Ok(windowed)
            }
        }
    }
}
