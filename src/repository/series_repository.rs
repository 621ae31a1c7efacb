//! Multi-region dataset with per-region derivation on demand

use crate::config::EngineConfig;
use crate::derivation::{CacheLevel, DerivationChain, ZeroBlockPolicy};
use crate::error::{Result, SeriesError};
use crate::models::{Dataset, DerivedSeries, Metric, RawRow, RegionInfo, RegionSeries};
use crate::repository::Window;
use crate::sources::{SourceAdapter, SourceInfo};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns every region of one source snapshot
///
/// Regions are kept in first-seen order. Queries never mutate the stored
/// series: each call derives on a copy, so the repository can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct SeriesRepository {
    adapter: Arc<dyn SourceAdapter>,
    chain: DerivationChain,
    parallel_min_regions: usize,
    regions: Vec<DerivedSeries>,
    index: HashMap<String, usize>,
}

impl SeriesRepository {
    /// Split raw rows into chronologically ordered region series
    pub fn from_rows(rows: Vec<RawRow>, adapter: Arc<dyn SourceAdapter>, config: &EngineConfig) -> Result<Self> {
        let mut order: Vec<RegionInfo> = Vec::new();
        let mut grouped: HashMap<String, Vec<_>> = HashMap::new();

        for row in rows {
            let records = grouped.entry(row.geo_id.clone()).or_insert_with(|| {
                order.push(RegionInfo::new(row.geo_id.clone(), row.geo_name.clone(), row.continent.clone()));
                Vec::new()
            });
            records.push(row.record());
        }

        let regions = order
            .into_iter()
            .map(|info| {
                let records = grouped.remove(&info.id).unwrap_or_default();
                RegionSeries::new(info, records).map(DerivedSeries::from)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            source = adapter.info().short_name,
            regions = regions.len(),
            "Built series repository"
        );

        Ok(Self::from_dataset(Dataset::from(regions), adapter, config))
    }

    /// Wrap an already (partially) derived dataset, e.g. one loaded from the cache
    pub fn from_dataset(dataset: Dataset, adapter: Arc<dyn SourceAdapter>, config: &EngineConfig) -> Self {
        let mut regions: Vec<DerivedSeries> = Vec::with_capacity(dataset.len());
        let mut index = HashMap::new();

        for series in dataset {
            if index.contains_key(series.id()) {
                tracing::warn!(region = %series.id(), "Duplicate region in dataset, keeping the first");
                continue;
            }
            index.insert(series.id().to_string(), regions.len());
            regions.push(series);
        }

        Self {
            adapter,
            chain: DerivationChain::new(config),
            parallel_min_regions: config.parallel_min_regions.max(1),
            regions,
            index,
        }
    }

    pub fn source_info(&self) -> SourceInfo {
        self.adapter.info()
    }

    pub fn chain(&self) -> &DerivationChain {
        &self.chain
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// `(id, name)` pairs in first-seen order
    pub fn list_available_regions(&self) -> Vec<(String, String)> {
        self.regions
            .iter()
            .map(|s| (s.info().id.clone(), s.info().name.clone()))
            .collect()
    }

    /// Regions whose continent matches, ignoring case
    pub fn regions_in_continent(&self, continent: &str) -> Vec<RegionInfo> {
        self.regions
            .iter()
            .filter(|s| {
                s.info()
                    .continent
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(continent))
            })
            .map(|s| s.info().clone())
            .collect()
    }

    /// Map legacy codes to the ones this source stores
    pub fn review_region_id_list(&self, region_ids: &[String]) -> Vec<String> {
        self.adapter.review_region_ids(region_ids)
    }

    /// Derived series of the requested regions, in request order
    ///
    /// At most one of `last_n_days` and `since_n_cases` may be nonzero. Ids are
    /// alias-corrected before lookup. If any region fails (unknown id, threshold
    /// never reached, invalid population) the whole call fails.
    pub fn get_by_region_ids(&self, region_ids: &[String], last_n_days: usize, since_n_cases: u64) -> Result<Dataset> {
        let window = Window::from_args(last_n_days, since_n_cases)?;
        let reviewed = self.review_region_id_list(region_ids);

        let selected = reviewed
            .iter()
            .map(|id| self.lookup(id).cloned())
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(regions = selected.len(), window = ?window, "Deriving requested regions");

        let derived = self.fan_out(selected, |mut series| {
            self.chain.apply_mandatory(&mut series)?;
            window.apply(series)
        })?;

        Ok(Dataset::from(derived))
    }

    /// Add a rolling average of `source` to every region of `dataset`
    pub fn add_rolling_average(&self, dataset: Dataset, source: Metric, window: usize) -> Result<Dataset> {
        self.map_dataset(dataset, |series| self.chain.add_rolling_average(series, source, window))
    }

    /// Add the reproduction estimate, reporting `policy`'s sentinel for an all-zero prior block
    pub fn add_reproduction_estimate(&self, dataset: Dataset, policy: ZeroBlockPolicy) -> Result<Dataset> {
        self.map_dataset(dataset, |series| self.chain.add_reproduction(series, policy))
    }

    /// Add the rolling average of the reproduction estimate
    pub fn add_smoothed_reproduction_estimate(&self, dataset: Dataset, policy: ZeroBlockPolicy) -> Result<Dataset> {
        self.map_dataset(dataset, |series| self.chain.add_smoothed_reproduction(series, policy))
    }

    /// Add the 7 day incidence per 100,000 inhabitants
    pub fn add_incidence(&self, dataset: Dataset) -> Result<Dataset> {
        self.map_dataset(dataset, |series| self.chain.add_incidence(series))
    }

    /// Derive every region up to `level`
    pub fn derive_all(&self, level: CacheLevel, policy: ZeroBlockPolicy) -> Result<Dataset> {
        let start = std::time::Instant::now();

        let derived = self.fan_out(self.regions.clone(), |mut series| {
            self.chain.derive_to_level(&mut series, level, policy)?;
            Ok(series)
        })?;

        tracing::info!(
            regions = derived.len(),
            level = %level,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Derived all regions"
        );

        Ok(Dataset::from(derived))
    }

    /// Climb an existing dataset up to `level`, keeping columns already present
    pub fn extend_to_level(&self, dataset: Dataset, level: CacheLevel, policy: ZeroBlockPolicy) -> Result<Dataset> {
        self.map_dataset(dataset, |series| self.chain.derive_to_level(series, level, policy))
    }

    fn lookup(&self, region_id: &str) -> Result<&DerivedSeries> {
        self.index
            .get(region_id)
            .map(|i| &self.regions[*i])
            .ok_or_else(|| SeriesError::RegionNotFound(region_id.to_string()))
    }

    fn map_dataset<F>(&self, dataset: Dataset, step: F) -> Result<Dataset>
    where
        F: Fn(&mut DerivedSeries) -> Result<()> + Sync + Send,
    {
        let derived = self.fan_out(dataset.into_iter().collect(), |mut series| {
            step(&mut series)?;
            Ok(series)
        })?;
        Ok(Dataset::from(derived))
    }

    /// Run `f` on each region, in parallel once enough regions are involved
    ///
    /// Output order follows input order; the first error fails the batch.
    fn fan_out<F>(&self, regions: Vec<DerivedSeries>, f: F) -> Result<Vec<DerivedSeries>>
    where
        F: Fn(DerivedSeries) -> Result<DerivedSeries> + Sync + Send,
    {
        if regions.len() >= self.parallel_min_regions && regions.len() > 1 {
            regions.into_par_iter().map(f).collect()
        } else {
            regions.into_iter().map(f).collect()
        }
    }
}
