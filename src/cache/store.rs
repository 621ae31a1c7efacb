//! Durable, immutable store of derived datasets

use crate::cache::codec::{read_dataset, write_dataset};
use crate::cache::{CacheKey, DatasetMemo};
use crate::config::CacheConfig;
use crate::derivation::{CacheLevel, ZeroBlockPolicy};
use crate::error::{Result, SeriesError};
use crate::models::Dataset;
use crate::repository::SeriesRepository;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Reproduction estimates are persisted with the zero sentinel
pub const CACHE_ZERO_BLOCK_POLICY: ZeroBlockPolicy = ZeroBlockPolicy::Zero;

/// Directory of cache entries, one file per [`CacheKey`]
///
/// Entries are written once and never replaced. A writer publishes a fully
/// written temporary file with a no-clobber rename, so readers see either no
/// entry or a complete one.
#[derive(Debug, Clone)]
pub struct DerivationCache {
    directory: PathBuf,
    max_age_days: i64,
    memo: DatasetMemo,
}

impl DerivationCache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.directory)?;

        Ok(Self {
            directory: config.directory.clone(),
            max_age_days: config.max_age_days.max(1),
            memo: DatasetMemo::new(config.memo_capacity),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.file_name())
    }

    /// Whether an entry generated for `key` may still be served on `as_of`
    pub fn is_fresh(&self, key: &CacheKey, as_of: NaiveDate) -> bool {
        let age = key.age_days(as_of);
        (0..self.max_age_days).contains(&age)
    }

    /// Load the entry for `key`, or one of the same day at a higher level
    ///
    /// Returns `Ok(None)` on a miss: level 0, a stale key, or no entry on disk.
    pub fn load(&self, key: &CacheKey, as_of: NaiveDate) -> Result<Option<Arc<Dataset>>> {
        if key.level == CacheLevel::None {
            return Ok(None);
        }
        if !self.is_fresh(key, as_of) {
            tracing::debug!(key = %key, as_of = %as_of, "Cache entry is stale");
            return Ok(None);
        }

        for level in key.level.at_least() {
            let candidate = key.with_level(level);
            if let Some(dataset) = self.read_entry(&candidate)? {
                tracing::debug!(requested = %key, served = %candidate, "Cache hit");
                return Ok(Some(dataset));
            }
        }

        tracing::debug!(key = %key, "Cache miss");
        Ok(None)
    }

    /// Derive every region of `repository` up to `key.level` and persist the result
    ///
    /// An existing entry for `key` is returned as is. Otherwise the highest
    /// lower-level entry of the same day is extended, or the dataset is
    /// derived from the raw records. Level 0 derives nothing and writes nothing.
    pub fn build(&self, repository: &SeriesRepository, key: &CacheKey) -> Result<Arc<Dataset>> {
        let source = repository.source_info().short_name;
        if key.source != source {
            return Err(SeriesError::Cache(format!(
                "Cache key {} does not match repository source {}",
                key, source
            )));
        }

        if key.level == CacheLevel::None {
            return Ok(Arc::new(
                repository.derive_all(CacheLevel::None, CACHE_ZERO_BLOCK_POLICY)?,
            ));
        }

        if let Some(existing) = self.read_entry(key)? {
            tracing::info!(key = %key, "Cache entry already built");
            return Ok(existing);
        }

        let start = Instant::now();
        let base = key
            .level
            .below()
            .filter(|level| *level != CacheLevel::None)
            .find_map(|level| {
                let lower = key.with_level(level);
                self.read_entry(&lower).transpose().map(|r| r.map(|d| (lower, d)))
            })
            .transpose()?;

        let dataset = match base {
            Some((lower, dataset)) => {
                tracing::info!(from = %lower, to = %key, "Extending lower level cache entry");
                repository.extend_to_level(Dataset::clone(&dataset), key.level, CACHE_ZERO_BLOCK_POLICY)?
            }
            None => repository.derive_all(key.level, CACHE_ZERO_BLOCK_POLICY)?,
        };

        let dataset = self.persist(key, dataset)?;

        tracing::info!(
            key = %key,
            regions = dataset.len(),
            rows = dataset.total_rows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built cache entry"
        );

        Ok(dataset)
    }

    /// Keys of every entry in the directory, oldest first
    pub fn entries(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if let Some(key) = entry.file_name().to_str().and_then(CacheKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort_by(|a, b| {
            (a.generated, &a.source, a.level).cmp(&(b.generated, &b.source, b.level))
        });
        Ok(keys)
    }

    fn read_entry(&self, key: &CacheKey) -> Result<Option<Arc<Dataset>>> {
        if let Some(dataset) = self.memo.get(key) {
            return Ok(Some(dataset));
        }

        let file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let dataset = read_dataset(BufReader::new(file)).map_err(|e| {
            SeriesError::Cache(format!("Failed to read cache entry {}: {}", key, e))
        })?;
        let dataset = Arc::new(dataset);
        self.memo.insert(key.clone(), Arc::clone(&dataset));
        Ok(Some(dataset))
    }

    fn persist(&self, key: &CacheKey, dataset: Dataset) -> Result<Arc<Dataset>> {
        let path = self.path_for(key);
        let temp = NamedTempFile::new_in(&self.directory)?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            write_dataset(&dataset, &mut writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        match temp.persist_noclobber(&path) {
            Ok(_) => {
                let dataset = Arc::new(dataset);
                self.memo.insert(key.clone(), Arc::clone(&dataset));
                Ok(dataset)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!(key = %key, "Cache entry written concurrently, keeping the existing one");
                self.read_entry(key)?
                    .ok_or_else(|| SeriesError::Cache(format!("Cache entry {} vanished", key)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
