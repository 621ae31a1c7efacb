use crate::cache::CacheKey;
use crate::models::Dataset;
use moka::sync::Cache;
use std::sync::Arc;

/// In-process memo of cache entries already read from disk
///
/// Entries on disk never change, so a memoized dataset stays valid for as
/// long as its key is fresh.
#[derive(Clone)]
pub struct DatasetMemo {
    cache: Cache<CacheKey, Arc<Dataset>>,
}

impl DatasetMemo {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Dataset>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: CacheKey, value: Arc<Dataset>) {
        self.cache.insert(key, value);
    }
}

impl std::fmt::Debug for DatasetMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetMemo")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
