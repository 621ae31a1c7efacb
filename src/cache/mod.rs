//! Persisted derived datasets keyed by generation date, source and level

mod codec;
mod key;
mod memo;
mod store;

pub use codec::{read_dataset, write_dataset};
pub use key::CacheKey;
pub use memo::DatasetMemo;
pub use store::{DerivationCache, CACHE_ZERO_BLOCK_POLICY};
