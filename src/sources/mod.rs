//! Source adapters
//!
//! Each publisher normalizes into the same raw table and shares one derivation
//! engine. An adapter only carries the publisher's id tables.

mod ecdc;
pub mod loader;
mod owid;
mod rki;
mod who;

pub use ecdc::EcdcSource;
pub use loader::{load_raw_table, parse_raw_table};
pub use owid::OwidSource;
pub use rki::RkiSource;
pub use who::WhoSource;

use crate::config::DataSourceKind;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Description of a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub full_name: &'static str,
    pub short_name: &'static str,
    pub link: &'static str,
}

/// Publisher specific knowledge needed to turn raw rows into region series
pub trait SourceAdapter: Send + Sync + Debug {
    /// Describe the source
    fn info(&self) -> SourceInfo;

    /// Current code for a legacy or mistaken region code
    fn alias(&self, _region_id: &str) -> Option<&'static str> {
        None
    }

    /// Whether a published id denotes a region this source reports on
    fn accepts(&self, raw_id: &str) -> bool {
        !raw_id.trim().is_empty()
    }

    /// Stable id under which a published id is stored
    fn canonical_id(&self, raw_id: &str) -> String {
        raw_id.trim().to_string()
    }

    /// Correct a requested id list, e.g. `["DE", "UK"]` to `["DE", "GB"]`
    fn review_region_ids(&self, region_ids: &[String]) -> Vec<String> {
        region_ids
            .iter()
            .map(|id| {
                let id = id.trim();
                self.alias(id).map(str::to_string).unwrap_or_else(|| id.to_string())
            })
            .collect()
    }
}

/// Create the adapter for a configured source
pub fn create_adapter(kind: DataSourceKind) -> Arc<dyn SourceAdapter> {
    match kind {
        DataSourceKind::Who => Arc::new(WhoSource),
        DataSourceKind::Ecdc => Arc::new(EcdcSource),
        DataSourceKind::Owid => Arc::new(OwidSource),
        DataSourceKind::Rki => Arc::new(RkiSource),
    }
}
