use super::{SourceAdapter, SourceInfo};

/// Robert Koch-Institut district table for Germany, regions are counties
#[derive(Debug, Clone, Copy, Default)]
pub struct RkiSource;

impl SourceAdapter for RkiSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            full_name: "Robert Koch-Institut",
            short_name: "RKI",
            link: "https://api.corona-zahlen.org/docs/endpoints/districts.html",
        }
    }
}
