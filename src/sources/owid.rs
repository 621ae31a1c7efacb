use super::{SourceAdapter, SourceInfo};

/// Our World In Data table
#[derive(Debug, Clone, Copy, Default)]
pub struct OwidSource;

impl SourceAdapter for OwidSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            full_name: "Our World In Data",
            short_name: "OWID",
            link: "https://covid.ourworldindata.org/data/owid-covid-data.csv",
        }
    }

    fn alias(&self, region_id: &str) -> Option<&'static str> {
        match region_id {
            "UK" => Some("GB"),
            "EL" => Some("GR"),
            _ => None,
        }
    }

    /// OWID aggregates (world, continents, income groups) carry `OWID_` ids
    fn accepts(&self, raw_id: &str) -> bool {
        let id = raw_id.trim();
        !id.is_empty() && id != "nan" && (!id.starts_with("OWID_") || id == "OWID_KOS")
    }

    fn canonical_id(&self, raw_id: &str) -> String {
        match raw_id.trim() {
            "OWID_KOS" => "XK".to_string(),
            id => id.to_string(),
        }
    }
}
