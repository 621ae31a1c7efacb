use super::{SourceAdapter, SourceInfo};

/// Published ids that WHO reports without a matching region in the reference tables
const UNMAPPED_IDS: &[&str] = &[
    "XC", "XB", "AS", "KP", "GF", "GP", "KI", "MQ", "YT", "FM", "NR", "NU", "PW", "PN", "RE", "BL",
    "SH", "MF", "PM", "TM", "TK", "TO", "TV",
];

/// World Health Organization global table
#[derive(Debug, Clone, Copy, Default)]
pub struct WhoSource;

impl SourceAdapter for WhoSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            full_name: "World Health Organization",
            short_name: "WHO",
            link: "https://covid19.who.int/WHO-COVID-19-global-data.csv",
        }
    }

    fn alias(&self, region_id: &str) -> Option<&'static str> {
        match region_id {
            "UK" => Some("GB"),
            "EL" => Some("GR"),
            "TW" => Some("CN"),
            _ => None,
        }
    }

    fn accepts(&self, raw_id: &str) -> bool {
        let id = raw_id.trim();
        !id.is_empty() && !UNMAPPED_IDS.contains(&id)
    }

    fn canonical_id(&self, raw_id: &str) -> String {
        match raw_id.trim() {
            // Bonaire
            "XA" => "BQ".to_string(),
            id => id.to_string(),
        }
    }
}
