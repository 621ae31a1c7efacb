use super::{SourceAdapter, SourceInfo};

/// European Centre for Disease Prevention and Control table, published until 14/12/2020
///
/// ECDC uses its own codes (`UK`, `EL`) natively, so no alias is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdcSource;

impl SourceAdapter for EcdcSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            full_name: "European Centre for Disease Prevention and Control",
            short_name: "ECDC",
            link: "https://opendata.ecdc.europa.eu/covid19/casedistribution/csv/",
        }
    }
}
