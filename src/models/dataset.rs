use crate::models::DerivedSeries;

/// Derived series of several regions in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    series: Vec<DerivedSeries>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region_id: &str) -> Option<&DerivedSeries> {
        self.series.iter().find(|s| s.id() == region_id)
    }

    pub fn region_ids(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.id()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivedSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Region-by-region [`DerivedSeries::bit_identical`]
    pub fn bit_identical(&self, other: &Dataset) -> bool {
        self.series.len() == other.series.len()
            && self.series.iter().zip(&other.series).all(|(a, b)| a.bit_identical(b))
    }

    /// Number of region-day rows across all regions
    pub fn total_rows(&self) -> usize {
        self.series.iter().map(|s| s.len()).sum()
    }
}

impl From<Vec<DerivedSeries>> for Dataset {
    fn from(series: Vec<DerivedSeries>) -> Self {
        Self { series }
    }
}

impl FromIterator<DerivedSeries> for Dataset {
    fn from_iter<I: IntoIterator<Item = DerivedSeries>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Dataset {
    type Item = DerivedSeries;
    type IntoIter = std::vec::IntoIter<DerivedSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DerivedSeries;
    type IntoIter = std::slice::Iter<'a, DerivedSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
