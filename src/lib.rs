//! Per-region COVID-19 time series and the metrics derived from them
//!
//! A raw snapshot table is split into one [`models::RegionSeries`] per
//! region by the [`repository::SeriesRepository`], each region is run
//! through the [`derivation::DerivationChain`] independently and the
//! results are reassembled into a [`models::Dataset`]. Fully derived
//! datasets can be persisted with the [`cache::DerivationCache`].

pub mod cache;
pub mod config;
pub mod derivation;
pub mod error;
pub mod models;
pub mod repository;
pub mod sources;

pub use error::{Result, SeriesError};
