//! Per-region derivation of epidemiological indicators
//!
//! [`engine`] holds the pure numeric transforms, [`chain`] applies them to a
//! [`DerivedSeries`](crate::models::DerivedSeries) in dependency order.

pub mod chain;
pub mod engine;
mod level;

pub use chain::{DerivationChain, INCIDENCE_WINDOW};
pub use engine::ZeroBlockPolicy;
pub use level::CacheLevel;
