pub mod column;
pub mod dataset;
pub mod record;
pub mod series;

pub use column::*;
pub use dataset::*;
pub use record::*;
pub use series::*;
