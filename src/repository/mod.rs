mod series_repository;
mod window;

pub use series_repository::SeriesRepository;
pub use window::Window;
