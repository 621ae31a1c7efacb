use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while loading, deriving or caching region series
#[derive(Error, Debug)]
pub enum SeriesError {
    /// Both windowing arguments were given
    #[error("Invalid parameter combination: last_n_days={last_n_days} and since_n_cases={since_n_cases} are mutually exclusive")]
    InvalidParameterCombination { last_n_days: usize, since_n_cases: u64 },

    /// Unknown region id after alias correction
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// Cumulative cases of a region never reach the requested threshold
    #[error("Region {region} never reaches {threshold} cumulative cases")]
    ThresholdNeverReached { region: String, threshold: u64 },

    /// Population is zero for a record, every normalized metric depends on it
    #[error("Invalid population for region {region} on {date}: {population}")]
    InvalidPopulation {
        region: String,
        date: NaiveDate,
        population: u64,
    },

    /// Two records of one region share a date
    #[error("Duplicate date {date} in region {region}")]
    DuplicateDate { region: String, date: NaiveDate },

    /// Malformed input table
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Cache read/write errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeriesError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            SeriesError::InvalidParameterCombination { .. } => "INVALID_PARAMETER_COMBINATION",
            SeriesError::RegionNotFound(_) => "REGION_NOT_FOUND",
            SeriesError::ThresholdNeverReached { .. } => "THRESHOLD_NEVER_REACHED",
            SeriesError::InvalidPopulation { .. } => "INVALID_POPULATION",
            SeriesError::DuplicateDate { .. } => "DUPLICATE_DATE",
            SeriesError::Parse { .. } => "PARSE_ERROR",
            SeriesError::Cache(_) => "CACHE_ERROR",
            SeriesError::Configuration(_) => "CONFIGURATION_ERROR",
            SeriesError::Validation(_) => "VALIDATION_ERROR",
            SeriesError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the error stems from how the caller invoked an operation
    pub fn is_parameter_misuse(&self) -> bool {
        matches!(
            self,
            SeriesError::InvalidParameterCombination { .. }
                | SeriesError::RegionNotFound(_)
                | SeriesError::ThresholdNeverReached { .. }
        )
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for SeriesError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize).unwrap_or_default();
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => SeriesError::Io(e),
            _ => SeriesError::Parse { line, message },
        }
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for SeriesError {
    fn from(err: validator::ValidationErrors) -> Self {
        SeriesError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for SeriesError {
    fn from(err: config::ConfigError) -> Self {
        SeriesError::Configuration(err.to_string())
    }
}

/// Conversion from tempfile::PersistError
impl From<tempfile::PersistError> for SeriesError {
    fn from(err: tempfile::PersistError) -> Self {
        SeriesError::Cache(format!("Failed to publish cache file: {}", err.error))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SeriesError>;
