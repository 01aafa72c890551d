use thiserror::Error;

/// All errors produced while loading and reshaping tracker data.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The row grid had no header row to map columns from.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The input file (or stdin) could not be read.
    #[error("Failed to load data from {source_name}: {source}")]
    FetchFailure {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// A filter value supplied by the user is not usable.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
