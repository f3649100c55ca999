use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Expected {expected} names (one per input), got {got}")]
    NameCount { expected: usize, got: usize },

    #[error("Table output {path} already exists as a directory")]
    TableIsDirectory { path: String },

    #[error(transparent)]
    Combine(#[from] gdalcmb::Error),
}
