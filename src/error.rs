//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, CSV and JSON errors, and provides semantic variants
//! for argument validation and combine failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Dimension mismatch: {path} is {got_cols}x{got_rows}, expected {cols}x{rows}")]
    DimensionMismatch {
        path: String,
        cols: usize,
        rows: usize,
        got_cols: usize,
        got_rows: usize,
    },

    #[error("Combination id {id} does not fit output data type {data_type}")]
    IdOverflow { id: u64, data_type: String },
}

impl Error {
    pub(crate) fn invalid(arg: &'static str, value: impl std::fmt::Display) -> Self {
        Error::InvalidArgument {
            arg,
            value: value.to_string(),
        }
    }
}

impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(crate::io::GdalError::Gdal(e))
    }
}
