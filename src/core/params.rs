use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{OutputDataType, TableFormat};

/// Combine parameters suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineParams {
    /// Variable names, one per input; names given on inputs take precedence
    pub names: Option<Vec<String>>,
    /// Output id raster; None skips raster output
    pub output: Option<PathBuf>,
    /// GDAL driver short name for the id raster
    pub driver: String,
    pub data_type: OutputDataType,
    /// Destination of the combination table; None leaves it to the caller
    pub table: Option<PathBuf>,
    pub table_format: TableFormat,
    /// Leave pixels uncounted (id 0) where any input is nodata or NaN
    pub skip_nodata: bool,
    pub quiet: bool,
}

impl Default for CombineParams {
    fn default() -> Self {
        Self {
            names: None,
            output: None,
            driver: "GTiff".to_string(),
            data_type: OutputDataType::U32,
            table: None,
            table_format: TableFormat::Csv,
            skip_nodata: false,
            quiet: false,
        }
    }
}

impl CombineParams {
    /// Load parameters from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
