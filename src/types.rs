//! Shared types and enums used across gdalcmb.
//! Includes `OutputDataType` for the id raster and `TableFormat` for the exported table.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Pixel type of the output id raster
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
pub enum OutputDataType {
    U16,
    #[default]
    U32,
    I32,
    F64,
}

impl OutputDataType {
    /// Largest id the type can hold exactly
    pub fn max_id(&self) -> u64 {
        match self {
            OutputDataType::U16 => u16::MAX as u64,
            OutputDataType::U32 => u32::MAX as u64,
            OutputDataType::I32 => i32::MAX as u64,
            // integers above 2^53 lose precision in a double
            OutputDataType::F64 => 1u64 << 53,
        }
    }
}

impl std::fmt::Display for OutputDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputDataType::U16 => "UInt16",
            OutputDataType::U32 => "UInt32",
            OutputDataType::I32 => "Int32",
            OutputDataType::F64 => "Float64",
        };
        write!(f, "{}", s)
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Csv => write!(f, "CSV"),
            TableFormat::Json => write!(f, "JSON"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_id_follows_pixel_type() {
        assert_eq!(OutputDataType::U16.max_id(), 65_535);
        assert_eq!(OutputDataType::I32.max_id(), 2_147_483_647);
        assert!(OutputDataType::F64.max_id() > OutputDataType::U32.max_id());
    }

    #[test]
    fn defaults() {
        assert_eq!(OutputDataType::default(), OutputDataType::U32);
        assert_eq!(TableFormat::default(), TableFormat::Csv);
        assert_eq!(TableFormat::Json.to_string(), "JSON");
    }
}
