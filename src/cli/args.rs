use clap::Parser;
use std::path::PathBuf;

use gdalcmb::{OutputDataType, RasterInput, TableFormat};

#[derive(Parser, Debug)]
#[command(
    name = "gdalcmb",
    version,
    about = "Count unique combinations of pixel values across aligned rasters"
)]
pub struct CliArgs {
    /// Input raster, optionally with a 1-based band index (PATH or PATH:BAND). Repeat per input
    #[arg(short, long = "input", required = true, value_parser = parse_input)]
    pub inputs: Vec<RasterInput>,

    /// Comma-separated variable names, one per input (default: V1..Vk)
    #[arg(long, value_delimiter = ',')]
    pub names: Option<Vec<String>>,

    /// Output raster of combination ids
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// GDAL driver for the id raster
    #[arg(long)]
    pub driver: Option<String>,

    /// Pixel type of the id raster
    #[arg(long, value_enum)]
    pub data_type: Option<OutputDataType>,

    /// Combination table output file (written to stdout as CSV when omitted)
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    /// Combination table format
    #[arg(long, value_enum)]
    pub table_format: Option<TableFormat>,

    /// Leave pixels uncounted (id 0) where any input is nodata
    #[arg(long, default_value_t = false)]
    pub skip_nodata: bool,

    /// JSON file with combine parameters; command-line options take precedence
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Suppress progress messages
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

fn parse_input(s: &str) -> Result<RasterInput, String> {
    s.parse::<RasterInput>().map_err(|e| e.to_string())
}
