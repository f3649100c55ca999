//! I/O layer: GDAL-backed reading of the input band stack (`gdal`) and
//! `writers` for the id raster, its metadata, and the exported table.
pub mod gdal;
pub use self::gdal::{GdalBandStack, GdalError, GdalMetadata, GdalRasterReader, RasterInput};

pub mod writers;
