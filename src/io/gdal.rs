use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::core::combine::RowSource;

/// Errors encountered when using GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Band index {band} out of range for {path} ({bands} bands)")]
    BandOutOfRange {
        path: String,
        band: usize,
        bands: usize,
    },
}

/// Metadata extracted from a GDAL-supported dataset
#[derive(Debug, Clone)]
pub struct GdalMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients
    /// ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as full WKT, empty when the dataset has none
    pub projection: String,
}

/// One band of one raster participating in a combine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterInput {
    pub path: PathBuf,
    /// 1-based band index
    pub band: usize,
    /// Column name in the exported table
    pub name: Option<String>,
}

impl RasterInput {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            band: 1,
            name: None,
        }
    }

    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Parses `PATH` or `PATH:BAND`. A suffix that is not a band number stays part of the path.
impl FromStr for RasterInput {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(crate::Error::invalid("input", s));
        }
        if let Some((path, band)) = s.rsplit_once(':') {
            if let Ok(band) = band.parse::<usize>() {
                if band == 0 || path.is_empty() {
                    return Err(crate::Error::invalid("input", s));
                }
                return Ok(RasterInput::new(path).with_band(band));
            }
        }
        Ok(RasterInput::new(s))
    }
}

/// Reader for generic geospatial formats via GDAL
pub struct GdalRasterReader {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub metadata: GdalMetadata,
}

impl GdalRasterReader {
    /// Open a GDAL-supported raster (e.g., GeoTIFF, ERDAS Imagine, VRT)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "No raster bands found in {}",
                path.as_ref().display()
            )));
        }
        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(_) => [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        // kept as WKT; custom CRSs carry no top-level EPSG code
        let projection = dataset.projection();
        Ok(GdalRasterReader {
            path: path.as_ref().to_path_buf(),
            dataset,
            metadata: GdalMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
            },
        })
    }

    fn check_band(&self, index: usize) -> Result<(), GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::BandOutOfRange {
                path: self.path.display().to_string(),
                band: index,
                bands: self.metadata.bands,
            });
        }
        Ok(())
    }

    /// Nodata value of a band (1-based index), if one is set
    pub fn no_data_value(&self, index: usize) -> Result<Option<f64>, GdalError> {
        self.check_band(index)?;
        Ok(self.dataset.rasterband(index)?.no_data_value())
    }

    /// Read one scan-line of a band (1-based index) as f64
    pub fn read_row(&self, index: usize, row: usize) -> Result<Vec<f64>, GdalError> {
        self.check_band(index)?;
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, 1);
        let buf = band.read_as::<f64>((0, row as isize), window, window, None)?;
        Ok(buf.data().to_vec())
    }
}

/// Aligned stack of input bands, read one row at a time
pub struct GdalBandStack {
    readers: Vec<GdalRasterReader>,
    bands: Vec<usize>,
    nodata: Vec<Option<f64>>,
    cols: usize,
    rows: usize,
}

impl GdalBandStack {
    /// Open every input; all must share the first input's raster size
    pub fn open(inputs: &[RasterInput]) -> crate::Result<Self> {
        if inputs.is_empty() {
            return Err(crate::Error::MissingArgument {
                arg: "inputs".to_string(),
            });
        }
        let mut readers = Vec::with_capacity(inputs.len());
        let mut nodata = Vec::with_capacity(inputs.len());
        let (mut cols, mut rows) = (0, 0);

        for input in inputs {
            let reader = GdalRasterReader::open(&input.path)?;
            let (c, r) = (reader.metadata.size_x, reader.metadata.size_y);
            if readers.is_empty() {
                (cols, rows) = (c, r);
            }
            if (c, r) != (cols, rows) {
                return Err(crate::Error::DimensionMismatch {
                    path: input.path.display().to_string(),
                    cols,
                    rows,
                    got_cols: c,
                    got_rows: r,
                });
            }
            nodata.push(reader.no_data_value(input.band)?);
            debug!(
                "opened {:?} band {} ({}x{}, nodata {:?})",
                input.path,
                input.band,
                c,
                r,
                nodata.last().copied().flatten()
            );
            readers.push(reader);
        }

        Ok(Self {
            readers,
            bands: inputs.iter().map(|i| i.band).collect(),
            nodata,
            cols,
            rows,
        })
    }

    /// Metadata of the first input, used to georeference outputs
    pub fn reference(&self) -> &GdalMetadata {
        &self.readers[0].metadata
    }
}

impl RowSource for GdalBandStack {
    fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn band_count(&self) -> usize {
        self.readers.len()
    }

    fn read_row(
        &mut self,
        row: usize,
        values: &mut Array2<i32>,
        valid: &mut [bool],
    ) -> crate::Result<()> {
        for (b, reader) in self.readers.iter().enumerate() {
            let line = reader.read_row(self.bands[b], row)?;
            let nodata = self.nodata[b];
            for (j, (&v, out)) in line.iter().zip(values.row_mut(b)).enumerate() {
                if v.is_nan() || Some(v) == nodata {
                    valid[j] = false;
                }
                // truncates toward zero
                *out = v as i32;
            }
        }
        Ok(())
    }
}
