use gdal::Dataset;
use gdal::DriverManager;
use gdal::raster::{Buffer, ColorInterpretation, GdalType};
use std::path::Path;
use tracing::debug;

use crate::core::combine::RowSink;
use crate::error::{Error, Result};
use crate::types::OutputDataType;

/// Single-band raster receiving one row of combination ids at a time
pub struct IdRasterWriter {
    dataset: Dataset,
    cols: usize,
    rows: usize,
    data_type: OutputDataType,
}

impl IdRasterWriter {
    pub fn create(
        output: &Path,
        driver: &str,
        cols: usize,
        rows: usize,
        data_type: OutputDataType,
    ) -> Result<Self> {
        let driver = DriverManager::get_driver_by_name(driver)?;
        let dataset = match data_type {
            OutputDataType::U16 => driver.create_with_band_type::<u16, _>(output, cols, rows, 1)?,
            OutputDataType::U32 => driver.create_with_band_type::<u32, _>(output, cols, rows, 1)?,
            OutputDataType::I32 => driver.create_with_band_type::<i32, _>(output, cols, rows, 1)?,
            OutputDataType::F64 => driver.create_with_band_type::<f64, _>(output, cols, rows, 1)?,
        };
        let mut band = dataset.rasterband(1)?;
        band.set_color_interpretation(ColorInterpretation::GrayIndex)?;
        debug!(
            "created {} id raster {:?} ({}x{})",
            data_type, output, cols, rows
        );
        Ok(Self {
            dataset,
            cols,
            rows,
            data_type,
        })
    }

    /// Copy georeferencing from an input. Identity transforms are left unset, and so is the
    /// projection in that case.
    pub fn georeference(&mut self, geotransform: [f64; 6], projection: &str) -> Result<()> {
        let is_identity = |gt: [f64; 6]| {
            gt[0] == 0.0
                && gt[1] == 1.0
                && gt[2] == 0.0
                && gt[3] == 0.0
                && gt[4] == 0.0
                && gt[5] == 1.0
        };
        if is_identity(geotransform) {
            return Ok(());
        }
        self.dataset.set_geo_transform(&geotransform)?;
        if !projection.is_empty() {
            self.dataset.set_projection(projection)?;
        }
        Ok(())
    }

    pub fn set_no_data(&mut self, value: f64) -> Result<()> {
        let mut band = self.dataset.rasterband(1)?;
        band.set_no_data_value(Some(value))?;
        Ok(())
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Flush and close the raster, reporting write-back failures
    pub fn close(self) -> Result<()> {
        self.dataset.close()?;
        Ok(())
    }

    fn write_converted<T: GdalType + Copy>(
        &self,
        row: usize,
        ids: &[u64],
        convert: impl Fn(u64) -> Option<T>,
    ) -> Result<()> {
        let data = ids
            .iter()
            .map(|&id| {
                convert(id).ok_or_else(|| Error::IdOverflow {
                    id,
                    data_type: self.data_type.to_string(),
                })
            })
            .collect::<Result<Vec<T>>>()?;
        let mut buf = Buffer::new((self.cols, 1), data);
        let mut band = self.dataset.rasterband(1)?;
        band.write((0, row as isize), (self.cols, 1), &mut buf)?;
        Ok(())
    }
}

impl RowSink for IdRasterWriter {
    fn write_row(&mut self, row: usize, ids: &[u64]) -> Result<()> {
        if ids.len() != self.cols {
            return Err(Error::invalid(
                "ids",
                format!("{} ids for {} columns", ids.len(), self.cols),
            ));
        }
        if row >= self.rows {
            return Err(Error::invalid("row", row));
        }
        let max = self.data_type.max_id();
        match self.data_type {
            OutputDataType::U16 => self.write_converted(row, ids, |id| u16::try_from(id).ok()),
            OutputDataType::U32 => self.write_converted(row, ids, |id| u32::try_from(id).ok()),
            OutputDataType::I32 => self.write_converted(row, ids, |id| i32::try_from(id).ok()),
            OutputDataType::F64 => {
                self.write_converted(row, ids, |id| (id <= max).then_some(id as f64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM_GT: [f64; 6] = [500_000.0, 30.0, 0.0, 4_200_000.0, 0.0, -30.0];

    fn writer(dir: &tempfile::TempDir, data_type: OutputDataType) -> IdRasterWriter {
        let path = dir.path().join("ids.tif");
        IdRasterWriter::create(&path, "GTiff", 2, 1, data_type).unwrap()
    }

    #[test]
    fn ids_beyond_u16_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = writer(&dir, OutputDataType::U16);
        w.write_row(0, &[1, 65_535]).unwrap();

        let err = w.write_row(0, &[1, 70_000]);
        assert!(matches!(
            err,
            Err(Error::IdOverflow { id: 70_000, ref data_type }) if data_type == "UInt16"
        ));
    }

    #[test]
    fn int32_takes_ids_up_to_its_max() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = writer(&dir, OutputDataType::I32);
        w.write_row(0, &[1, i32::MAX as u64]).unwrap();
        assert!(matches!(
            w.write_row(0, &[1, i32::MAX as u64 + 1]),
            Err(Error::IdOverflow { .. })
        ));
    }

    #[test]
    fn rejects_wrong_row_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = writer(&dir, OutputDataType::U32);
        assert!(w.write_row(0, &[1, 2, 3]).is_err());
        assert!(w.write_row(1, &[1, 2]).is_err());
    }

    #[test]
    fn georeference_sets_projection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.tif");
        let wkt = gdal::spatial_ref::SpatialRef::from_epsg(32617)
            .unwrap()
            .to_wkt()
            .unwrap();

        let mut w = IdRasterWriter::create(&path, "GTiff", 2, 1, OutputDataType::U32).unwrap();
        w.georeference(UTM_GT, &wkt).unwrap();
        w.close().unwrap();

        let ds = Dataset::open(&path).unwrap();
        assert_eq!(ds.geo_transform().unwrap(), UTM_GT);
        assert_eq!(ds.spatial_ref().unwrap().auth_code().unwrap(), 32617);
    }

    #[test]
    fn identity_transform_leaves_raster_unreferenced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.tif");
        let wkt = gdal::spatial_ref::SpatialRef::from_epsg(4326)
            .unwrap()
            .to_wkt()
            .unwrap();

        let mut w = IdRasterWriter::create(&path, "GTiff", 2, 1, OutputDataType::U32).unwrap();
        w.georeference([0.0, 1.0, 0.0, 0.0, 0.0, 1.0], &wkt).unwrap();
        w.close().unwrap();

        let ds = Dataset::open(&path).unwrap();
        assert!(ds.projection().is_empty());
    }
}
