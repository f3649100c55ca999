use ndarray::Array2;
use tracing::{debug, info};

use super::table::CombinationTable;
use crate::error::{Error, Result};

/// Supplies one scan-line per band for each row of an aligned raster stack
pub trait RowSource {
    /// Grid size as (cols, rows)
    fn size(&self) -> (usize, usize);

    fn band_count(&self) -> usize;

    /// Fill `values` (`band_count x cols`) with row `row`, and set `valid[j]` to false for
    /// columns that should not be counted.
    fn read_row(&mut self, row: usize, values: &mut Array2<i32>, valid: &mut [bool])
    -> Result<()>;
}

/// Consumes the id scan-line produced for each row
pub trait RowSink {
    fn write_row(&mut self, row: usize, ids: &[u64]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// Honour the validity mask reported by the source
    pub skip_nodata: bool,
    /// Suppress progress logging
    pub quiet: bool,
}

/// Summary of one combine run
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CombineStats {
    pub cols: usize,
    pub rows: usize,
    pub pixels_counted: u64,
    pub pixels_skipped: u64,
    pub combinations: usize,
}

/// Feed every row of `source` into `table`, passing ids on to `sink` when given
pub fn combine(
    source: &mut dyn RowSource,
    table: &mut CombinationTable,
    mut sink: Option<&mut dyn RowSink>,
    options: &DriverOptions,
) -> Result<CombineStats> {
    let bands = source.band_count();
    if bands != table.key_length() {
        return Err(Error::invalid(
            "bands",
            format!("{} source bands for key length {}", bands, table.key_length()),
        ));
    }
    let (cols, rows) = source.size();
    debug!("combine: {} bands, {}x{} pixels", bands, cols, rows);

    let mut values = Array2::<i32>::zeros((bands, cols));
    let mut valid = vec![true; cols];
    let mut stats = CombineStats {
        cols,
        rows,
        ..Default::default()
    };
    let step = (rows / 10).max(1);

    for row in 0..rows {
        valid.fill(true);
        source.read_row(row, &mut values, &mut valid)?;

        let ids = if options.skip_nodata {
            table.update_batch_masked(values.view(), &valid, 1.0)?
        } else {
            table.update_batch(values.view(), 1.0)?
        };
        let skipped = ids.iter().filter(|&&id| id == 0).count() as u64;
        stats.pixels_skipped += skipped;
        stats.pixels_counted += cols as u64 - skipped;

        if let Some(sink) = sink.as_deref_mut() {
            sink.write_row(row, &ids)?;
        }

        if !options.quiet && (row + 1) % step == 0 {
            info!(
                "combine: {:.0}% ({} of {} rows, {} combinations)",
                (row + 1) as f64 * 100.0 / rows as f64,
                row + 1,
                rows,
                table.len()
            );
        }
    }

    stats.combinations = table.len();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    // in-memory band stack; `nodata` marks values to be reported invalid
    struct GridSource {
        pub bands: Vec<Array2<i32>>,
        pub nodata: Option<i32>,
    }

    impl RowSource for GridSource {
        fn size(&self) -> (usize, usize) {
            let (rows, cols) = self.bands[0].dim();
            (cols, rows)
        }

        fn band_count(&self) -> usize {
            self.bands.len()
        }

        fn read_row(
            &mut self,
            row: usize,
            values: &mut Array2<i32>,
            valid: &mut [bool],
        ) -> Result<()> {
            for (b, band) in self.bands.iter().enumerate() {
                values.row_mut(b).assign(&band.row(row));
                for (j, &v) in band.row(row).iter().enumerate() {
                    if Some(v) == self.nodata {
                        valid[j] = false;
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct GridSink {
        pub rows: Vec<(usize, Vec<u64>)>,
    }

    impl RowSink for GridSink {
        fn write_row(&mut self, row: usize, ids: &[u64]) -> Result<()> {
            self.rows.push((row, ids.to_vec()));
            Ok(())
        }
    }

    fn source() -> GridSource {
        GridSource {
            bands: vec![
                ndarray::array![[1, 1, 2], [2, 1, 1]],
                ndarray::array![[5, 5, 6], [6, 5, -9]],
            ],
            nodata: Some(-9),
        }
    }

    #[test]
    fn writes_ids_row_by_row() {
        let mut src = source();
        let mut sink = GridSink::default();
        let mut table = CombinationTable::new(2).unwrap();
        let stats = combine(
            &mut src,
            &mut table,
            Some(&mut sink as &mut dyn RowSink),
            &DriverOptions::default(),
        )
        .unwrap();

        assert_eq!(sink.rows, vec![(0, vec![1, 1, 2]), (1, vec![2, 1, 3])]);
        assert_eq!(stats.pixels_counted, 6);
        assert_eq!(stats.pixels_skipped, 0);
        assert_eq!(stats.combinations, 3);
        assert_eq!(table.get(&[1, 5]).unwrap().count, 3.0);
    }

    #[test]
    fn skips_nodata_when_asked() {
        let mut src = source();
        let mut sink = GridSink::default();
        let mut table = CombinationTable::new(2).unwrap();
        let options = DriverOptions {
            skip_nodata: true,
            quiet: true,
        };
        let stats = combine(
            &mut src,
            &mut table,
            Some(&mut sink as &mut dyn RowSink),
            &options,
        )
        .unwrap();

        assert_eq!(sink.rows[1], (1, vec![2, 1, 0]));
        assert_eq!(stats.pixels_skipped, 1);
        assert_eq!(stats.pixels_counted, 5);
        assert_eq!(stats.combinations, 2);
        assert!(table.get(&[1, -9]).is_none());
    }

    #[test]
    fn runs_without_sink() {
        let mut src = source();
        let mut table = CombinationTable::new(2).unwrap();
        let stats = combine(&mut src, &mut table, None, &DriverOptions::default()).unwrap();
        assert_eq!((stats.cols, stats.rows), (3, 2));
        assert_eq!(table.last_id(), 3);
    }

    #[test]
    fn band_count_must_match_key_length() {
        let mut src = source();
        let mut table = CombinationTable::new(3).unwrap();
        let err = combine(&mut src, &mut table, None, &DriverOptions::default());
        assert!(matches!(err, Err(Error::InvalidArgument { arg: "bands", .. })));
        assert!(table.is_empty());
    }
}
