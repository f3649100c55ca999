//! High-level, ergonomic library API: run a full combine over a stack of rasters,
//! optionally writing the id raster and the combination table. Prefer this entrypoint
//! over wiring `core::combine` and `io` together by hand.
use serde::Serialize;
use tracing::{info, warn};

use crate::core::combine::{
    CombinationTable, CombinationTableExport, CombineStats, DriverOptions, RowSink, RowSource,
    combine,
};
use crate::core::params::CombineParams;
use crate::error::{Error, Result};
use crate::io::gdal::{GdalBandStack, RasterInput};
use crate::io::writers::{IdRasterWriter, embed_combine_metadata, write_table};

/// Result of a combine run
#[derive(Debug, Clone, Serialize)]
pub struct CombineReport {
    pub stats: CombineStats,
    /// Distinct combinations, sorted by id
    pub table: CombinationTableExport,
}

/// Column names for the inputs: per-input names, else `params.names`, else `V1`..`Vk`.
/// Per-input names must be given for every input or for none.
pub fn resolve_names(inputs: &[RasterInput], params: &CombineParams) -> Result<Vec<String>> {
    let named = inputs.iter().filter(|i| i.name.is_some()).count();
    if named == inputs.len() && named > 0 {
        return Ok(inputs.iter().filter_map(|i| i.name.clone()).collect());
    }
    if named > 0 {
        return Err(Error::invalid(
            "names",
            format!("{} of {} inputs are named", named, inputs.len()),
        ));
    }
    match &params.names {
        Some(names) if names.len() != inputs.len() => Err(Error::invalid(
            "names",
            format!("{} names for {} inputs", names.len(), inputs.len()),
        )),
        Some(names) => Ok(names.clone()),
        None => Ok((1..=inputs.len()).map(|i| format!("V{}", i)).collect()),
    }
}

/// Combine the given raster bands: every distinct tuple of pixel values gets an id in
/// first-seen (row-major) order, with a pixel count per tuple.
pub fn combine_rasters(inputs: &[RasterInput], params: &CombineParams) -> Result<CombineReport> {
    let names = resolve_names(inputs, params)?;
    let mut table = CombinationTable::with_names(inputs.len(), names.as_slice())?;
    let mut source = GdalBandStack::open(inputs)?;
    let (cols, rows) = source.size();
    info!(
        "combining {} bands of {}x{} pixels ({})",
        inputs.len(),
        cols,
        rows,
        names.join(", ")
    );

    let mut writer = match &params.output {
        Some(path) => {
            let mut writer =
                IdRasterWriter::create(path, &params.driver, cols, rows, params.data_type)?;
            let reference = source.reference();
            writer.georeference(reference.geotransform, &reference.projection)?;
            if params.skip_nodata {
                writer.set_no_data(0.0)?;
            }
            embed_combine_metadata(writer.dataset_mut(), inputs, &names)?;
            Some(writer)
        }
        None => None,
    };

    let options = DriverOptions {
        skip_nodata: params.skip_nodata,
        quiet: params.quiet,
    };
    let stats = combine(
        &mut source,
        &mut table,
        writer.as_mut().map(|w| w as &mut dyn RowSink),
        &options,
    )?;
    if let Some(writer) = writer {
        writer.close()?;
    }

    if stats.pixels_skipped > 0 {
        warn!("{} nodata pixels left uncounted", stats.pixels_skipped);
    }
    info!(
        "found {} combinations in {} pixels",
        stats.combinations, stats.pixels_counted
    );

    let mut export = table.export_table();
    export.sort_by_id();
    if let Some(path) = &params.table {
        write_table(path, params.table_format, &export)?;
    }

    Ok(CombineReport {
        stats,
        table: export,
    })
}
