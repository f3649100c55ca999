#![doc = r#"
gdalcmb — unique-combination counting across stacks of aligned rasters.

Given k raster bands that share a grid, every pixel location yields a k-tuple of integer
values. This crate assigns each distinct tuple an id in first-seen order (1, 2, 3, ...),
counts how many pixels carry it, and can write the per-pixel ids out as a new raster.
It powers the `gdalcmb` CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: combine rasters on disk
------------------------------------
```rust,no_run
use std::path::PathBuf;
use gdalcmb::{combine_rasters, CombineParams, RasterInput};

fn main() -> gdalcmb::Result<()> {
    let inputs = vec![
        RasterInput::new("/data/landcover.tif").with_name("landcover"),
        RasterInput::new("/data/soils.tif").with_band(2).with_name("soil"),
    ];
    let params = CombineParams {
        output: Some(PathBuf::from("/out/cmb_ids.tif")),
        table: Some(PathBuf::from("/out/cmb_table.csv")),
        ..Default::default()
    };

    let report = combine_rasters(&inputs, &params)?;
    for row in &report.table.rows {
        println!("{:?} -> id {} ({} pixels)", row.values, row.id, row.count);
    }
    Ok(())
}
```

Using the table directly
------------------------
```rust
use gdalcmb::CombinationTable;
use ndarray::array;

fn main() -> gdalcmb::Result<()> {
    let mut table = CombinationTable::with_names(3, &["a", "b", "c"])?;
    // one scan-line of three bands; column j is the j-th tuple
    let ids = table.update_batch(array![[1, 1, 2], [5, 5, 6], [9, 9, 9]].view(), 1.0)?;
    assert_eq!(ids, vec![1, 1, 2]);

    let mut export = table.export_table();
    export.sort_by_id();
    assert_eq!(export.rows[0].count, 2.0);
    Ok(())
}
```

Row order of [`CombinationTable::export_table`] follows hash map iteration and is not stable;
sort by id when order matters.

Useful modules
--------------
- [`api`] — high-level entry points.
- [`core`] — the combination table and the row-driven combine loop.
- [`io`] — GDAL readers and writers for rasters and tables.
- [`types`] — output data type and table format enums.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Types
pub use crate::core::combine::{
    CombinationRecord, CombinationRow, CombinationTable, CombinationTableExport, CombineStats,
    DriverOptions, RowSink, RowSource,
};
pub use crate::core::params::CombineParams;
pub use crate::error::{Error, Result};
pub use crate::types::{OutputDataType, TableFormat};

// Readers and writers
pub use crate::io::gdal::{GdalBandStack, GdalError, GdalMetadata, GdalRasterReader, RasterInput};
pub use crate::io::writers::{
    IdRasterWriter, write_table, write_table_csv, write_table_json, write_table_to,
};

// High-level API re-exports
pub use crate::api::{CombineReport, combine_rasters, resolve_names};
