//! Unique-combination counting: the incremental [`table::CombinationTable`] and the
//! row loop in [`driver`] that feeds it from a raster stack.
pub mod driver;
pub mod table;

pub use driver::{CombineStats, DriverOptions, RowSink, RowSource, combine};
pub use table::{
    CombinationHasher, CombinationKey, CombinationRecord, CombinationRow, CombinationTable,
    CombinationTableExport,
};
