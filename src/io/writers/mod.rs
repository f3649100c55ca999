pub mod metadata;
pub mod raster;
pub mod table;

pub use metadata::embed_combine_metadata;
pub use raster::IdRasterWriter;
pub use table::{write_table, write_table_csv, write_table_json, write_table_to};
