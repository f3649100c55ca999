use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::core::combine::CombinationTableExport;
use crate::error::Result;
use crate::types::TableFormat;

/// Write the table as CSV: one header row of column names, then one record per combination
pub fn write_table_csv<W: Write>(writer: W, table: &CombinationTableExport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        let mut record: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        record.push(row.id.to_string());
        record.push(row.count.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table as pretty-printed JSON (`columns` plus `rows` of `{values, id, count}`)
pub fn write_table_json<W: Write>(writer: W, table: &CombinationTableExport) -> Result<()> {
    serde_json::to_writer_pretty(writer, table)?;
    Ok(())
}

/// Write the table in the given format to any writer, e.g. stdout
pub fn write_table_to<W: Write>(
    writer: W,
    format: TableFormat,
    table: &CombinationTableExport,
) -> Result<()> {
    match format {
        TableFormat::Csv => write_table_csv(writer, table),
        TableFormat::Json => write_table_json(writer, table),
    }
}

pub fn write_table(path: &Path, format: TableFormat, table: &CombinationTableExport) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_table_to(&mut file, format, table)?;
    file.flush()?;
    info!(
        "wrote {} combinations to {:?} ({})",
        table.len(),
        path,
        format
    );
    Ok(())
}
