use std::io::{self, Write};

use tracing::info;
use tracing_subscriber::fmt::MakeWriter;

use gdalcmb::{CombinationTableExport, CombineParams, combine_rasters, write_table_to};

use super::args::CliArgs;
use super::errors::AppError;

/// Merge the optional params file with command-line options
fn build_params(args: &CliArgs) -> Result<CombineParams, AppError> {
    let mut params = match &args.params {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            CombineParams::from_json_file(path)?
        }
        None => CombineParams::default(),
    };

    if let Some(names) = &args.names {
        if names.len() != args.inputs.len() {
            return Err(AppError::NameCount {
                expected: args.inputs.len(),
                got: names.len(),
            });
        }
        params.names = Some(names.clone());
    }
    if let Some(output) = &args.output {
        params.output = Some(output.clone());
    }
    if let Some(driver) = &args.driver {
        params.driver = driver.clone();
    }
    if let Some(data_type) = args.data_type {
        params.data_type = data_type;
    }
    if let Some(table) = &args.table {
        if table.is_dir() {
            return Err(AppError::TableIsDirectory {
                path: table.display().to_string(),
            });
        }
        params.table = Some(table.clone());
    }
    if let Some(format) = args.table_format {
        params.table_format = format;
    }
    params.skip_nodata |= args.skip_nodata;
    params.quiet |= args.quiet;
    Ok(params)
}

/// Debug-level log subscriber; `run` hands it stderr so stdout only carries the table
fn log_subscriber<W>(make_writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(make_writer)
        .finish()
}

/// Print the table in the configured format when no table file was requested
fn emit_table<W: Write>(
    out: W,
    params: &CombineParams,
    table: &CombinationTableExport,
) -> Result<(), AppError> {
    if params.table.is_none() {
        write_table_to(out, params.table_format, table)?;
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing::subscriber::set_global_default(log_subscriber(io::stderr))?;
    }

    let params = build_params(&args)?;
    let report = combine_rasters(&args.inputs, &params).map_err(AppError::from)?;
    emit_table(io::stdout().lock(), &params, &report.table)?;

    info!(
        "Combine complete: {} combinations, {} pixels counted, {} skipped",
        report.stats.combinations, report.stats.pixels_counted, report.stats.pixels_skipped
    );
    if let Some(output) = &params.output {
        info!("Id raster: {:?}", output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gdalcmb::{CombinationTable, OutputDataType, TableFormat};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> CombinationTableExport {
        let mut table = CombinationTable::with_names(2, &["veg", "soil"]).unwrap();
        table.update(&[1, 5], 1.0).unwrap();
        table.update(&[2, 6], 1.0).unwrap();
        let mut export = table.export_table();
        export.sort_by_id();
        export
    }

    #[test]
    fn parses_repeated_inputs() {
        let args = CliArgs::parse_from([
            "gdalcmb", "-i", "a.tif", "-i", "b.tif:2", "--names", "veg,soil", "-o", "ids.tif",
        ]);
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.inputs[1].band, 2);

        let params = build_params(&args).unwrap();
        assert_eq!(params.names, Some(vec!["veg".to_string(), "soil".to_string()]));
        assert_eq!(params.output, Some(PathBuf::from("ids.tif")));
        assert_eq!(params.data_type, OutputDataType::U32);
    }

    #[test]
    fn command_line_overrides_params_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{ "driver": "HFA", "data_type": "U16", "table_format": "Json" }"#,
        )
        .unwrap();
        let args = CliArgs::parse_from([
            "gdalcmb",
            "-i",
            "a.tif",
            "--params",
            path.to_str().unwrap(),
            "--data-type",
            "i32",
        ]);
        let params = build_params(&args).unwrap();
        assert_eq!(params.driver, "HFA");
        assert_eq!(params.data_type, OutputDataType::I32);
        assert_eq!(params.table_format, TableFormat::Json);
    }

    #[test]
    fn name_count_is_checked() {
        let args = CliArgs::parse_from(["gdalcmb", "-i", "a.tif", "--names", "x,y"]);
        assert!(matches!(
            build_params(&args),
            Err(AppError::NameCount { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn band_zero_is_rejected() {
        assert!(CliArgs::try_parse_from(["gdalcmb", "-i", "a.tif:0"]).is_err());
        assert!(CliArgs::try_parse_from(["gdalcmb"]).is_err());
    }

    #[test]
    fn stdout_table_follows_table_format() {
        let params = CombineParams {
            table_format: TableFormat::Json,
            ..Default::default()
        };
        let mut out = Vec::new();
        emit_table(&mut out, &params, &sample()).unwrap();
        let back: CombinationTableExport = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, sample());

        let mut out = Vec::new();
        emit_table(&mut out, &CombineParams::default(), &sample()).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("veg,soil,id,count\n"));
    }

    #[test]
    fn nothing_printed_when_table_goes_to_file() {
        let params = CombineParams {
            table: Some(PathBuf::from("table.csv")),
            ..Default::default()
        };
        let mut out = Vec::new();
        emit_table(&mut out, &params, &sample()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn log_lines_do_not_mix_into_table_output() {
        let logs = Capture::default();
        let sink = logs.clone();
        let subscriber = log_subscriber(move || sink.clone());

        let mut out = Vec::new();
        tracing::subscriber::with_default(subscriber, || {
            info!("Combine complete: 2 combinations");
            emit_table(&mut out, &CombineParams::default(), &sample()).unwrap();
        });

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "veg,soil,id,count\n1,5,1,1\n2,6,2,1\n"
        );
        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Combine complete"));
    }
}
