use chrono::{DateTime, SecondsFormat, Utc};
use gdal::Dataset;
use gdal::Metadata;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::Result;
use crate::io::gdal::RasterInput;

/// Metadata fields describing a combine run
pub fn extract_combine_fields(
    inputs: &[RasterInput],
    names: &[String],
    created: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for (i, input) in inputs.iter().enumerate() {
        metadata.insert(
            format!("CMB_INPUT_{}", i + 1),
            format!("{}:{}", input.path.display(), input.band),
        );
    }
    metadata.insert("CMB_VARIABLES".to_string(), names.join(","));
    metadata.insert(
        "CMB_CREATED".to_string(),
        created.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    metadata
}

/// Record the inputs and variable names of a combine run on the id raster
pub fn embed_combine_metadata(
    ds: &mut Dataset,
    inputs: &[RasterInput],
    names: &[String],
) -> Result<()> {
    let metadata = extract_combine_fields(inputs, names, Utc::now());
    for (key, value) in &metadata {
        ds.set_metadata_item(key, value, "")?;
    }
    info!("embedded {} metadata items in id raster", metadata.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn one_field_per_input() {
        let inputs = vec![
            RasterInput::new("a.tif"),
            RasterInput::new("b.tif").with_band(3),
        ];
        let names = vec!["a".to_string(), "b".to_string()];
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let fields = extract_combine_fields(&inputs, &names, created);

        assert_eq!(fields["CMB_INPUT_1"], "a.tif:1");
        assert_eq!(fields["CMB_INPUT_2"], "b.tif:3");
        assert_eq!(fields["CMB_VARIABLES"], "a,b");
        assert_eq!(fields["CMB_CREATED"], "2024-05-01T12:00:00Z");
        assert_eq!(fields.len(), 4);
    }
}
