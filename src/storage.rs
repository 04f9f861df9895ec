use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::domain::ResourceRecord;
use crate::error::{RefineryError, Result};

/// Column order of the terminal dataset.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "Province",
    "City",
    "Name",
    "Address",
    "Category",
    "Description",
    "Contact",
    "Link",
    "Latitude",
    "Longitude",
    "OnlineOnly",
];

/// A source row before normalization: column name to raw cell value.
/// Header names keep their source casing; lookups happen case-insensitively
/// in the normalizer.
pub type RawRow = HashMap<String, String>;

/// Reads every row of a tabular source. A missing file is a fatal
/// configuration error, reported before any output is written.
pub fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(RefineryError::Config(format!(
            "Source file '{}' does not exist",
            path.display()
        )));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = RawRow::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            row.insert(header.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(row);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Writes all records as rows, in the canonical column order, in one pass.
pub fn write_records(path: &Path, records: &[ResourceRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(OUTPUT_COLUMNS)?;

    for record in records {
        let latitude = record.latitude.map(|v| v.to_string()).unwrap_or_default();
        let longitude = record.longitude.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record(&[
            record.province.as_str(),
            record.city.as_str(),
            record.name.as_str(),
            record.address.as_str(),
            record.category.as_str(),
            record.description.as_str(),
            record.contact.as_str(),
            record.link.as_deref().unwrap_or(""),
            latitude.as_str(),
            longitude.as_str(),
            record.online_only.as_str(),
        ])?;
    }

    writer.flush()?;
    debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
