use crate::models::Listing;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;

const BOM: &str = "\u{feff}";

/// Serialize listings as BOM-prefixed CSV with a header row.
pub fn to_csv_bytes(records: &[Listing]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BOM.as_bytes().to_vec());

    // Written by hand so an empty table still gets its header.
    writer.write_record(Listing::COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))
}

/// Parse CSV written by [`to_csv_bytes`]. A leading BOM is optional.
pub fn from_csv_bytes(bytes: &[u8]) -> Result<Vec<Listing>> {
    let bytes = bytes.strip_prefix(BOM.as_bytes()).unwrap_or(bytes);
    let mut reader = csv::Reader::from_reader(bytes);

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<Listing>, _>>()
        .context("Failed to parse listing CSV")
}

/// Overwrite `path` with the given listings.
pub async fn write_listings(path: &Path, records: &[Listing]) -> Result<()> {
    let bytes = to_csv_bytes(records)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Load listings from `path`, or `None` if the file does not exist yet.
pub async fn read_listings(path: &Path) -> Result<Option<Vec<Listing>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let records = from_csv_bytes(&bytes)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(Some(records))
}
