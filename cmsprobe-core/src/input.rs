// URL list loading

use crate::error::{CoreError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load the URL list from a headerless CSV file.
///
/// The first field of every row is taken verbatim, in file order. Nothing is
/// trimmed, deduplicated or validated; a bad URL simply fails its lookup later.
pub fn load_urls(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CoreError::io(path, e))?;

    let urls = read_urls(file).map_err(|e| CoreError::csv(path, e))?;
    debug!("Loaded {} URL(s) from {}", urls.len(), path.display());

    Ok(urls)
}

/// Read first-column values from any CSV source.
///
/// Every row must have the same number of fields as the first one.
pub fn read_urls<R: Read>(reader: R) -> csv::Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut urls = Vec::new();
    for record in rdr.records() {
        let record = record?;
        urls.push(record.get(0).unwrap_or_default().to_string());
    }

    Ok(urls)
}
