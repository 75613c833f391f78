// CSV exports for lookup results

use crate::error::{CoreError, Result};
use cmsprobe_scanner::{SocialProfile, Technology};
use csv::{QuoteStyle, StringRecord};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Delimits a technology's categories inside the single `Categories` column.
/// Categories containing it are quoted the way CSV quotes fields.
pub const CATEGORY_SEPARATOR: u8 = b';';

/// A record type with a fixed column layout.
pub trait Tabular: Sized {
    /// Header names, in column order.
    const COLUMNS: &'static [&'static str];

    fn to_row(&self) -> csv::Result<Vec<String>>;

    fn from_row(row: &StringRecord) -> std::result::Result<Self, String>;
}

/// Encode a category list as one `;`-delimited CSV record.
///
/// No categories is the empty string, while a single empty category is
/// written as `""` so the two stay distinct.
pub fn encode_categories(categories: &[String]) -> csv::Result<String> {
    if categories.is_empty() {
        return Ok(String::new());
    }
    if let [only] = categories
        && only.is_empty()
    {
        return Ok("\"\"".to_string());
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(CATEGORY_SEPARATOR)
        .quote_style(QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(categories)?;
    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;

    Ok(String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string())
}

pub fn decode_categories(encoded: &str) -> csv::Result<Vec<String>> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(CATEGORY_SEPARATOR)
        .has_headers(false)
        .from_reader(encoded.as_bytes());

    let mut record = StringRecord::new();
    rdr.read_record(&mut record)?;
    Ok(record.iter().map(str::to_string).collect())
}

fn field<'a>(row: &'a StringRecord, index: usize, name: &str) -> std::result::Result<&'a str, String> {
    row.get(index)
        .ok_or_else(|| format!("missing column {}", name))
}

impl Tabular for Technology {
    const COLUMNS: &'static [&'static str] = &["Name", "Id", "Version", "Categories", "URL"];

    fn to_row(&self) -> csv::Result<Vec<String>> {
        Ok(vec![
            self.name.clone(),
            self.id.to_string(),
            self.version.clone(),
            encode_categories(&self.categories)?,
            self.url.clone(),
        ])
    }

    fn from_row(row: &StringRecord) -> std::result::Result<Self, String> {
        let id = field(row, 1, "Id")?;
        let categories = field(row, 3, "Categories")?;

        Ok(Technology {
            name: field(row, 0, "Name")?.to_string(),
            id: id
                .parse()
                .map_err(|e| format!("invalid Id '{}': {}", id, e))?,
            version: field(row, 2, "Version")?.to_string(),
            categories: decode_categories(categories)
                .map_err(|e| format!("invalid Categories '{}': {}", categories, e))?,
            url: field(row, 4, "URL")?.to_string(),
        })
    }
}

impl Tabular for SocialProfile {
    const COLUMNS: &'static [&'static str] = &["Network", "URL", "Profile"];

    fn to_row(&self) -> csv::Result<Vec<String>> {
        Ok(vec![self.network.clone(), self.url.clone(), self.profile.clone()])
    }

    fn from_row(row: &StringRecord) -> std::result::Result<Self, String> {
        Ok(SocialProfile {
            network: field(row, 0, "Network")?.to_string(),
            url: field(row, 1, "URL")?.to_string(),
            profile: field(row, 2, "Profile")?.to_string(),
        })
    }
}

/// Write `records` to `path` as CSV with a header row, replacing any
/// existing file. An empty slice still produces the header.
pub fn write_records<R: Tabular>(path: impl AsRef<Path>, records: &[R]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| CoreError::io(path, e))?;

    write_records_to(file, records).map_err(|e| CoreError::csv(path, e))?;
    debug!("Wrote {} row(s) to {}", records.len(), path.display());

    Ok(())
}

pub fn write_records_to<W: Write, R: Tabular>(writer: W, records: &[R]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(R::COLUMNS)?;
    for record in records {
        wtr.write_record(record.to_row()?)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Read back a file produced by [`write_records`] for the same record type.
pub fn read_records<R: Tabular>(path: impl AsRef<Path>) -> Result<Vec<R>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CoreError::io(path, e))?;

    read_records_from(file).map_err(|e| match e {
        ReadError::Csv(source) => CoreError::csv(path, source),
        ReadError::Row(message) => CoreError::Parse {
            path: path.to_path_buf(),
            message,
        },
    })
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Row(String),
}

pub fn read_records_from<Rd: Read, R: Tabular>(reader: Rd) -> std::result::Result<Vec<R>, ReadError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?;
    if !headers.iter().eq(R::COLUMNS.iter().copied()) {
        return Err(ReadError::Row(format!(
            "expected header {:?}, found {:?}",
            R::COLUMNS,
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut records = Vec::new();
    for (index, row) in rdr.records().enumerate() {
        let row = row?;
        let record = R::from_row(&row).map_err(|e| ReadError::Row(format!("row {}: {}", index + 1, e)))?;
        records.push(record);
    }

    Ok(records)
}
