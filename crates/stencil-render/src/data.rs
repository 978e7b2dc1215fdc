//! Tabular data loading.
//!
//! The loader turns delimited text into [`Record`]s, one per data row, in
//! input order. The first row is the header and names the columns.
//!
//! The whole input is validated as UTF-8 before any row is parsed, a leading
//! byte-order marker is dropped, and every field value is passed through
//! [`normalize`](crate::text::normalize). Column names are kept verbatim.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::Error;
use crate::text::{decode_utf8, normalize};

/// Run-wide variables layered onto every record before rendering.
pub type GlobalVars = BTreeMap<String, String>;

/// One data row: column name to value.
///
/// Serializes as a plain map of its fields, so it can be handed to the
/// template engine directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    #[serde(skip)]
    line: u64,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates a record for the data row at `line` (1-based).
    pub fn new(line: u64) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field. A repeated column name replaces the earlier value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Line of the data row in the source (the header is line 1).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Converts a configured delimiter to the single byte the CSV reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8, Error> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(Error::Config(format!(
            "field delimiter must be a single ASCII character other than quote or newline, got {:?}",
            delimiter
        )))
    }
}

/// Reads all records from `reader`.
///
/// # Errors
///
/// - [`Error::Encoding`] if the input is not UTF-8 (nothing is parsed)
/// - [`Error::Format`] if a row's field count differs from the header's
/// - [`Error::Config`] for an unusable delimiter
///
/// # Example
///
/// ```rust
/// use stencil_render::load_records;
///
/// let records = load_records("col1,col2\nval1,val2\n".as_bytes(), ',').unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].get("col2"), Some("val2"));
/// ```
pub fn load_records<R: Read>(mut reader: R, delimiter: char) -> Result<Vec<Record>, Error> {
    let delimiter = delimiter_byte(delimiter)?;

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io("<data source>", e))?;
    let text = decode_utf8(&bytes, "data source")?;

    parse_records(text, delimiter)
}

/// Reads all records from the file at `path`.
pub fn load_records_from_path(
    path: impl AsRef<Path>,
    delimiter: char,
) -> Result<Vec<Record>, Error> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    load_records(file, delimiter).map_err(|e| match e {
        Error::Io { source, .. } => Error::io(path, source),
        Error::Encoding { offset, .. } => Error::Encoding {
            origin: path.display().to_string(),
            offset,
        },
        other => other,
    })
}

fn parse_records(text: &str, delimiter: u8) -> Result<Vec<Record>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let header = reader.headers().map_err(format_error)?.clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(format_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let mut record = Record::new(line);
        for (column, value) in header.iter().zip(row.iter()) {
            record.insert(column, normalize(value));
        }
        records.push(record);
    }

    log::debug!("loaded {} records with {} columns", records.len(), header.len());
    Ok(records)
}

fn format_error(err: csv::Error) -> Error {
    let line = err.position().map(|p| p.line()).unwrap_or_default();
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!(
            "row has {} fields but the header has {}",
            len, expected_len
        ),
        _ => err.to_string(),
    };
    Error::Format { line, message }
}
