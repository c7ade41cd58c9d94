//! Record serialization formats
//!
//! CSV is the primary on-disk format. JSON (array of objects with the same
//! field names) is accepted for import and produced for export, and an XLSX
//! workbook can be exported. Every decoder hands its rows to the schema
//! normalizer, so all formats share the same column rules.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::collection::Collection;
use crate::schema::{normalize, RawRecord, COLUMNS};
use crate::storage::{StorageError, StorageResult};

/// Worksheet name used for spreadsheet exports
pub const SHEET_NAME: &str = "Knowledge";

/// A supported file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Xlsx,
}

impl FileFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Xlsx => "xlsx",
        }
    }

    /// Whether records can be read back from this format
    pub fn is_readable(&self) -> bool {
        !matches!(self, FileFormat::Xlsx)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "xlsx" | "excel" => Ok(FileFormat::Xlsx),
            other => Err(format!("unknown format '{other}' (expected csv, json or xlsx)")),
        }
    }
}

/// Errors raised while decoding record data
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Decode CSV bytes with a header row
///
/// Short rows are padded with blanks; rows longer than the header are rejected.
pub fn read_csv(bytes: &[u8]) -> Result<Collection, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(DecodeError::RaggedRow {
                row: index + 2,
                found: record.len(),
                expected: headers.len(),
            });
        }
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(normalize(rows))
}

/// Decode a JSON array of objects
///
/// Non-string scalars are converted to text; `null` becomes blank.
pub fn read_json(bytes: &[u8]) -> Result<Collection, DecodeError> {
    let objects: Vec<Map<String, Value>> = serde_json::from_slice(bytes)?;
    let rows = objects.into_iter().map(|object| {
        object
            .into_iter()
            .map(|(name, value)| (name, json_text(value)))
            .collect::<RawRecord>()
    });
    Ok(normalize(rows))
}

fn json_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Decode bytes in the given format
pub fn decode(bytes: &[u8], format: FileFormat) -> Result<Option<Collection>, DecodeError> {
    match format {
        FileFormat::Csv => read_csv(bytes).map(Some),
        FileFormat::Json => read_json(bytes).map(Some),
        FileFormat::Xlsx => Ok(None),
    }
}

/// Encode as CSV with a header row
///
/// The header is written even when the collection is empty.
pub fn write_csv(collection: &Collection) -> StorageResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for record in collection {
        writer.write_record(record.to_row())?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}

/// Encode as a pretty-printed JSON array
pub fn write_json(collection: &Collection) -> StorageResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(collection)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Encode as an XLSX workbook with a single sheet
pub fn write_xlsx(collection: &Collection) -> StorageResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (index, record) in collection.iter().enumerate() {
        let row = index as u32 + 1;
        if let Some(id) = record.id {
            sheet.write_number(row, 0, id as f64)?;
        }
        for (col, value) in record.to_row().iter().enumerate().skip(1) {
            sheet.write_string(row, col as u16, value.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Encode in the given format
pub fn encode(collection: &Collection, format: FileFormat) -> StorageResult<Vec<u8>> {
    match format {
        FileFormat::Csv => write_csv(collection),
        FileFormat::Json => write_json(collection),
        FileFormat::Xlsx => write_xlsx(collection),
    }
}

/// A CSV file holding only the header row
pub fn template_csv() -> StorageResult<Vec<u8>> {
    write_csv(&Collection::new())
}
