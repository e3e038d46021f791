//! Data loader for meter export files
//!
//! This module decodes provider CSV exports into raw rows, locates the
//! consumption table by its header row, and separates banner/footer metadata
//! from data rows. It also writes a normalized series back out in the
//! canonical `timestamp,kwh_consumption` layout.
//!
//! # Examples
//!
//! ```no_run
//! use tariffscope_meter::data_loader::DataLoader;
//! use std::path::Path;
//!
//! # fn example() -> tariffscope_core::Result<()> {
//! let loader = DataLoader::new();
//! let export = loader.load_path(Path::new("meter_23278570_LP.csv"))?;
//! println!("{} rows in {} dialect", export.rows.len(), export.dialect);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tariffscope_core::error::{Result, TariffscopeError};
use tariffscope_core::series::ConsumptionSeries;
use tracing::{debug, info, trace};

use crate::dialect::{ColumnMap, MeterDialect, RawReading, RawRow, builtin_dialects};

/// Customer details found in the banner rows of an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeterMetadata {
    pub customer_name: Option<String>,
    pub meter_number: Option<String>,
}

/// The consumption table of one export file
#[derive(Debug, Clone, PartialEq)]
pub struct MeterExport {
    /// Name of the dialect whose header matched
    pub dialect: &'static str,
    pub metadata: MeterMetadata,
    /// Banner, header, blank and footer rows that were not data
    pub metadata_rows: usize,
    /// Data rows in file order
    pub rows: Vec<RawReading>,
}

/// Loader for meter export files
///
/// Holds the dialects to try, in order, when looking for the header row.
pub struct DataLoader {
    dialects: Vec<Box<dyn MeterDialect>>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader with the built-in dialects
    pub fn new() -> Self {
        Self {
            dialects: builtin_dialects(),
        }
    }

    /// Load and split one export file
    ///
    /// # Errors
    ///
    /// Returns `Io`/`Csv` errors from reading and `NoHeader` when no dialect
    /// recognises any row.
    pub fn load_path(&self, path: &Path) -> Result<MeterExport> {
        info!("Loading meter export {}", path.display());
        let file = File::open(path)?;
        self.load_reader(file, path)
    }

    /// Load and split an export from any reader; `source` names it in errors
    pub fn load_reader<R: Read>(&self, reader: R, source: &Path) -> Result<MeterExport> {
        let rows = read_rows(reader)?;
        self.extract(rows, source)
    }

    /// Locate the header and split the rows around it
    pub fn extract(&self, rows: Vec<RawRow>, source: &Path) -> Result<MeterExport> {
        let (header_idx, dialect, columns) = self
            .find_header(&rows)
            .ok_or_else(|| TariffscopeError::NoHeader(source.to_path_buf()))?;
        debug!(
            "Found {} header at line {}",
            dialect.name(),
            rows[header_idx].line
        );

        let metadata = scan_banner(&rows[..header_idx]);
        let mut metadata_rows = header_idx + 1;
        let mut data = Vec::with_capacity(rows.len() - metadata_rows);

        for row in &rows[header_idx + 1..] {
            if is_data_row(row, &columns) {
                data.push(columns.extract(row));
            } else {
                trace!("Skipping metadata row at line {}", row.line);
                metadata_rows += 1;
            }
        }

        info!(
            "Extracted {} data rows ({} metadata rows) from {}",
            data.len(),
            metadata_rows,
            source.display()
        );
        Ok(MeterExport {
            dialect: dialect.name(),
            metadata,
            metadata_rows,
            rows: data,
        })
    }

    fn find_header<'a>(
        &'a self,
        rows: &[RawRow],
    ) -> Option<(usize, &'a dyn MeterDialect, ColumnMap)> {
        rows.iter().enumerate().find_map(|(idx, row)| {
            self.dialects.iter().find_map(|dialect| {
                dialect
                    .columns(&row.fields)
                    .map(|columns| (idx, dialect.as_ref(), columns))
            })
        })
    }
}

/// Decode every record of a CSV source
///
/// Records may have any length; cells are trimmed of whitespace and a leading
/// byte-order mark. Invalid UTF-8 is replaced rather than rejected. Each row
/// carries the 1-based line its record starts on.
pub fn read_rows<R: Read>(mut reader: R) -> Result<Vec<RawRow>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut lines = LineCounter::new(&bytes);
    let mut rows = Vec::new();
    for record in csv_reader.byte_records() {
        let record = record?;
        // Record positions are taken before skipped blank lines
        let start = record.position().map_or(0, |pos| pos.byte() as usize);
        let line = lines.line_at(start);
        let fields = record
            .iter()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_matches(|c: char| c == '\u{feff}' || c.is_whitespace())
                    .to_string()
            })
            .collect();
        rows.push(RawRow::new(line, fields));
    }
    Ok(rows)
}

/// Maps increasing byte offsets to line numbers
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
        }
    }

    /// Line of the first non-terminator byte at or after `start`
    fn line_at(&mut self, start: usize) -> usize {
        let mut start = start.clamp(self.offset, self.bytes.len());
        while start < self.bytes.len() && matches!(self.bytes[start], b'\r' | b'\n') {
            start += 1;
        }
        self.line += self.bytes[self.offset..start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.offset = start;
        self.line
    }
}

/// A data row has a date-shaped date cell; anything else is banner or footer
fn is_data_row(row: &RawRow, columns: &ColumnMap) -> bool {
    looks_like_date(&columns.extract(row).date)
}

/// Digits and date separators only, starting with a digit
fn looks_like_date(cell: &str) -> bool {
    cell.starts_with(|c: char| c.is_ascii_digit())
        && cell
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '/' | '.' | '-'))
}

fn scan_banner(rows: &[RawRow]) -> MeterMetadata {
    let mut metadata = MeterMetadata::default();
    for row in rows {
        for (idx, cell) in row.fields.iter().enumerate() {
            if metadata.customer_name.is_none() && cell.contains("שם לקוח") {
                metadata.customer_name = labelled_value(&row.fields, idx);
            } else if metadata.meter_number.is_none() && cell.contains("מונה") {
                metadata.meter_number = labelled_value(&row.fields, idx);
            }
        }
    }
    metadata
}

/// Value of a `label: value` cell, or the next non-empty cell
fn labelled_value(fields: &[String], idx: usize) -> Option<String> {
    if let Some((_, value)) = fields[idx].split_once(':') {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    fields[idx + 1..]
        .iter()
        .find(|cell| !cell.is_empty())
        .cloned()
}

/// Write a series as `timestamp,kwh_consumption`
pub fn write_canonical_csv<W: Write>(series: &ConsumptionSeries, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(["timestamp", "kwh_consumption"])?;
    for reading in series.readings() {
        csv_writer.write_record([
            reading
                .timestamp
                .inner()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            reading.kwh.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
