//! Meter export header dialects
//!
//! Providers label the same three columns (date, time, consumption) in
//! different languages and layouts. A [`MeterDialect`] recognises its header
//! row and maps it onto a [`ColumnMap`]; everything after that works on the
//! dialect-neutral [`RawReading`] shape.

use tariffscope_core::types::Reading;

/// One decoded CSV record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Date, time and value text of one data row, before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    pub line: usize,
    pub date: String,
    pub time: String,
    pub value: String,
}

impl RawReading {
    pub fn new(
        line: usize,
        date: impl Into<String>,
        time: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            line,
            date: date.into(),
            time: time.into(),
            value: value.into(),
        }
    }

    /// Render a normalized reading back into raw form
    pub fn from_reading(line: usize, reading: &Reading) -> Self {
        let dt = reading.timestamp.inner();
        Self::new(
            line,
            dt.format("%Y-%m-%d").to_string(),
            dt.format("%H:%M:%S").to_string(),
            reading.kwh.to_string(),
        )
    }
}

/// Where the timestamp lives in a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampColumns {
    /// Separate date and time columns
    Split { date: usize, time: usize },
    /// One `YYYY-MM-DD HH:MM[:SS]` column
    Combined(usize),
}

/// Column layout recognised from a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: TimestampColumns,
    pub value: usize,
}

impl ColumnMap {
    /// Column holding the date part, used to tell data rows from footers
    pub fn date_column(&self) -> usize {
        match self.timestamp {
            TimestampColumns::Split { date, .. } => date,
            TimestampColumns::Combined(idx) => idx,
        }
    }

    /// Pull date, time and value text out of a row; missing cells become empty
    pub fn extract(&self, row: &RawRow) -> RawReading {
        let (date, time) = match self.timestamp {
            TimestampColumns::Split { date, time } => {
                (row.field(date).to_string(), row.field(time).to_string())
            }
            TimestampColumns::Combined(idx) => {
                let cell = row.field(idx);
                let (date, time) = cell
                    .split_once(' ')
                    .or_else(|| cell.split_once('T'))
                    .unwrap_or((cell, ""));
                (date.trim().to_string(), time.trim().to_string())
            }
        };
        RawReading::new(row.line, date, time, row.field(self.value))
    }
}

/// A provider header dialect
pub trait MeterDialect: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Column layout when `header` is this dialect's header row
    fn columns(&self, header: &[String]) -> Option<ColumnMap>;
}

fn find_column(header: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    header.iter().position(|cell| pred(cell.as_str()))
}

fn is_value_column(cell: &str) -> bool {
    let cell = cell.to_lowercase();
    cell.contains("kwh") || cell.contains("consumption") || cell.contains("usage")
}

/// Israel Electric Corporation export: `תאריך`, `מועד תחילת הפעימה`, `צריכה בקוט"ש`
#[derive(Debug, Default, Clone, Copy)]
pub struct IecHebrew;

impl MeterDialect for IecHebrew {
    fn name(&self) -> &'static str {
        "iec-hebrew"
    }

    fn columns(&self, header: &[String]) -> Option<ColumnMap> {
        let date = find_column(header, |cell| cell.contains("תאריך"))?;
        let value = find_column(header, |cell| cell.contains("צריכה"))?;
        let time = header
            .iter()
            .enumerate()
            .position(|(idx, cell)| {
                idx != date && (cell.contains("מועד") || cell.contains("שעה"))
            })?;
        Some(ColumnMap {
            timestamp: TimestampColumns::Split { date, time },
            value,
        })
    }
}

/// The normalizer's own export: `timestamp,kwh_consumption`
#[derive(Debug, Default, Clone, Copy)]
pub struct Canonical;

impl MeterDialect for Canonical {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn columns(&self, header: &[String]) -> Option<ColumnMap> {
        let timestamp = find_column(header, |cell| cell.eq_ignore_ascii_case("timestamp"))?;
        let value = find_column(header, is_value_column)?;
        Some(ColumnMap {
            timestamp: TimestampColumns::Combined(timestamp),
            value,
        })
    }
}

/// English headers with separate `date` and `time` columns
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishColumns;

impl MeterDialect for EnglishColumns {
    fn name(&self) -> &'static str {
        "english"
    }

    fn columns(&self, header: &[String]) -> Option<ColumnMap> {
        let date = find_column(header, |cell| {
            let cell = cell.to_lowercase();
            cell.contains("date") && !cell.contains("time")
        })?;
        let time = find_column(header, |cell| {
            let cell = cell.to_lowercase();
            cell.contains("time") && !cell.contains("timestamp") && !cell.contains("date")
        })?;
        let value = find_column(header, is_value_column)?;
        Some(ColumnMap {
            timestamp: TimestampColumns::Split { date, time },
            value,
        })
    }
}

/// Dialects tried in order on every row until one matches
pub fn builtin_dialects() -> Vec<Box<dyn MeterDialect>> {
    vec![
        Box::new(IecHebrew),
        Box::new(Canonical),
        Box::new(EnglishColumns),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn test_iec_header() {
        let cells = header(&["תאריך", "מועד תחילת הפעימה", "צריכה בקוט\"ש"]);
        let map = IecHebrew.columns(&cells).unwrap();
        assert_eq!(map.timestamp, TimestampColumns::Split { date: 0, time: 1 });
        assert_eq!(map.value, 2);

        assert!(IecHebrew.columns(&header(&["שם לקוח", "ישראל ישראלי"])).is_none());
    }

    #[test]
    fn test_canonical_header() {
        let map = Canonical
            .columns(&header(&["timestamp", "kwh_consumption"]))
            .unwrap();
        assert_eq!(map.timestamp, TimestampColumns::Combined(0));
        assert_eq!(map.value, 1);
    }

    #[test]
    fn test_english_header() {
        let map = EnglishColumns
            .columns(&header(&["Date", "Start Time", "Consumption (kWh)"]))
            .unwrap();
        assert_eq!(map.timestamp, TimestampColumns::Split { date: 0, time: 1 });
        assert_eq!(map.value, 2);

        // A canonical header is not split
        assert!(
            EnglishColumns
                .columns(&header(&["timestamp", "kwh_consumption"]))
                .is_none()
        );
    }

    #[test]
    fn test_extract_combined_timestamp() {
        let map = ColumnMap {
            timestamp: TimestampColumns::Combined(0),
            value: 1,
        };
        let row = RawRow::new(3, header(&["2024-01-01 00:15:00", "0.25"]));
        assert_eq!(
            map.extract(&row),
            RawReading::new(3, "2024-01-01", "00:15:00", "0.25")
        );

        let iso = RawRow::new(4, header(&["2024-01-01T00:30:00", "0.5"]));
        assert_eq!(map.extract(&iso).time, "00:30:00");
    }

    #[test]
    fn test_extract_short_row() {
        let map = ColumnMap {
            timestamp: TimestampColumns::Split { date: 0, time: 1 },
            value: 2,
        };
        let row = RawRow::new(9, header(&["01/01/2024"]));
        assert_eq!(map.extract(&row), RawReading::new(9, "01/01/2024", "", ""));
    }
}
