//! Consumption normalizer
//!
//! Turns dialect-neutral raw rows into a [`ConsumptionSeries`]. Rows that do
//! not parse are never zero-filled: each one is dropped and recorded in the
//! [`NormalizeReport`] so callers can assert on exactly what was skipped.
//!
//! # Examples
//!
//! ```
//! use tariffscope_meter::dialect::RawReading;
//! use tariffscope_meter::normalizer::Normalizer;
//!
//! let rows = vec![
//!     RawReading::new(1, "01/09/2024", "00:00", "0.123"),
//!     RawReading::new(2, "01/09/2024", "00:07", "0.250"),
//!     RawReading::new(3, "01/09/2024", "00:15", ""),
//! ];
//! let normalized = Normalizer::default().collect(rows).unwrap();
//! assert_eq!(normalized.series.len(), 1);
//! assert_eq!(normalized.report.malformed.len(), 2);
//! ```

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use tariffscope_core::error::{Result, TariffscopeError};
use tariffscope_core::series::{ConsumptionSeries, DEFAULT_COMPLETENESS_THRESHOLD, validate_threshold};
use tariffscope_core::types::{IntervalTimestamp, Reading};
use tracing::{debug, info, warn};

use crate::data_loader::MeterExport;
use crate::dialect::RawReading;

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// A row dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub line: usize,
    pub reason: String,
}

/// Accounting of what normalization kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows that parsed into readings, before deduplication
    pub accepted: usize,
    /// Banner, header and footer rows
    pub metadata_rows: usize,
    /// Earlier rows overridden by a later row with the same timestamp
    pub duplicates_replaced: usize,
    pub malformed: Vec<MalformedRow>,
}

impl NormalizeReport {
    /// Total rows not represented in the series
    pub fn skipped(&self) -> usize {
        self.malformed.len() + self.duplicates_replaced
    }
}

/// Normalized series together with its report
#[derive(Debug, Clone)]
pub struct Normalized {
    pub series: ConsumptionSeries,
    pub report: NormalizeReport,
}

/// Converts raw rows into a canonical consumption series
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    completeness_threshold: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            completeness_threshold: DEFAULT_COMPLETENESS_THRESHOLD,
        }
    }
}

impl Normalizer {
    /// Create a normalizer with a month completeness threshold in (0, 1]
    pub fn new(completeness_threshold: f64) -> Result<Self> {
        validate_threshold(completeness_threshold)?;
        Ok(Self {
            completeness_threshold,
        })
    }

    pub fn completeness_threshold(&self) -> f64 {
        self.completeness_threshold
    }

    /// Normalize rows and require at least one active month
    ///
    /// # Errors
    ///
    /// Returns `NoUsableData` when no month reaches the completeness threshold.
    pub fn normalize<I>(&self, rows: I) -> Result<Normalized>
    where
        I: IntoIterator<Item = RawReading>,
    {
        let normalized = self.collect(rows)?;
        normalized.series.require_active_months()?;
        Ok(normalized)
    }

    /// Collect a loaded export, carrying over its metadata row count
    pub fn collect_export(&self, export: MeterExport) -> Result<Normalized> {
        let metadata_rows = export.metadata_rows;
        let mut normalized = self.collect(export.rows)?;
        normalized.report.metadata_rows = metadata_rows;
        Ok(normalized)
    }

    /// Normalize rows without requiring an active month
    ///
    /// Used for inspection: month reports and canonical exports still make
    /// sense for partial uploads.
    pub fn collect<I>(&self, rows: I) -> Result<Normalized>
    where
        I: IntoIterator<Item = RawReading>,
    {
        let mut report = NormalizeReport::default();
        let mut readings = Vec::new();

        for row in rows {
            match parse_row(&row) {
                Ok(reading) => readings.push(reading),
                Err(TariffscopeError::MalformedRow { line, reason }) => {
                    debug!("Skipping line {}: {}", line, reason);
                    report.malformed.push(MalformedRow { line, reason });
                }
                Err(e) => return Err(e),
            }
        }
        report.accepted = readings.len();

        if !report.malformed.is_empty() {
            warn!("Skipped {} malformed rows", report.malformed.len());
        }

        let series = ConsumptionSeries::new(readings, self.completeness_threshold)?;
        report.duplicates_replaced = series.duplicates_replaced();
        info!(
            "Normalized {} readings across {} months ({} active)",
            series.len(),
            series.months().len(),
            series.active_months().len()
        );

        Ok(Normalized { series, report })
    }
}

/// Parse one raw row into a reading
///
/// # Errors
///
/// Returns `MalformedRow` for an unparsable date, time or value, a negative
/// or non-finite value, or a timestamp off the 15-minute grid.
pub fn parse_row(row: &RawReading) -> Result<Reading> {
    let malformed = |reason: String| TariffscopeError::MalformedRow {
        line: row.line,
        reason,
    };

    let date = parse_date(&row.date)
        .ok_or_else(|| malformed(format!("invalid date '{}'", row.date)))?;
    let dt = combine(date, &row.time)
        .ok_or_else(|| malformed(format!("invalid time '{}'", row.time)))?;
    let timestamp = IntervalTimestamp::new(dt)
        .ok_or_else(|| malformed(format!("{dt} is not on a 15-minute boundary")))?;
    let kwh = parse_kwh(&row.value)
        .ok_or_else(|| malformed(format!("invalid kWh value '{}'", row.value)))?;

    Ok(Reading::new(timestamp, kwh))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_matches('"');
    // chrono's %Y also takes short years
    let four_digit_years = s
        .split(['/', '.', '-'])
        .filter(|part| part.len() == 4)
        .count();
    if four_digit_years != 1 {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Join date and time; `24:00` names the next day's `00:00` interval
fn combine(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    let time = time.trim().trim_matches('"');
    if time == "24:00" || time == "24:00:00" {
        return date
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN));
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time, format).ok())
        .map(|t| date.and_time(t))
}

fn parse_kwh(s: &str) -> Option<f64> {
    let s = s.trim().trim_matches('"');
    let value = s
        .parse::<f64>()
        .ok()
        .or_else(|| {
            // Decimal comma, as long as it is the only separator
            (!s.contains('.') && s.matches(',').count() == 1)
                .then(|| s.replace(',', "."))
                .and_then(|dotted| dotted.parse::<f64>().ok())
        })?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
