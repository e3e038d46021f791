//! Canonical consumption series
//!
//! A [`ConsumptionSeries`] is built once from parsed readings and never
//! changes afterwards. Construction deduplicates timestamps (the later reading
//! wins), sorts ascending, and derives the per-month completeness that decides
//! which months take part in billing.
//!
//! # Examples
//!
//! ```
//! use tariffscope_core::series::ConsumptionSeries;
//! use tariffscope_core::types::{IntervalTimestamp, Reading};
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//! let readings: Vec<Reading> = (0..96u32)
//!     .map(|i| {
//!         let dt = day.and_hms_opt(i / 4, (i % 4) * 15, 0).unwrap();
//!         Reading::new(IntervalTimestamp::new(dt).unwrap(), 1.0)
//!     })
//!     .collect();
//!
//! // One day out of 29 is far from complete
//! let series = ConsumptionSeries::new(readings, 0.9).unwrap();
//! assert_eq!(series.len(), 96);
//! assert!(series.active_months().is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::aggregation_types::{HourlyProfile, MonthSummary, MonthlyHourlyUsage, SeriesStats};
use crate::error::{Result, TariffscopeError};
use crate::types::{IntervalTimestamp, Reading, YearMonth};
use chrono::Timelike;

/// Default share of a month's intervals that must be present
pub const DEFAULT_COMPLETENESS_THRESHOLD: f64 = 0.9;

/// Ordered, gap-aware sequence of readings with month completeness
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionSeries {
    readings: Vec<Reading>,
    months: Vec<MonthSummary>,
    completeness_threshold: f64,
    duplicates_replaced: usize,
}

impl ConsumptionSeries {
    /// Build a series from readings in input order
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the threshold is outside (0, 1].
    pub fn new(readings: Vec<Reading>, completeness_threshold: f64) -> Result<Self> {
        validate_threshold(completeness_threshold)?;

        let input_len = readings.len();
        let mut by_timestamp: BTreeMap<IntervalTimestamp, Reading> = BTreeMap::new();
        for reading in readings {
            by_timestamp.insert(reading.timestamp, reading);
        }
        let readings: Vec<Reading> = by_timestamp.into_values().collect();
        let duplicates_replaced = input_len - readings.len();
        if duplicates_replaced > 0 {
            debug!("Replaced {} duplicate readings", duplicates_replaced);
        }

        let months = summarize_months(&readings, completeness_threshold);
        Ok(Self {
            readings,
            months,
            completeness_threshold,
            duplicates_replaced,
        })
    }

    /// All readings, ascending by timestamp
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn completeness_threshold(&self) -> f64 {
        self.completeness_threshold
    }

    /// Number of input readings dropped because a later one shared the timestamp
    pub fn duplicates_replaced(&self) -> usize {
        self.duplicates_replaced
    }

    /// Per-month completeness, ascending, including inactive months
    pub fn months(&self) -> &[MonthSummary] {
        &self.months
    }

    /// Months that met the completeness threshold
    pub fn active_months(&self) -> BTreeSet<YearMonth> {
        self.months
            .iter()
            .filter(|summary| summary.active)
            .map(|summary| summary.month)
            .collect()
    }

    pub fn is_active(&self, month: YearMonth) -> bool {
        self.months
            .binary_search_by(|summary| summary.month.cmp(&month))
            .map(|idx| self.months[idx].active)
            .unwrap_or(false)
    }

    /// Readings whose month is active, ascending
    pub fn active_readings(&self) -> impl Iterator<Item = &Reading> + '_ {
        let active = self.active_months();
        self.readings
            .iter()
            .filter(move |reading| active.contains(&reading.year_month()))
    }

    /// Fail with `NoUsableData` unless at least one month is active
    pub fn require_active_months(&self) -> Result<()> {
        if self.months.iter().any(|summary| summary.active) {
            Ok(())
        } else {
            Err(TariffscopeError::NoUsableData {
                readings: self.readings.len(),
                threshold: self.completeness_threshold * 100.0,
            })
        }
    }

    pub fn stats(&self) -> SeriesStats {
        let total_kwh: f64 = self.readings.iter().map(|r| r.kwh).sum();
        let mean_kwh = if self.readings.is_empty() {
            0.0
        } else {
            total_kwh / self.readings.len() as f64
        };
        SeriesStats {
            readings: self.readings.len(),
            first: self.readings.first().map(|r| r.timestamp),
            last: self.readings.last().map(|r| r.timestamp),
            total_kwh,
            mean_kwh,
        }
    }

    /// Hour-of-day profile over the latest `max_months` active months
    ///
    /// Each hour holds the mean kWh per reading recorded in that hour; hours
    /// without readings are 0.
    pub fn hourly_profile(&self, max_months: usize) -> HourlyProfile {
        let selected: BTreeSet<YearMonth> = self
            .active_months()
            .into_iter()
            .rev()
            .take(max_months)
            .collect();
        if selected.is_empty() {
            return HourlyProfile::default();
        }

        let mut sums: BTreeMap<YearMonth, ([f64; 24], [usize; 24])> = BTreeMap::new();
        for reading in &self.readings {
            let month = reading.year_month();
            if !selected.contains(&month) {
                continue;
            }
            let hour = reading.timestamp.inner().hour() as usize;
            let (kwh, count) = sums.entry(month).or_insert(([0.0; 24], [0; 24]));
            kwh[hour] += reading.kwh;
            count[hour] += 1;
        }

        let months: Vec<MonthlyHourlyUsage> = sums
            .into_iter()
            .map(|(month, (kwh, count))| {
                let mut hours = [0.0; 24];
                for hour in 0..24 {
                    if count[hour] > 0 {
                        hours[hour] = kwh[hour] / count[hour] as f64;
                    }
                }
                MonthlyHourlyUsage { month, hours }
            })
            .collect();

        let mut average = [0.0; 24];
        for (hour, slot) in average.iter_mut().enumerate() {
            *slot = months.iter().map(|m| m.hours[hour]).sum::<f64>() / months.len() as f64;
        }

        HourlyProfile {
            months,
            average: Some(average),
        }
    }
}

/// Check a completeness threshold is in (0, 1]
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(TariffscopeError::InvalidArgument(format!(
            "completeness threshold {threshold} must be in (0, 1]"
        )))
    }
}

fn summarize_months(readings: &[Reading], threshold: f64) -> Vec<MonthSummary> {
    let mut per_month: BTreeMap<YearMonth, (usize, f64)> = BTreeMap::new();
    for reading in readings {
        let (count, kwh) = per_month.entry(reading.year_month()).or_insert((0, 0.0));
        *count += 1;
        *kwh += reading.kwh;
    }

    per_month
        .into_iter()
        .map(|(month, (count, total_kwh))| {
            let expected = month.expected_intervals();
            let completeness = count as f64 / expected as f64;
            let active = completeness >= threshold;
            debug!(
                "{}: {}/{} readings ({:.1}%) {}",
                month,
                count,
                expected,
                completeness * 100.0,
                if active { "active" } else { "skipped" }
            );
            MonthSummary {
                month,
                readings: count,
                expected,
                completeness,
                total_kwh,
                active,
            }
        })
        .collect()
}
