//! Shared test utilities for unit tests
//!
//! Note: Integration tests (in tests/) cannot access this module because it's
//! marked with #[cfg(test)]. Integration tests have their own builders in
//! tests/common/mod.rs.

use chrono::NaiveDate;

use crate::types::{IntervalTimestamp, Reading, YearMonth};

/// Reading at a wall-clock time that must sit on the interval grid
pub fn reading_at(year: i32, month: u32, day: u32, hour: u32, minute: u32, kwh: f64) -> Reading {
    let dt = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test datetime");
    Reading::new(IntervalTimestamp::new(dt).expect("aligned test datetime"), kwh)
}

/// All 96 readings of one day at a constant consumption
pub fn day_of_readings(year: i32, month: u32, day: u32, kwh: f64) -> Vec<Reading> {
    (0..96u32)
        .map(|i| reading_at(year, month, day, i / 4, (i % 4) * 15, kwh))
        .collect()
}

/// Every reading of a calendar month at a constant consumption
pub fn month_of_readings(year: i32, month: u32, kwh: f64) -> Vec<Reading> {
    let days = YearMonth::new(year, month)
        .expect("valid test month")
        .days_in_month();
    (1..=days)
        .flat_map(|day| day_of_readings(year, month, day, kwh))
        .collect()
}
