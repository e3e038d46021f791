//! Shared test utilities for unit tests
//!
//! Integration tests (in tests/) cannot see this module; they build their
//! fixtures in tests/common/mod.rs.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;
use tariffscope_core::series::ConsumptionSeries;
use tariffscope_core::types::{IntervalTimestamp, Plan, PlanId, Reading, YearMonth};

// Serializes environment variable changes across tests
pub static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// RAII guard restoring environment variables on drop, even after a panic
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        // env::set_var is unsafe since Rust 1.82
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

impl Default for EnvVarGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub fn plan(id: u32, base_rate: f64, discount: f64, window: &str) -> Plan {
    Plan {
        id: PlanId::new(id),
        provider_name: format!("Provider {id}"),
        plan_name: format!("Plan {id}"),
        base_rate_per_kwh: base_rate,
        discount_percent: discount,
        discount_window: window.parse().expect("valid test window"),
        provider_url: None,
        logo_filename: None,
    }
}

fn day_readings(date: NaiveDate, kwh: f64) -> impl Iterator<Item = Reading> {
    (0..96u32).map(move |i| {
        let dt = date
            .and_hms_opt(i / 4, (i % 4) * 15, 0)
            .expect("valid test time");
        Reading::new(IntervalTimestamp::new(dt).expect("aligned test time"), kwh)
    })
}

/// One day of readings with a threshold low enough to make June active
pub fn day_series(kwh: f64) -> ConsumptionSeries {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid test date");
    ConsumptionSeries::new(day_readings(date, kwh).collect(), 0.01).expect("valid threshold")
}

/// A complete calendar month at a constant consumption
pub fn month_series(year: i32, month: u32, kwh: f64) -> ConsumptionSeries {
    let days = YearMonth::new(year, month)
        .expect("valid test month")
        .days_in_month();
    let readings = (1..=days)
        .flat_map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid test date");
            day_readings(date, kwh)
        })
        .collect();
    ConsumptionSeries::new(readings, 0.9).expect("valid threshold")
}
