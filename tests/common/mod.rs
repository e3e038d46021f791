//! Common test utilities and helpers for tariffscope tests
//!
//! Builders for plans and readings, plus writers for meter exports and plan
//! catalogs on disk.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tariffscope::{
    IntervalTimestamp, Plan, PlanId, Reading, YearMonth, series::ConsumptionSeries,
};

// Serializes environment variable changes across tests
pub static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Builder for test plans
pub struct PlanBuilder {
    id: u32,
    provider_name: String,
    plan_name: String,
    base_rate_per_kwh: f64,
    discount_percent: f64,
    window: String,
}

impl PlanBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            provider_name: format!("Provider {id}"),
            plan_name: format!("Plan {id}"),
            base_rate_per_kwh: 0.5,
            discount_percent: 0.2,
            window: "14:00-20:00".to_string(),
        }
    }

    pub fn provider(mut self, name: &str) -> Self {
        self.provider_name = name.to_string();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.plan_name = name.to_string();
        self
    }

    pub fn base_rate(mut self, rate: f64) -> Self {
        self.base_rate_per_kwh = rate;
        self
    }

    pub fn discount(mut self, discount: f64) -> Self {
        self.discount_percent = discount;
        self
    }

    pub fn window(mut self, window: &str) -> Self {
        self.window = window.to_string();
        self
    }

    pub fn build(self) -> Plan {
        Plan {
            id: PlanId::new(self.id),
            provider_name: self.provider_name,
            plan_name: self.plan_name,
            base_rate_per_kwh: self.base_rate_per_kwh,
            discount_percent: self.discount_percent,
            discount_window: self.window.parse().expect("valid test window"),
            provider_url: None,
            logo_filename: None,
        }
    }
}

pub fn timestamp(date: NaiveDate, index: u32) -> IntervalTimestamp {
    let dt: NaiveDateTime = date
        .and_hms_opt(index / 4, (index % 4) * 15, 0)
        .expect("valid test time");
    IntervalTimestamp::new(dt).expect("aligned test time")
}

/// Every reading of a calendar month, consumption chosen per interval index
pub fn month_readings(year: i32, month: u32, kwh: impl Fn(u32) -> f64) -> Vec<Reading> {
    let days = YearMonth::new(year, month)
        .expect("valid test month")
        .days_in_month();
    let mut readings = Vec::with_capacity(days as usize * 96);
    for day in 1..=days {
        let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid test date");
        for index in 0..96 {
            readings.push(Reading::new(timestamp(date, index), kwh(index)));
        }
    }
    readings
}

pub fn series(readings: Vec<Reading>) -> ConsumptionSeries {
    ConsumptionSeries::new(readings, 0.9).expect("valid threshold")
}

/// Render readings as an Israel Electric Corporation export
pub fn iec_export(readings: &[Reading], customer: &str, meter: &str) -> String {
    let mut content = String::from("\u{feff}");
    writeln!(content, "\"שם לקוח\",\"{customer}\"").unwrap();
    writeln!(content, "\"מספר מונה\",\"{meter}\"").unwrap();
    content.push('\n');
    writeln!(content, "\"תאריך\",\"מועד תחילת הפעימה\",\"צריכה בקוט\"\"ש\"").unwrap();
    let mut total = 0.0;
    for reading in readings {
        let dt = reading.timestamp.inner();
        writeln!(
            content,
            "\"{}\",\"{}\",\"{}\"",
            dt.format("%d/%m/%Y"),
            dt.format("%H:%M"),
            reading.kwh
        )
        .unwrap();
        total += reading.kwh;
    }
    writeln!(content, "\"סה\"\"כ\",\"\",\"{total:.3}\"").unwrap();
    content
}

pub fn write_iec_export(dir: &Path, name: &str, readings: &[Reading]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, iec_export(readings, "ישראל ישראלי", "23278570")).unwrap();
    path
}

/// Write plans in the canonical catalog layout
pub fn write_catalog(dir: &Path, plans: &[Plan]) -> PathBuf {
    let mut content = String::from(
        "id,provider_name,plan_name,base_rate_per_kwh,discount_percent,discount_window_start,discount_window_end,provider_url,logo_filename\n",
    );
    for plan in plans {
        writeln!(
            content,
            "{},{},{},{},{},{},{},,",
            plan.id.get(),
            plan.provider_name,
            plan.plan_name,
            plan.base_rate_per_kwh,
            plan.discount_percent,
            plan.discount_window.start.format("%H:%M"),
            plan.discount_window.end.format("%H:%M"),
        )
        .unwrap();
    }
    let path = dir.join("electrical_plans.csv");
    fs::write(&path, content).unwrap();
    path
}
