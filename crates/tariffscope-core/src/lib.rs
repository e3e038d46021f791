//! Core types and utilities for tariffscope
//!
//! This crate provides the foundational types, error handling, and the
//! canonical consumption series shared by the meter normalizer, the
//! recommendation engine, and the CLI.

pub mod aggregation_types;
pub mod error;
pub mod series;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use aggregation_types::{BillingResult, MonthSummary, RankedPlan, Ranking, RejectedPlan};
pub use error::{Result, TariffscopeError};
pub use series::ConsumptionSeries;
pub use types::{DiscountWindow, IntervalTimestamp, Plan, PlanId, Reading, YearMonth};
