//! tariffscope - Rank time-of-use electricity plans against meter exports
//!
//! This library provides functionality to:
//! - Read 15-minute interval meter exports in several header dialects
//! - Normalize them into a deduplicated series with month completeness
//! - Simulate every catalog plan's discount over the complete months
//! - Rank plans by savings and render tables, JSON and CSV
//!
//! # Examples
//!
//! ```no_run
//! use tariffscope::{analysis::Analyzer, config::Settings};
//! use std::path::Path;
//!
//! fn main() -> tariffscope::Result<()> {
//!     let settings = Settings::new(None, 0.9, 0.64015)?;
//!     let catalog = settings.load_catalog()?;
//!
//!     let analysis = Analyzer::new(settings.normalizer())
//!         .analyze_path(Path::new("meter_23278570_LP.csv"), catalog.plans())?;
//!     if let Some(best) = analysis.ranking.best() {
//!         println!("{} saves {:.2}", best.plan.plan_name, best.result.savings_amount);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod output;

pub use tariffscope_core::{aggregation_types, error, series, types};
pub use tariffscope_meter as meter;
pub use tariffscope_pricing as pricing;

// Re-export commonly used types
pub use error::{Result, TariffscopeError};
pub use types::{DiscountWindow, IntervalTimestamp, Plan, PlanId, Reading, YearMonth};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
