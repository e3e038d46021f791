//! Error types for tariffscope
//!
//! This module defines the error types used throughout the tariffscope crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use tariffscope_core::error::{TariffscopeError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to TariffscopeError
//!     let _file = std::fs::read_to_string("nonexistent.csv")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::PlanId;

/// Main error type for tariffscope operations
///
/// Row-level problems (`MalformedRow`) are recovered by the normalizer and
/// plan-level problems (`InvalidPlan`) by the recommender; everything else
/// aborts the current upload or invocation.
#[derive(Error, Debug)]
pub enum TariffscopeError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A data row could not be turned into a reading
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line in the source file
        line: usize,
        /// What failed to parse
        reason: String,
    },

    /// No calendar month met the completeness threshold
    #[error(
        "No usable consumption data: {readings} readings, no month reached {threshold:.0}% completeness"
    )]
    NoUsableData {
        /// Readings that survived parsing
        readings: usize,
        /// Threshold in percent
        threshold: f64,
    },

    /// A catalog entry violates a plan invariant
    #[error("Invalid plan {id}: {reason}")]
    InvalidPlan {
        /// Offending plan
        id: PlanId,
        /// Violated invariant
        reason: String,
    },

    /// No supported header row was found in a meter export
    #[error("No consumption table header found in {0}")]
    NoHeader(PathBuf),

    /// No plan catalog was given and none could be discovered
    #[error("Plan catalog not found (pass --plans or set TARIFFSCOPE_PLANS)")]
    CatalogNotFound,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in tariffscope
///
/// # Example
///
/// ```
/// use tariffscope_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TariffscopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TariffscopeError::CatalogNotFound;
        assert_eq!(
            error.to_string(),
            "Plan catalog not found (pass --plans or set TARIFFSCOPE_PLANS)"
        );
    }

    #[test]
    fn test_malformed_row_display() {
        let error = TariffscopeError::MalformedRow {
            line: 12,
            reason: "invalid kWh value 'abc'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed row at line 12: invalid kWh value 'abc'"
        );
    }

    #[test]
    fn test_no_usable_data_display() {
        let error = TariffscopeError::NoUsableData {
            readings: 40,
            threshold: 90.0,
        };
        assert_eq!(
            error.to_string(),
            "No usable consumption data: 40 readings, no month reached 90% completeness"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: TariffscopeError = io_error.into();
        assert!(matches!(error, TariffscopeError::Io(_)));
    }
}
