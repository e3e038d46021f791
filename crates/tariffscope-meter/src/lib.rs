//! Meter export reader and consumption normalizer for tariffscope
//!
//! This crate reads provider CSV exports in any supported header dialect,
//! strips banner and footer metadata, and normalizes the data rows into a
//! canonical, deduplicated, sorted consumption series.

pub mod data_loader;
pub mod dialect;
pub mod normalizer;

pub use data_loader::{DataLoader, MeterExport, MeterMetadata, write_canonical_csv};
pub use dialect::{MeterDialect, RawReading, RawRow};
pub use normalizer::{MalformedRow, NormalizeReport, Normalized, Normalizer};
