//! Resolved settings for one invocation
//!
//! clap fills in flags and `TARIFFSCOPE_*` environment variables; this
//! module validates them and locates inputs on disk.

use std::path::{Path, PathBuf};

use tariffscope_core::error::{Result, TariffscopeError};
use tariffscope_meter::normalizer::Normalizer;
use tariffscope_pricing::catalog::PlanCatalog;
use tracing::debug;
use walkdir::WalkDir;

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Settings {
    plans: Option<PathBuf>,
    normalizer: Normalizer,
    default_rate: f64,
}

impl Settings {
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a threshold outside (0, 1] or a negative
    /// or non-finite default rate.
    pub fn new(plans: Option<PathBuf>, threshold: f64, default_rate: f64) -> Result<Self> {
        let normalizer = Normalizer::new(threshold)?;
        if !(default_rate.is_finite() && default_rate >= 0.0) {
            return Err(TariffscopeError::InvalidArgument(format!(
                "default rate {default_rate} must be a non-negative number"
            )));
        }
        Ok(Self {
            plans,
            normalizer,
            default_rate,
        })
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn threshold(&self) -> f64 {
        self.normalizer.completeness_threshold()
    }

    /// The configured catalog path, or the first one discovered
    pub fn catalog_path(&self) -> Result<PathBuf> {
        match &self.plans {
            Some(path) => Ok(path.clone()),
            None => PlanCatalog::discover_path(),
        }
    }

    pub fn load_catalog(&self) -> Result<PlanCatalog> {
        PlanCatalog::load(&self.catalog_path()?, self.default_rate)
    }
}

/// Expand directories into the CSV files beneath them, in path order
///
/// Files named explicitly are kept whatever their extension.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_csv(entry.path()) {
                found.push(entry.into_path());
            }
        }
        debug!("Found {} exports under {}", found.len(), input.display());
        files.extend(found);
    }
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_validation() {
        assert!(Settings::new(None, 0.9, 0.64015).is_ok());
        assert!(Settings::new(None, 0.0, 0.64015).is_err());
        assert!(Settings::new(None, 0.9, -1.0).is_err());
        assert!(Settings::new(None, 0.9, f64::INFINITY).is_err());
    }

    #[test]
    fn test_explicit_catalog_path() {
        let settings = Settings::new(Some(PathBuf::from("plans.csv")), 0.9, 0.5).unwrap();
        assert_eq!(settings.catalog_path().unwrap(), PathBuf::from("plans.csv"));
        assert_eq!(settings.threshold(), 0.9);
    }

    #[test]
    fn test_expand_inputs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.csv"), "").unwrap();
        fs::write(nested.join("a.CSV"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let explicit = PathBuf::from("meter.txt");
        let files = expand_inputs(&[explicit.clone(), dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            files,
            vec![explicit, nested.join("a.CSV"), dir.path().join("b.csv")]
        );
    }
}
