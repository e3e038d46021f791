//! Plan catalog loading
//!
//! The catalog is a CSV file of time-of-use plans. Besides the canonical
//! columns it accepts the older layout (`provider`, `price_percentage_off` in
//! whole percent, `hours_applicable` as `HH:MM-HH:MM`). Rows are returned
//! unvalidated; the recommender decides which plans are rankable.
//!
//! # Examples
//!
//! ```
//! use tariffscope_pricing::catalog::PlanCatalog;
//!
//! let csv = "\
//! id,provider_name,plan_name,base_rate_per_kwh,discount_percent,discount_window_start,discount_window_end
//! 1,Electra,Night,0.6,0.2,23:00,07:00
//! ";
//! let catalog = PlanCatalog::from_reader(csv.as_bytes(), 0.64).unwrap();
//! assert_eq!(catalog.len(), 1);
//! assert!(catalog.plans()[0].discount_window.wraps_midnight());
//! ```

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tariffscope_core::error::{Result, TariffscopeError};
use tariffscope_core::types::{DiscountWindow, Plan, PlanId, parse_time_of_day};
use tracing::{debug, info};

/// File name looked up in the working and config directories
pub const CATALOG_FILE_NAME: &str = "electrical_plans.csv";

/// Environment variable naming the catalog path
pub const PLANS_ENV_VAR: &str = "TARIFFSCOPE_PLANS";

/// Base rate for rows without one: 0.5425 per kWh plus 18% VAT
pub const DEFAULT_BASE_RATE: f64 = 0.64015;

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    id: Option<u32>,
    #[serde(alias = "provider")]
    provider_name: String,
    #[serde(default)]
    plan_name: Option<String>,
    #[serde(default)]
    base_rate_per_kwh: Option<f64>,
    #[serde(default)]
    discount_percent: Option<f64>,
    #[serde(default)]
    price_percentage_off: Option<f64>,
    #[serde(default)]
    discount_window_start: Option<String>,
    #[serde(default)]
    discount_window_end: Option<String>,
    #[serde(default)]
    hours_applicable: Option<String>,
    #[serde(default)]
    provider_url: Option<String>,
    #[serde(default)]
    logo_filename: Option<String>,
}

impl CatalogRecord {
    fn into_plan(self, position: usize, default_rate: f64) -> Result<Plan> {
        let id = PlanId::new(self.id.unwrap_or(position as u32));
        let bad_row = |what: &str| {
            TariffscopeError::InvalidArgument(format!("catalog row {position}: {what}"))
        };

        let discount_percent = match (self.discount_percent, self.price_percentage_off) {
            (Some(fraction), _) => fraction,
            (None, Some(percent)) => percent / 100.0,
            (None, None) => return Err(bad_row("missing discount")),
        };

        let discount_window = match (
            self.discount_window_start.as_deref().filter(|s| !s.is_empty()),
            self.discount_window_end.as_deref().filter(|s| !s.is_empty()),
            self.hours_applicable.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(start), Some(end), _) => {
                DiscountWindow::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
            }
            (_, _, Some(range)) => range.parse()?,
            _ => return Err(bad_row("missing discount window")),
        };

        let plan_name = self
            .plan_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.provider_name.clone());

        Ok(Plan {
            id,
            provider_name: self.provider_name,
            plan_name,
            base_rate_per_kwh: self.base_rate_per_kwh.unwrap_or(default_rate),
            discount_percent,
            discount_window,
            provider_url: self.provider_url.filter(|s| !s.is_empty()),
            logo_filename: self.logo_filename.filter(|s| !s.is_empty()),
        })
    }
}

/// Ordered list of catalog plans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Load a catalog file
    ///
    /// # Errors
    ///
    /// Returns `Io`/`Csv` errors for unreadable files and `InvalidArgument`
    /// for a row whose discount or window cannot be read.
    pub fn load(path: &Path, default_rate: f64) -> Result<Self> {
        info!("Loading plan catalog from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file, default_rate)
    }

    /// Load a catalog from any CSV source
    pub fn from_reader<R: Read>(reader: R, default_rate: f64) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut plans = Vec::new();
        for (idx, record) in csv_reader.deserialize::<CatalogRecord>().enumerate() {
            let plan = record?.into_plan(idx + 1, default_rate)?;
            debug!("Catalog plan {}: {} / {}", plan.id, plan.provider_name, plan.plan_name);
            plans.push(plan);
        }

        info!("Loaded {} plans", plans.len());
        Ok(Self { plans })
    }

    /// Find the catalog when no path was given
    ///
    /// Looks at `TARIFFSCOPE_PLANS`, then `./electrical_plans.csv`, then
    /// `<config_dir>/tariffscope/electrical_plans.csv`.
    pub fn discover_path() -> Result<PathBuf> {
        let candidates = candidate_paths(
            env::var_os(PLANS_ENV_VAR).map(PathBuf::from),
            env::current_dir().ok(),
            dirs::config_dir(),
        );
        candidates
            .into_iter()
            .find(|path| {
                debug!("Looking for plan catalog at {}", path.display());
                path.is_file()
            })
            .ok_or(TariffscopeError::CatalogNotFound)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

fn candidate_paths(
    from_env: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    candidates.extend(from_env);
    candidates.extend(working_dir.map(|dir| dir.join(CATALOG_FILE_NAME)));
    candidates.extend(config_dir.map(|dir| dir.join("tariffscope").join(CATALOG_FILE_NAME)));
    candidates
}
