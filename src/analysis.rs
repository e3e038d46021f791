//! Per-export analysis pipeline
//!
//! Load an export, normalize it, rank the catalog against it. Several
//! exports are processed independently on the rayon pool and returned in
//! input order.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tariffscope_core::aggregation_types::{HourlyProfile, MonthSummary, Ranking, SeriesStats};
use tariffscope_core::error::Result;
use tariffscope_core::series::ConsumptionSeries;
use tariffscope_core::types::Plan;
use tariffscope_meter::data_loader::{DataLoader, MeterMetadata};
use tariffscope_meter::normalizer::{NormalizeReport, Normalizer};
use tariffscope_pricing::recommender::Recommender;
use tracing::info;

/// Months included in the hourly profile
pub const PROFILE_MONTHS: usize = 6;

/// A normalized export, before any ranking
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub source: PathBuf,
    pub dialect: &'static str,
    pub metadata: MeterMetadata,
    pub series: ConsumptionSeries,
    pub report: NormalizeReport,
}

/// Everything reported for one analyzed export
#[derive(Debug, Clone)]
pub struct ExportAnalysis {
    pub source: PathBuf,
    pub dialect: &'static str,
    pub metadata: MeterMetadata,
    pub report: NormalizeReport,
    pub stats: SeriesStats,
    pub months: Vec<MonthSummary>,
    pub ranking: Ranking,
    pub profile: Option<HourlyProfile>,
}

/// Runs the load, normalize and rank steps
pub struct Analyzer {
    loader: DataLoader,
    normalizer: Normalizer,
    recommender: Recommender,
    with_profile: bool,
    show_progress: bool,
}

impl Analyzer {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            loader: DataLoader::new(),
            normalizer,
            recommender: Recommender::new(),
            with_profile: false,
            show_progress: false,
        }
    }

    /// Attach the hourly profile to each analysis
    pub fn with_profile(mut self, with_profile: bool) -> Self {
        self.with_profile = with_profile;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Load and normalize an export without requiring an active month
    pub fn load(&self, path: &Path) -> Result<LoadedExport> {
        let export = self.loader.load_path(path)?;
        let dialect = export.dialect;
        let metadata = export.metadata.clone();
        let normalized = self.normalizer.collect_export(export)?;

        Ok(LoadedExport {
            source: path.to_path_buf(),
            dialect,
            metadata,
            series: normalized.series,
            report: normalized.report,
        })
    }

    /// Analyze one export against the catalog
    ///
    /// # Errors
    ///
    /// Fails on unreadable files and with `NoUsableData` when no month is
    /// complete enough to bill.
    pub fn analyze_path(&self, path: &Path, plans: &[Plan]) -> Result<ExportAnalysis> {
        let loaded = self.load(path)?;
        loaded.series.require_active_months()?;

        let ranking = self.recommender.rank(&loaded.series, plans);
        let profile = self
            .with_profile
            .then(|| loaded.series.hourly_profile(PROFILE_MONTHS));
        info!(
            "Analyzed {}: {} plans ranked",
            path.display(),
            ranking.len()
        );

        Ok(ExportAnalysis {
            stats: loaded.series.stats(),
            months: loaded.series.months().to_vec(),
            source: loaded.source,
            dialect: loaded.dialect,
            metadata: loaded.metadata,
            report: loaded.report,
            ranking,
            profile,
        })
    }

    /// Analyze several exports in parallel; results keep input order
    pub fn analyze_all(&self, paths: &[PathBuf], plans: &[Plan]) -> Vec<Result<ExportAnalysis>> {
        let progress = (self.show_progress && paths.len() > 1).then(|| {
            let pb = ProgressBar::new(paths.len() as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message("Analyzing meter exports");
            pb
        });

        let results = paths
            .par_iter()
            .map(|path| {
                let result = self.analyze_path(path, plans);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                result
            })
            .collect();

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        results
    }
}
