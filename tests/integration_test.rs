//! Integration tests across the meter, pricing and CLI-facing modules

mod common;

use clap::Parser;
use common::{PlanBuilder, month_readings, series, write_iec_export};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tariffscope::{
    analysis::Analyzer,
    cli::{Cli, Command},
    config::{Settings, expand_inputs},
    meter::{DataLoader, Normalizer, write_canonical_csv},
    pricing::{PlanCatalog, Recommender},
};
use tempfile::TempDir;

#[test]
fn test_legacy_catalog_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("electrical_plans.csv");
    fs::write(
        &path,
        "provider,plan_name,week_days_applicable,hours_applicable,price_percentage_off\n\
         Electra,Night Saver,Sunday-Thursday,23:00-07:00,20\n\
         Pazgas,Always,Sunday-Saturday,00:00-23:59,5\n\
         Broken,Zero,Sunday-Saturday,09:00-09:00,10\n",
    )
    .unwrap();

    let settings = Settings::new(Some(path), 0.9, 0.64015).unwrap();
    let catalog = settings.load_catalog().unwrap();
    assert_eq!(catalog.len(), 3);
    assert!(catalog.plans().iter().all(|p| p.base_rate_per_kwh == 0.64015));

    let ranking = Recommender::new().rank(&series(month_readings(2024, 5, |_| 1.0)), catalog.plans());
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking.rejected.len(), 1);
    assert_eq!(ranking.rejected[0].plan_id.get(), 3);
    // 8 of 24 hours at 20% beats all day at 5%
    assert_eq!(ranking.best().unwrap().plan.provider_name, "Electra");
}

#[test]
fn test_missing_catalog_file() {
    let settings = Settings::new(Some("/nonexistent/plans.csv".into()), 0.9, 0.5).unwrap();
    assert!(settings.load_catalog().is_err());
}

#[test]
fn test_canonical_export_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let readings = month_readings(2024, 7, |i| f64::from(i % 7) * 0.125);
    let export = write_iec_export(dir.path(), "meter.csv", &readings);

    let analyzer = Analyzer::new(Normalizer::default());
    let first = analyzer.load(&export).unwrap();

    let canonical = dir.path().join("clean.csv");
    write_canonical_csv(&first.series, fs::File::create(&canonical).unwrap()).unwrap();
    let second = analyzer.load(&canonical).unwrap();

    assert_eq!(second.dialect, "canonical");
    assert_eq!(second.series, first.series);
    assert!(second.report.malformed.is_empty());
}

#[test]
fn test_english_dialect() {
    let csv = "Date,Start Time,Consumption (kWh)\n\
               2024-03-01,00:00,0.5\n\
               2024-03-01,00:15,0.25\n";
    let export = DataLoader::new()
        .load_reader(Cursor::new(csv), Path::new("english.csv"))
        .unwrap();
    assert_eq!(export.dialect, "english");

    let normalized = Normalizer::default().collect(export.rows).unwrap();
    assert_eq!(normalized.series.len(), 2);
    assert_eq!(normalized.series.stats().total_kwh, 0.75);
}

#[test]
fn test_directory_of_exports() {
    let dir = TempDir::new().unwrap();
    let exports = dir.path().join("exports");
    fs::create_dir(&exports).unwrap();
    write_iec_export(&exports, "a.csv", &month_readings(2024, 1, |_| 1.0));
    write_iec_export(&exports, "b.csv", &month_readings(2024, 2, |_| 2.0));
    fs::write(exports.join("README.txt"), "not an export").unwrap();

    let files = expand_inputs(&[exports]).unwrap();
    assert_eq!(files.len(), 2);

    let plans = vec![PlanBuilder::new(1).window("00:00-12:00").build()];
    let results = Analyzer::new(Normalizer::default()).analyze_all(&files, &plans);
    let savings: Vec<f64> = results
        .iter()
        .map(|r| r.as_ref().unwrap().ranking.best().unwrap().result.savings_amount)
        .collect();
    // February at twice the consumption, 29 days against 31
    assert!(savings[1] > savings[0]);
}

#[test]
fn test_catalog_round_trip() {
    let dir = TempDir::new().unwrap();
    let plans = vec![
        PlanBuilder::new(4).provider("Electra").window("23:00-07:00").build(),
        PlanBuilder::new(9).provider("Cellcom").discount(0.15).build(),
    ];
    let path = common::write_catalog(dir.path(), &plans);
    let catalog = PlanCatalog::load(&path, 0.64015).unwrap();
    assert_eq!(catalog.plans(), plans.as_slice());
}

#[test]
fn test_settings_from_environment() {
    let _lock = common::ENV_MUTEX.lock().unwrap();
    // SAFETY: environment changes are serialized by ENV_MUTEX
    unsafe {
        std::env::set_var("TARIFFSCOPE_THRESHOLD", "0.5");
        std::env::set_var("TARIFFSCOPE_PLANS", "/tmp/plans.csv");
    }

    let cli = Cli::try_parse_from(["tariffscope", "analyze", "meter.csv"]).unwrap();

    unsafe {
        std::env::remove_var("TARIFFSCOPE_THRESHOLD");
        std::env::remove_var("TARIFFSCOPE_PLANS");
    }

    let Command::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    let settings = args.settings().unwrap();
    assert_eq!(settings.threshold(), 0.5);
    assert_eq!(settings.catalog_path().unwrap(), Path::new("/tmp/plans.csv"));
}
