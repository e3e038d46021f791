//! tariffscope - Rank time-of-use electricity plans against meter exports

use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter};
use tariffscope::{
    analysis::Analyzer,
    cli::{AnalyzeArgs, Cli, Command, MonthsArgs, NormalizeArgs},
    config::expand_inputs,
    error::{Result, TariffscopeError},
    output::{OutputFormatter, get_formatter, write_ranking_csv},
};
use tariffscope_meter::data_loader::write_canonical_csv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet unless --verbose; logs go to stderr so stdout stays parseable
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tariffscope=info"))
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let formatter = get_formatter(cli.json);
    match &cli.command {
        Command::Analyze(args) => run_analyze(args, cli.json, formatter.as_ref()),
        Command::Normalize(args) => run_normalize(args, formatter.as_ref()),
        Command::Months(args) => run_months(args, formatter.as_ref()),
    }
}

fn run_analyze(args: &AnalyzeArgs, json: bool, formatter: &dyn OutputFormatter) -> Result<()> {
    info!("Running plan analysis");
    let settings = args.settings()?;
    let catalog = settings.load_catalog()?;
    let files = expand_inputs(&args.files)?;
    if files.is_empty() {
        return Err(TariffscopeError::InvalidArgument(
            "no meter exports found in the given paths".to_string(),
        ));
    }

    let show_progress = !json && is_terminal::is_terminal(io::stderr());
    let analyzer = Analyzer::new(settings.normalizer())
        .with_profile(args.profile)
        .with_progress(show_progress);

    let mut analyses = Vec::with_capacity(files.len());
    let mut first_error = None;
    for (path, result) in files.iter().zip(analyzer.analyze_all(&files, catalog.plans())) {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                if !json {
                    eprintln!("{} {}: {}", "error:".red().bold(), path.display(), e);
                }
                first_error.get_or_insert(e);
            }
        }
    }

    println!("{}", formatter.format_analyses(&analyses, args.top));

    if let Some(export) = &args.export {
        write_ranking_csv(&analyses, BufWriter::new(File::create(export)?))?;
        info!("Wrote ranking to {}", export.display());
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_normalize(args: &NormalizeArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    info!("Normalizing {}", args.file.display());
    let settings = args.threshold.settings()?;
    let loaded = Analyzer::new(settings.normalizer()).load(&args.file)?;

    match &args.output {
        Some(path) => {
            write_canonical_csv(&loaded.series, BufWriter::new(File::create(path)?))?;
            println!("{}", formatter.format_normalized(&loaded, Some(path)));
        }
        None => {
            // The CSV owns stdout; the summary goes to stderr
            write_canonical_csv(&loaded.series, io::stdout().lock())?;
            eprintln!("{}", formatter.format_normalized(&loaded, None));
        }
    }
    Ok(())
}

fn run_months(args: &MonthsArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    info!("Checking month completeness of {}", args.file.display());
    let settings = args.threshold.settings()?;
    let loaded = Analyzer::new(settings.normalizer()).load(&args.file)?;
    println!(
        "{}",
        formatter.format_months(&loaded.source, loaded.series.months(), settings.threshold())
    );
    Ok(())
}
