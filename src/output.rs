//! Output formatting module for tariffscope
//!
//! This module provides formatters for displaying rankings and consumption
//! reports in different formats: human-readable tables for terminal output
//! and JSON for programmatic consumption. It also writes the ranking CSV.

use crate::analysis::{ExportAnalysis, LoadedExport};
use colored::Colorize;
use prettytable::{Cell, Row, Table, format, row};
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use tariffscope_core::aggregation_types::{HourlyProfile, MonthSummary, RankedPlan, Totals};
use tariffscope_core::error::Result;
use tariffscope_core::types::DiscountWindow;

/// Trait for output formatters
///
/// Implement this trait to add a new rendering of the reports.
pub trait OutputFormatter {
    /// Format plan rankings for one or more exports
    fn format_analyses(&self, analyses: &[ExportAnalysis], top: Option<usize>) -> String;

    /// Format the month completeness report
    fn format_months(&self, source: &Path, months: &[MonthSummary], threshold: f64) -> String;

    /// Format the outcome of a normalize run
    fn format_normalized(&self, loaded: &LoadedExport, output: Option<&Path>) -> String;
}

/// Window as shown to users; the whole-day form reads `24/7`
pub fn format_window(window: &DiscountWindow) -> String {
    if window.is_all_day() {
        "24/7".to_string()
    } else {
        window.to_string()
    }
}

fn top_entries(entries: &[RankedPlan], top: Option<usize>) -> &[RankedPlan] {
    match top {
        Some(n) => &entries[..n.min(entries.len())],
        None => entries,
    }
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    fn format_currency(amount: f64) -> String {
        format!("₪{amount:.2}")
    }

    fn format_percent(fraction: f64) -> String {
        format!("{:.1}%", fraction * 100.0)
    }

    fn format_ranking(analysis: &ExportAnalysis, top: Option<usize>) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n=== {} ===\n", analysis.source.display()));
        if let Some(name) = &analysis.metadata.customer_name {
            output.push_str(&format!("Customer: {name}\n"));
        }
        if let Some(meter) = &analysis.metadata.meter_number {
            output.push_str(&format!("Meter: {meter}\n"));
        }
        let active: Vec<String> = analysis
            .months
            .iter()
            .filter(|m| m.active)
            .map(|m| m.month.to_string())
            .collect();
        output.push_str(&format!(
            "Readings: {} ({} skipped), active months: {}\n",
            analysis.stats.readings,
            analysis.report.skipped(),
            active.join(", ")
        ));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "#",
            b -> "Provider",
            b -> "Plan",
            b -> "Hours",
            b -> "Discount",
            b -> "Savings",
            b -> "Per Month",
            b -> "Savings %",
            b -> "Coverage"
        ]);

        for entry in top_entries(&analysis.ranking.entries, top) {
            table.add_row(row![
                r -> entry.rank,
                entry.plan.provider_name,
                entry.plan.plan_name,
                format_window(&entry.plan.discount_window),
                r -> Self::format_percent(entry.plan.discount_percent),
                r -> Self::format_currency(entry.result.savings_amount),
                r -> Self::format_currency(entry.result.monthly_savings),
                r -> Self::format_percent(entry.result.savings_percent),
                r -> Self::format_percent(entry.result.coverage)
            ]);
        }
        output.push_str(&table.to_string());

        let totals = Totals::from_ranking(&analysis.ranking);
        match analysis.ranking.best() {
            Some(best) => output.push_str(&format!(
                "\n{} {} / {}: {} ({} per month)\n",
                "Best plan:".green().bold(),
                best.plan.provider_name,
                best.plan.plan_name,
                Self::format_currency(totals.best_savings),
                Self::format_currency(totals.best_monthly_savings)
            )),
            None => output.push_str(&format!("\n{}\n", "No plans to rank".yellow())),
        }
        if totals.rejected > 0 {
            output.push_str(&format!("{} invalid plans skipped\n", totals.rejected));
        }

        if let Some(profile) = &analysis.profile {
            output.push_str(&Self::format_profile(profile));
        }
        output
    }

    fn format_profile(profile: &HourlyProfile) -> String {
        let Some(average) = profile.average else {
            return "\nNo active months for an hourly profile\n".to_string();
        };

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        let mut titles = vec![Cell::new("Hour").style_spec("b")];
        titles.extend(
            profile
                .months
                .iter()
                .map(|m| Cell::new(&m.month.to_string()).style_spec("b")),
        );
        titles.push(Cell::new("Average").style_spec("b"));
        table.set_titles(Row::new(titles));

        for (hour, avg) in average.iter().enumerate() {
            let mut cells = vec![Cell::new(&format!("{hour:02}:00"))];
            cells.extend(
                profile
                    .months
                    .iter()
                    .map(|m| Cell::new(&format!("{:.3}", m.hours[hour])).style_spec("r")),
            );
            cells.push(Cell::new(&format!("{avg:.3}")).style_spec("r"));
            table.add_row(Row::new(cells));
        }

        format!("\nHourly profile (kWh per reading)\n{table}")
    }
}

impl OutputFormatter for TableFormatter {
    fn format_analyses(&self, analyses: &[ExportAnalysis], top: Option<usize>) -> String {
        analyses
            .iter()
            .map(|analysis| Self::format_ranking(analysis, top))
            .collect()
    }

    fn format_months(&self, source: &Path, months: &[MonthSummary], threshold: f64) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Month",
            b -> "Readings",
            b -> "Expected",
            b -> "Complete",
            b -> "kWh",
            b -> "Billed"
        ]);

        for month in months {
            table.add_row(row![
                month.month,
                r -> month.readings,
                r -> month.expected,
                r -> Self::format_percent(month.completeness),
                r -> format!("{:.2}", month.total_kwh),
                if month.active { "yes" } else { "no" }
            ]);
        }

        format!(
            "{} (threshold {})\n{}",
            source.display(),
            Self::format_percent(threshold),
            table
        )
    }

    fn format_normalized(&self, loaded: &LoadedExport, output: Option<&Path>) -> String {
        let stats = loaded.series.stats();
        let report = &loaded.report;
        let mut text = format!(
            "{} ({} dialect)\n",
            loaded.source.display(),
            loaded.dialect
        );
        if let (Some(first), Some(last)) = (stats.first, stats.last) {
            text.push_str(&format!("Period: {first} to {last}\n"));
        }
        text.push_str(&format!(
            "Readings: {}, total {:.3} kWh, mean {:.4} kWh\n",
            stats.readings, stats.total_kwh, stats.mean_kwh
        ));
        text.push_str(&format!(
            "Skipped: {} malformed, {} duplicates, {} metadata rows\n",
            report.malformed.len(),
            report.duplicates_replaced,
            report.metadata_rows
        ));
        for row in &report.malformed {
            text.push_str(&format!("  line {}: {}\n", row.line, row.reason));
        }
        if let Some(path) = output {
            text.push_str(&format!("Wrote {}\n", path.display()));
        }
        text
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_pretty(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_analyses(&self, analyses: &[ExportAnalysis], top: Option<usize>) -> String {
        let output = json!({
            "analyses": analyses.iter().map(|a| {
                let mut entry = json!({
                    "source": a.source.display().to_string(),
                    "dialect": a.dialect,
                    "customer_name": a.metadata.customer_name,
                    "meter_number": a.metadata.meter_number,
                    "stats": a.stats,
                    "skipped": {
                        "malformed": a.report.malformed.len(),
                        "duplicates": a.report.duplicates_replaced,
                        "metadata_rows": a.report.metadata_rows,
                    },
                    "months": a.months,
                    "ranking": top_entries(&a.ranking.entries, top),
                    "rejected": a.ranking.rejected,
                    "totals": Totals::from_ranking(&a.ranking),
                });
                if let Some(profile) = &a.profile {
                    entry["hourly_profile"] = json!(profile);
                }
                entry
            }).collect::<Vec<_>>(),
        });
        Self::to_pretty(&output)
    }

    fn format_months(&self, source: &Path, months: &[MonthSummary], threshold: f64) -> String {
        Self::to_pretty(&json!({
            "source": source.display().to_string(),
            "threshold": threshold,
            "months": months,
        }))
    }

    fn format_normalized(&self, loaded: &LoadedExport, output: Option<&Path>) -> String {
        Self::to_pretty(&json!({
            "source": loaded.source.display().to_string(),
            "dialect": loaded.dialect,
            "stats": loaded.series.stats(),
            "accepted": loaded.report.accepted,
            "duplicates_replaced": loaded.report.duplicates_replaced,
            "metadata_rows": loaded.report.metadata_rows,
            "malformed": loaded.report.malformed.iter().map(|row| json!({
                "line": row.line,
                "reason": row.reason,
            })).collect::<Vec<_>>(),
            "output": output.map(|p| p.display().to_string()),
        }))
    }
}

/// Get the formatter for the requested output mode
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}

/// Write every ranking entry of every analysis as CSV
pub fn write_ranking_csv<W: Write>(analyses: &[ExportAnalysis], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "source",
        "rank",
        "plan_id",
        "provider_name",
        "plan_name",
        "discount_window",
        "discount_percent",
        "total_cost_at_full_rate",
        "total_cost_with_plan",
        "savings_amount",
        "savings_percent",
        "monthly_savings",
        "coverage",
    ])?;

    for analysis in analyses {
        let source = analysis.source.display().to_string();
        for entry in &analysis.ranking.entries {
            let result = &entry.result;
            csv_writer.write_record([
                source.clone(),
                entry.rank.to_string(),
                entry.plan.id.get().to_string(),
                entry.plan.provider_name.clone(),
                entry.plan.plan_name.clone(),
                format_window(&entry.plan.discount_window),
                entry.plan.discount_percent.to_string(),
                format!("{:.4}", result.total_cost_at_full_rate),
                format!("{:.4}", result.total_cost_with_plan),
                format!("{:.4}", result.savings_amount),
                format!("{:.6}", result.savings_percent),
                format!("{:.4}", result.monthly_savings),
                format!("{:.6}", result.coverage),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
