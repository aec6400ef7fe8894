use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use excel_table::{BrokerReport, ReportTable, ReportTablesFactory};
use uralsib_parser::UralsibReportTablesFactory;

/// Extracts portfolio properties from a Uralsib broker report and prints them as JSON.
#[derive(Debug, Parser)]
#[command(name = "uralsib_parser", author, version, about = "Extract total assets and exchange rates from a Uralsib broker report", long_about = None)]
struct Args {
    /// Broker report workbook (xls, xlsx)
    #[arg(short = 'r', long = "report")]
    report: PathBuf,

    /// Portfolio (account) the report belongs to
    #[arg(short = 'p', long = "portfolio")]
    portfolio: String,

    /// Report date, YYYY-MM-DD. Defaults to today
    #[arg(short = 'd', long = "date")]
    report_date: Option<NaiveDate>,

    /// Path to extractor_settings.json (optional)
    #[arg(short = 's', long = "settings")]
    settings_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(short = 'l', long = "log")]
    log: Option<String>,

    /// Write JSON to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.settings_path {
        Some(path) => settings_loader::load_settings(path)?,
        None => settings_loader::load_settings_with_fallback(None)?.unwrap_or_default(),
    };
    logger::init(args.log.as_deref().unwrap_or(&settings.log_filter));

    let report_date = args
        .report_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let report = BrokerReport::open(&args.report, args.portfolio.as_str(), report_date)?;

    let factory = UralsibReportTablesFactory::new(settings);
    if !factory.can_create(&report) {
        bail!("{} is not a Uralsib broker report", report.file_name());
    }
    let tables = factory.create(&report);
    let properties = tables.portfolio_property.data();
    tracing::info!(file = %report.file_name(), properties = properties.len(), "Report parsed");

    let json = serde_json::to_string_pretty(properties).context("Serializing portfolio properties")?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Writing output to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
