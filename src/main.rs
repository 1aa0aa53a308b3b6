//! SalaryDash - salary dashboard on the command line
//!
//! Loads a salary dataset, applies the filter selection built from the
//! config file and flags, and writes the dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset, bad configuration, export failure)

mod cli;
mod config;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use salarydash::analysis::{distinct_values, value_range, Dashboard};
use salarydash::dataset::{CountryTable, DataSource, Dataset, DatasetCache};
use salarydash::models::Field;
use salarydash::report::{self, DashboardReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config before logging: `[general] verbose` sets the level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("SalaryDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_dashboard(&args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .salarydash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set the dataset, default filters, and charts.");
    Ok(())
}

/// Initialize logging at `level`.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the load, filter, aggregate and report workflow.
fn run_dashboard(args: &Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let data_path = config.data_path()?;

    // Step 1: Load the dataset
    if !args.quiet {
        println!("📥 Loading dataset: {}", data_path.display());
    }
    let mut cache = DatasetCache::new(config.load_options()?);
    let dataset = cache.get_or_load(&DataSource::path(data_path))?;
    info!("Loaded {} records from {}", dataset.len(), dataset.name);

    let countries = load_countries(config.data.countries.as_deref())?;

    if let Some(field) = args.list_values {
        return handle_list_values(&dataset, field, &countries, config.dashboard.translate_labels);
    }

    // Step 2: Filter and aggregate
    let selection = config.selection()?;
    let dashboard = Dashboard::new(config.dashboard_config()?, countries)?;

    if !args.quiet {
        println!("🔬 Computing {} charts...", dashboard.config().charts.len());
    }
    let view = dashboard.compute(&dataset.records, &selection)?;

    if view.filtered.is_empty() {
        warn!("No records match the current filters");
    }

    // Step 3: Write the report
    let report = DashboardReport::from_view(
        &view,
        &dataset.name,
        &selection,
        dashboard.config().preview_rows,
    );

    let output = match config.report.format.as_str() {
        "json" => report::generate_json_report(&report)?,
        "markdown" | "md" => report::generate_markdown_report(&report),
        other => anyhow::bail!("Unknown report format: {} (expected markdown or json)", other),
    };
    let output_path = PathBuf::from(&config.report.output);
    report::write_report(&output, &output_path)?;

    // Step 4: Exports
    if let Some(ref path) = args.export_csv {
        report::write_csv_file(&view.filtered, path)
            .with_context(|| format!("Failed to export CSV to {}", path.display()))?;
    }
    if let Some(ref path) = args.export_xlsx {
        report::write_xlsx_file(&view.filtered, path)
            .with_context(|| format!("Failed to export XLSX to {}", path.display()))?;
    }

    if !args.quiet {
        let summary = &view.summary;
        println!("\n📊 Dashboard Summary:");
        println!(
            "   Records: {} of {} match",
            view.filtered.len(),
            view.total_records
        );
        println!("   Mean salary: {}", usd_or_na(summary.mean));
        println!("   Median salary: {}", usd_or_na(summary.median));
        println!(
            "   Range: {} - {}",
            usd_or_na(summary.min),
            usd_or_na(summary.max)
        );
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        if let Some(ref path) = args.export_csv {
            println!("   📄 CSV export: {}", path.display());
        }
        if let Some(ref path) = args.export_xlsx {
            println!("   📄 XLSX export: {}", path.display());
        }
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(0)
}

/// Handle --list-values: print what a field can be filtered on, exit.
fn handle_list_values(
    dataset: &Dataset,
    field: Field,
    countries: &CountryTable,
    translate: bool,
) -> Result<i32> {
    println!("\n🔍 Values of {} in {}:\n", field, dataset.name);

    if field.is_groupable() {
        let values = distinct_values(&dataset.records, field)?;
        for value in &values {
            let text = value.to_string();
            if translate && field.is_country() {
                println!("     {} ({})", text, countries.display_name(&text));
            } else {
                println!("     {}", text);
            }
        }
        println!("\n   Total: {} distinct values", values.len());
    }

    if field.is_numeric() {
        match value_range(&dataset.records, field)? {
            Some((lo, hi)) => println!("   Range: {}..{}", lo, hi),
            None => println!("   Range: n/a (empty dataset)"),
        }
    }

    Ok(0)
}

fn usd_or_na(value: Option<f64>) -> String {
    value.map(report::format_usd).unwrap_or_else(|| "n/a".to_string())
}

/// Builtin country names, overlaid with a user table when one is given.
fn load_countries(path: Option<&Path>) -> Result<CountryTable> {
    match path {
        Some(path) => {
            info!("Loading country names from: {}", path.display());
            Ok(CountryTable::load(path)?)
        }
        None => Ok(CountryTable::builtin()),
    }
}

/// Load configuration from file or use defaults.
///
/// Returns the config and the file it came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(DEFAULT_CONFIG_FILE))),
        None => (Config::default(), None),
    })
}
