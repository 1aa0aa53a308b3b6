//! Command-line interface argument parsing.
//!
//! Filter flags take comma-separated value sets; range flags take `LO..HI`.

use clap::Parser;
use salarydash::analysis::RangeBounds;
use salarydash::models::Field;
use std::path::PathBuf;

/// SalaryDash - filter and aggregate salary datasets
///
/// Load a salary CSV, narrow it with filters, and render the dashboard
/// charts as a Markdown or JSON report. Filtered rows can be exported
/// to CSV or XLSX.
///
/// Examples:
///   salarydash --data salaries.csv
///   salarydash --data salaries.csv --location US,GB --experience SE,EX
///   salarydash --data salaries.csv --year-range 2021..2023 --format json -o report.json
///   salarydash --data salaries.csv --job-title "Data Scientist" --export-xlsx ds.xlsx
///   salarydash --data salaries.csv --list-values company_location
///   salarydash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Salary dataset (CSV) to load
    ///
    /// Falls back to `[data] path` in the config file when not given.
    #[arg(short, long, value_name = "FILE", env = "SALARYDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salarydash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep only these job titles (comma-separated)
    #[arg(long, value_name = "TITLES", value_delimiter = ',')]
    pub job_title: Vec<String>,

    /// Keep only these company locations (ISO codes, comma-separated)
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub location: Vec<String>,

    /// Keep only these employee residences (ISO codes, comma-separated)
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub residence: Vec<String>,

    /// Keep only these experience levels (EN, MI, SE, EX)
    #[arg(long, value_name = "LEVELS", value_delimiter = ',')]
    pub experience: Vec<String>,

    /// Keep only these employment types (FT, PT, CT, FL)
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub employment_type: Vec<String>,

    /// Keep only these company sizes (S, M, L)
    #[arg(long, value_name = "SIZES", value_delimiter = ',')]
    pub company_size: Vec<String>,

    /// Keep only these company names (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub company: Vec<String>,

    /// Keep only these work years (comma-separated)
    #[arg(long, value_name = "YEARS", value_delimiter = ',')]
    pub year: Vec<String>,

    /// Inclusive work year range
    ///
    /// Example: --year-range 2021..2023
    #[arg(long, value_name = "LO..HI")]
    pub year_range: Option<RangeBounds>,

    /// Inclusive salary range in USD
    #[arg(long, value_name = "LO..HI")]
    pub salary_range: Option<RangeBounds>,

    /// Inclusive remote ratio range (0-100)
    #[arg(long, value_name = "LO..HI")]
    pub remote_range: Option<RangeBounds>,

    /// Limit bar charts to their first N groups
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Bin count for salary histograms
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// CSV of `code,name` country names layered over the builtin table
    #[arg(long, value_name = "FILE")]
    pub countries: Option<PathBuf>,

    /// Keep raw codes in chart labels
    #[arg(long)]
    pub no_translate: bool,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export the filtered records as CSV
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Export the filtered records as XLSX
    #[arg(long, value_name = "FILE")]
    pub export_xlsx: Option<PathBuf>,

    /// Field delimiter of the dataset
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Print the distinct values of a field and exit
    #[arg(long, value_name = "FIELD")]
    pub list_values: Option<Field>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .salarydash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_n == Some(0) {
            return Err("Top N must be at least 1".to_string());
        }

        if self.bins == Some(0) {
            return Err("Bins must be at least 1".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        for (flag, range) in [
            ("--year-range", self.year_range),
            ("--salary-range", self.salary_range),
            ("--remote-range", self.remote_range),
        ] {
            if let Some(range) = range {
                if range.lo > range.hi {
                    return Err(format!(
                        "{} lower bound {} exceeds upper bound {}",
                        flag, range.lo, range.hi
                    ));
                }
            }
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Dataset does not exist: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `[general] verbose`; `--quiet`
    /// wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Value-set filters given on the command line, by field.
    pub fn value_filters(&self) -> Vec<(Field, &[String])> {
        [
            (Field::JobTitle, &self.job_title),
            (Field::CompanyLocation, &self.location),
            (Field::EmployeeResidence, &self.residence),
            (Field::ExperienceLevel, &self.experience),
            (Field::EmploymentType, &self.employment_type),
            (Field::CompanySize, &self.company_size),
            (Field::CompanyName, &self.company),
            (Field::WorkYear, &self.year),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(field, values)| (field, values.as_slice()))
        .collect()
    }

    /// Range filters given on the command line, by field.
    pub fn range_filters(&self) -> Vec<(Field, RangeBounds)> {
        [
            (Field::WorkYear, self.year_range),
            (Field::SalaryInUsd, self.salary_range),
            (Field::RemoteRatio, self.remote_range),
        ]
        .into_iter()
        .filter_map(|(field, range)| range.map(|r| (field, r)))
        .collect()
    }
}
