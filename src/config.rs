//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salarydash.toml` files.

use anyhow::{bail, Context, Result};
use salarydash::analysis::{
    ChartKind, ChartSpec, DashboardConfig, FilterSelection, RangeBounds, Reduction, SortOrder,
    DEFAULT_BINS,
};
use salarydash::dataset::LoadOptions;
use salarydash::error::ConfigurationError;
use salarydash::models::Field;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".salarydash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Initial filter selection.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardSettings,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset path, used when `--data` is not given.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Country name overrides (`code,name` CSV).
    #[serde(default)]
    pub countries: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
            countries: None,
        }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Initial filter selection. Empty lists leave a field unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub job_titles: Vec<String>,

    #[serde(default)]
    pub company_locations: Vec<String>,

    #[serde(default)]
    pub employee_residences: Vec<String>,

    #[serde(default)]
    pub experience_levels: Vec<String>,

    #[serde(default)]
    pub employment_types: Vec<String>,

    #[serde(default)]
    pub company_sizes: Vec<String>,

    #[serde(default)]
    pub company_names: Vec<String>,

    #[serde(default)]
    pub work_years: Vec<String>,

    /// Inclusive `LO..HI` work year range.
    #[serde(default)]
    pub year_range: Option<String>,

    /// Inclusive `LO..HI` salary range in USD.
    #[serde(default)]
    pub salary_range: Option<String>,

    /// Inclusive `LO..HI` remote ratio range.
    #[serde(default)]
    pub remote_range: Option<String>,
}

impl FiltersConfig {
    /// Value list for `field`.
    fn values_mut(&mut self, field: Field) -> Option<&mut Vec<String>> {
        match field {
            Field::JobTitle => Some(&mut self.job_titles),
            Field::CompanyLocation => Some(&mut self.company_locations),
            Field::EmployeeResidence => Some(&mut self.employee_residences),
            Field::ExperienceLevel => Some(&mut self.experience_levels),
            Field::EmploymentType => Some(&mut self.employment_types),
            Field::CompanySize => Some(&mut self.company_sizes),
            Field::CompanyName => Some(&mut self.company_names),
            Field::WorkYear => Some(&mut self.work_years),
            Field::RemoteRatio | Field::SalaryInUsd => None,
        }
    }

    /// Range string for a numeric `field`.
    fn range_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::WorkYear => Some(&mut self.year_range),
            Field::SalaryInUsd => Some(&mut self.salary_range),
            Field::RemoteRatio => Some(&mut self.remote_range),
            _ => None,
        }
    }
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Replace codes with display names in chart labels.
    #[serde(default = "default_true")]
    pub translate_labels: bool,

    /// Rows shown in the report's dataset preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Group limit applied to every bar chart.
    #[serde(default)]
    pub top_n: Option<usize>,

    /// Bin count applied to every histogram.
    #[serde(default)]
    pub bins: Option<usize>,

    /// Charts to compute, in report order.
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartConfig>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            translate_labels: true,
            preview_rows: default_preview_rows(),
            top_n: None,
            bins: None,
            charts: default_charts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_preview_rows() -> usize {
    10
}

fn default_charts() -> Vec<ChartConfig> {
    DashboardConfig::default()
        .charts
        .iter()
        .map(ChartConfig::from)
        .collect()
}

/// One chart as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub title: String,

    /// bar, pie, line, choropleth, box, heatmap or histogram.
    pub kind: String,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub secondary_field: Option<String>,

    #[serde(default = "default_reduction")]
    pub reduction: String,

    #[serde(default = "default_order")]
    pub order: String,

    #[serde(default)]
    pub top_n: Option<usize>,

    #[serde(default)]
    pub bins: Option<usize>,
}

fn default_reduction() -> String {
    "mean".to_string()
}

fn default_order() -> String {
    "descending".to_string()
}

impl From<&ChartSpec> for ChartConfig {
    fn from(spec: &ChartSpec) -> Self {
        let histogram = spec.kind == ChartKind::Histogram;
        Self {
            title: spec.title.clone(),
            kind: spec.kind.to_string(),
            field: spec.field.map(|f| f.to_string()),
            secondary_field: spec.secondary_field.map(|f| f.to_string()),
            reduction: spec.reduction.to_string(),
            order: spec.order.to_string(),
            top_n: spec.top_n,
            bins: histogram.then_some(spec.bins),
        }
    }
}

impl TryFrom<&ChartConfig> for ChartSpec {
    type Error = ConfigurationError;

    fn try_from(chart: &ChartConfig) -> Result<Self, Self::Error> {
        let parse_field = |name: &Option<String>| -> Result<Option<Field>, ConfigurationError> {
            name.as_deref().map(str::parse::<Field>).transpose()
        };

        let spec = ChartSpec {
            title: chart.title.clone(),
            kind: chart.kind.parse()?,
            field: parse_field(&chart.field)?,
            secondary_field: parse_field(&chart.secondary_field)?,
            reduction: chart.reduction.parse::<Reduction>()?,
            order: chart.order.parse::<SortOrder>()?,
            top_n: chart.top_n,
            bins: chart.bins.unwrap_or(DEFAULT_BINS),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// markdown or json.
    #[serde(default = "default_format")]
    pub format: String,

    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output: default_output(),
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

fn default_output() -> String {
    "salary_report.md".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. A filter
    /// given on the command line replaces the configured one for that field.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = Some(data.clone());
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter.to_string();
        }
        if let Some(ref countries) = args.countries {
            self.data.countries = Some(countries.clone());
        }

        for (field, values) in args.value_filters() {
            if let Some(target) = self.filters.values_mut(field) {
                *target = values.to_vec();
            }
        }
        for (field, range) in args.range_filters() {
            if let Some(target) = self.filters.range_mut(field) {
                *target = Some(format!("{}..{}", range.lo, range.hi));
            }
        }

        if args.top_n.is_some() {
            self.dashboard.top_n = args.top_n;
        }
        if args.bins.is_some() {
            self.dashboard.bins = args.bins;
        }
        if args.no_translate {
            self.dashboard.translate_labels = false;
        }

        if let Some(format) = args.format {
            self.report.format = format.as_str().to_string();
        }
        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The dataset to load, from `--data` or `[data] path`.
    pub fn data_path(&self) -> Result<&Path> {
        self.data
            .path
            .as_deref()
            .context("No dataset given. Pass --data or set [data] path in the config file")
    }

    /// Dataset load options.
    pub fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = match self.data.delimiter.as_bytes() {
            [byte] => *byte,
            b"\\t" => b'\t',
            _ => bail!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            ),
        };
        Ok(LoadOptions { delimiter })
    }

    /// The configured filter selection.
    pub fn selection(&self) -> Result<FilterSelection, ConfigurationError> {
        let filters = &self.filters;
        let mut selection = FilterSelection::new();

        for (field, values) in [
            (Field::JobTitle, &filters.job_titles),
            (Field::CompanyLocation, &filters.company_locations),
            (Field::EmployeeResidence, &filters.employee_residences),
            (Field::ExperienceLevel, &filters.experience_levels),
            (Field::EmploymentType, &filters.employment_types),
            (Field::CompanySize, &filters.company_sizes),
            (Field::CompanyName, &filters.company_names),
            (Field::WorkYear, &filters.work_years),
        ] {
            selection.set_values(field, values.iter().map(|v| v.trim()));
        }

        for (field, range) in [
            (Field::WorkYear, &filters.year_range),
            (Field::SalaryInUsd, &filters.salary_range),
            (Field::RemoteRatio, &filters.remote_range),
        ] {
            if let Some(range) = range {
                let bounds: RangeBounds = range.parse()?;
                selection.set_range(field, bounds.lo, bounds.hi)?;
            }
        }

        Ok(selection)
    }

    /// The configured dashboard.
    pub fn dashboard_config(&self) -> Result<DashboardConfig, ConfigurationError> {
        let charts = self
            .dashboard
            .charts
            .iter()
            .map(|chart| {
                let mut spec = ChartSpec::try_from(chart)?;
                match spec.kind {
                    ChartKind::Bar if self.dashboard.top_n.is_some() => {
                        spec.top_n = self.dashboard.top_n;
                    }
                    ChartKind::Histogram => {
                        if let Some(bins) = self.dashboard.bins {
                            spec.bins = bins;
                            spec.validate()?;
                        }
                    }
                    _ => {}
                }
                Ok(spec)
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        Ok(DashboardConfig {
            charts,
            translate_labels: self.dashboard.translate_labels,
            preview_rows: self.dashboard.preview_rows,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
