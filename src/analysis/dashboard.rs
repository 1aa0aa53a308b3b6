//! Dashboard configuration and computation.
//!
//! A [`DashboardConfig`] lists the charts a dashboard shows. [`Dashboard`]
//! validates it once, then turns a record set and a filter selection into a
//! [`DashboardView`]: the filtered rows, summary metrics and one output per
//! chart.

use super::aggregator::{
    group_aggregate, group_distribution, percentages, salary_histogram, summary_metrics,
    two_field_group_aggregate, AggregateRow, BoxStats, CrossAggregateRow, HistogramBin, Reduction,
    SortOrder, SummaryMetrics,
};
use super::filter::{apply_filters, FilterSelection};
use crate::dataset::CountryTable;
use crate::error::ConfigurationError;
use crate::models::{CompanySize, EmploymentType, ExperienceLevel, Field, GroupKey, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Default bin count for salary histograms.
pub const DEFAULT_BINS: usize = 30;

/// Chart families a dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Histogram,
    Box,
    Choropleth,
    Line,
    Pie,
    Heatmap,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Choropleth => "choropleth",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "histogram" | "hist" => Ok(ChartKind::Histogram),
            "box" | "boxplot" => Ok(ChartKind::Box),
            "choropleth" | "map" => Ok(ChartKind::Choropleth),
            "line" => Ok(ChartKind::Line),
            "pie" => Ok(ChartKind::Pie),
            "heatmap" => Ok(ChartKind::Heatmap),
            _ => Err(ConfigurationError::UnknownChartKind(s.to_string())),
        }
    }
}

/// One chart on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    /// Group field; unused by histograms.
    pub field: Option<Field>,
    /// Second group field for heatmaps.
    pub secondary_field: Option<Field>,
    pub reduction: Reduction,
    pub order: SortOrder,
    pub top_n: Option<usize>,
    /// Histogram bin count.
    pub bins: usize,
}

impl ChartSpec {
    fn grouped(title: &str, kind: ChartKind, field: Field, reduction: Reduction) -> Self {
        Self {
            title: title.to_string(),
            kind,
            field: Some(field),
            secondary_field: None,
            reduction,
            order: SortOrder::Descending,
            top_n: None,
            bins: DEFAULT_BINS,
        }
    }

    pub fn bar(title: &str, field: Field, reduction: Reduction) -> Self {
        Self::grouped(title, ChartKind::Bar, field, reduction)
    }

    pub fn pie(title: &str, field: Field, reduction: Reduction) -> Self {
        Self::grouped(title, ChartKind::Pie, field, reduction).order(SortOrder::None)
    }

    pub fn line(title: &str, field: Field, reduction: Reduction) -> Self {
        Self::grouped(title, ChartKind::Line, field, reduction).order(SortOrder::None)
    }

    pub fn choropleth(title: &str, field: Field, reduction: Reduction) -> Self {
        Self::grouped(title, ChartKind::Choropleth, field, reduction).order(SortOrder::None)
    }

    pub fn boxplot(title: &str, field: Field) -> Self {
        Self::grouped(title, ChartKind::Box, field, Reduction::Median).order(SortOrder::None)
    }

    pub fn heatmap(title: &str, primary: Field, secondary: Field, reduction: Reduction) -> Self {
        Self {
            secondary_field: Some(secondary),
            ..Self::grouped(title, ChartKind::Heatmap, primary, reduction).order(SortOrder::None)
        }
    }

    pub fn histogram(title: &str, bins: usize) -> Self {
        Self {
            title: title.to_string(),
            kind: ChartKind::Histogram,
            field: None,
            secondary_field: None,
            reduction: Reduction::Count,
            order: SortOrder::None,
            top_n: None,
            bins,
        }
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Check that the chart can be computed.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.kind == ChartKind::Histogram {
            return if self.bins == 0 {
                Err(ConfigurationError::ZeroBins)
            } else {
                Ok(())
            };
        }

        let field = self
            .field
            .ok_or_else(|| ConfigurationError::MissingGroupField(self.title.clone()))?;
        if !field.is_groupable() {
            return Err(ConfigurationError::NotGroupable(field));
        }

        if self.kind == ChartKind::Heatmap {
            let secondary = self
                .secondary_field
                .ok_or_else(|| ConfigurationError::MissingSecondaryField(self.title.clone()))?;
            if !secondary.is_groupable() {
                return Err(ConfigurationError::NotGroupable(secondary));
            }
        }

        Ok(())
    }
}

/// Which charts to compute and how to present their labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub charts: Vec<ChartSpec>,
    /// Replace codes (countries, experience levels, sizes) with names.
    pub translate_labels: bool,
    /// Rows shown in the dataset preview.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    /// The charts of the full salary dashboard.
    fn default() -> Self {
        Self::new()
            .chart(ChartSpec::bar("Average Salary by Job Title", Field::JobTitle, Reduction::Mean))
            .chart(ChartSpec::bar(
                "Number of Jobs per Company Location",
                Field::CompanyLocation,
                Reduction::Count,
            ))
            .chart(ChartSpec::histogram("Salary Distribution", DEFAULT_BINS))
            .chart(ChartSpec::boxplot("Salary by Experience Level", Field::ExperienceLevel))
            .chart(ChartSpec::choropleth(
                "Average Salary by Company Location",
                Field::CompanyLocation,
                Reduction::Mean,
            ))
            .chart(ChartSpec::line("Average Salary by Work Year", Field::WorkYear, Reduction::Mean))
            .chart(ChartSpec::pie("Remote Work Ratio", Field::RemoteRatio, Reduction::Count))
            .chart(ChartSpec::heatmap(
                "Average Salary by Experience and Company Size",
                Field::ExperienceLevel,
                Field::CompanySize,
                Reduction::Mean,
            ))
    }
}

impl DashboardConfig {
    /// A configuration with no charts.
    pub fn new() -> Self {
        Self {
            charts: Vec::new(),
            translate_labels: true,
            preview_rows: 10,
        }
    }

    pub fn chart(mut self, spec: ChartSpec) -> Self {
        self.charts.push(spec);
        self
    }

    pub fn translate_labels(mut self, translate: bool) -> Self {
        self.translate_labels = translate;
        self
    }

    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.charts.iter().try_for_each(ChartSpec::validate)
    }
}

/// Computed data for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Series { rows: Vec<AggregateRow> },
    Shares { rows: Vec<AggregateRow>, percentages: Vec<f64> },
    Cross { cells: Vec<CrossAggregateRow> },
    Histogram { bins: Vec<HistogramBin> },
    Distribution { groups: Vec<BoxStats> },
}

impl ChartData {
    /// Whether the chart has nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Series { rows } | ChartData::Shares { rows, .. } => rows.is_empty(),
            ChartData::Cross { cells } => cells.is_empty(),
            ChartData::Histogram { bins } => bins.is_empty(),
            ChartData::Distribution { groups } => groups.is_empty(),
        }
    }
}

/// One computed chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOutput {
    pub title: String,
    pub kind: ChartKind,
    pub field: Option<Field>,
    pub secondary_field: Option<Field>,
    pub reduction: Reduction,
    pub data: ChartData,
}

/// Everything the presentation layer needs for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub total_records: usize,
    pub filtered: Vec<&'a Record>,
    pub summary: SummaryMetrics,
    pub charts: Vec<ChartOutput>,
}

impl DashboardView<'_> {
    /// The first `n` filtered records.
    pub fn preview(&self, n: usize) -> &[&Record] {
        &self.filtered[..n.min(self.filtered.len())]
    }
}

/// A validated dashboard ready to compute views.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    countries: CountryTable,
}

impl Dashboard {
    /// Validate `config` and build a dashboard.
    pub fn new(config: DashboardConfig, countries: CountryTable) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config, countries })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Filter `records` and compute every configured chart.
    pub fn compute<'a>(
        &self,
        records: &'a [Record],
        selection: &FilterSelection,
    ) -> Result<DashboardView<'a>, ConfigurationError> {
        let filtered = apply_filters(records, selection);
        let summary = summary_metrics(&filtered);

        let charts = self
            .config
            .charts
            .iter()
            .map(|spec| self.compute_chart(spec, &filtered))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Computed {} charts over {} of {} records",
            charts.len(),
            filtered.len(),
            records.len()
        );

        Ok(DashboardView {
            total_records: records.len(),
            filtered,
            summary,
            charts,
        })
    }

    fn compute_chart(
        &self,
        spec: &ChartSpec,
        filtered: &[&Record],
    ) -> Result<ChartOutput, ConfigurationError> {
        let data = match (spec.kind, spec.field) {
            (ChartKind::Histogram, _) => ChartData::Histogram {
                bins: salary_histogram(filtered, spec.bins)?,
            },
            (_, None) => return Err(ConfigurationError::MissingGroupField(spec.title.clone())),
            (ChartKind::Box, Some(field)) => {
                let mut groups = group_distribution(filtered, field)?;
                for group in &mut groups {
                    group.label = self.label(field, &group.key);
                }
                ChartData::Distribution { groups }
            }
            (ChartKind::Heatmap, Some(primary)) => {
                let secondary = spec
                    .secondary_field
                    .ok_or_else(|| ConfigurationError::MissingSecondaryField(spec.title.clone()))?;
                let mut cells =
                    two_field_group_aggregate(filtered, primary, secondary, spec.reduction)?;
                for cell in &mut cells {
                    cell.primary_label = self.label(primary, &cell.primary);
                    cell.secondary_label = self.label(secondary, &cell.secondary);
                }
                ChartData::Cross { cells }
            }
            (kind, Some(field)) => {
                let mut rows =
                    group_aggregate(filtered, field, spec.reduction, spec.order, spec.top_n)?;
                for row in &mut rows {
                    row.label = self.label(field, &row.key);
                }
                if kind == ChartKind::Pie {
                    let percentages = percentages(&rows);
                    ChartData::Shares { rows, percentages }
                } else {
                    ChartData::Series { rows }
                }
            }
        };

        Ok(ChartOutput {
            title: spec.title.clone(),
            kind: spec.kind,
            field: spec.field,
            secondary_field: spec.secondary_field,
            reduction: spec.reduction,
            data,
        })
    }

    /// Presentation label for a group key.
    pub fn label(&self, field: Field, key: &GroupKey) -> String {
        let GroupKey::Text(code) = key else {
            return key.to_string();
        };
        if !self.config.translate_labels {
            return code.clone();
        }

        match field {
            Field::CompanyLocation | Field::EmployeeResidence => {
                self.countries.display_name(code).to_string()
            }
            Field::ExperienceLevel => ExperienceLevel::from_code(code)
                .map(|l| l.display_name().to_string())
                .unwrap_or_else(|| code.clone()),
            Field::EmploymentType => EmploymentType::from_code(code)
                .map(|t| t.display_name().to_string())
                .unwrap_or_else(|| code.clone()),
            Field::CompanySize => CompanySize::from_code(code)
                .map(|s| s.display_name().to_string())
                .unwrap_or_else(|| code.clone()),
            _ => code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;

    fn sample() -> Vec<Record> {
        let mut records = vec![
            record("A", "US", 100.0),
            record("A", "DE", 300.0),
            record("B", "US", 200.0),
        ];
        records[1].experience_level = ExperienceLevel::Entry;
        records[2].remote_ratio = 100;
        records
    }

    fn dashboard(config: DashboardConfig) -> Dashboard {
        Dashboard::new(config, CountryTable::builtin()).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert_eq!(config.charts.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_charts_show_every_group() {
        let config = DashboardConfig::default();
        assert!(config.charts.iter().all(|c| c.top_n.is_none()));

        let records: Vec<Record> = (0..12)
            .map(|i| record(&format!("Title {:02}", i), "US", 1000.0 * (i + 1) as f64))
            .collect();
        let dashboard = Dashboard::new(config, CountryTable::builtin()).unwrap();
        let view = dashboard.compute(&records, &FilterSelection::new()).unwrap();

        let ChartData::Series { rows } = &view.charts[0].data else {
            panic!("expected a series");
        };
        assert_eq!(rows.len(), 12);
    }

    #[test]
    fn test_heatmap_requires_secondary_field() {
        let mut spec = ChartSpec::heatmap("h", Field::JobTitle, Field::CompanySize, Reduction::Mean);
        spec.secondary_field = None;
        assert_eq!(
            spec.validate(),
            Err(ConfigurationError::MissingSecondaryField("h".to_string()))
        );
    }

    #[test]
    fn test_salary_is_not_a_chart_dimension() {
        let config = DashboardConfig::new().chart(ChartSpec::bar("x", Field::SalaryInUsd, Reduction::Mean));
        assert!(matches!(
            Dashboard::new(config, CountryTable::empty()),
            Err(ConfigurationError::NotGroupable(Field::SalaryInUsd))
        ));
    }

    #[test]
    fn test_compute_translates_country_labels() {
        let records = sample();
        let board = dashboard(
            DashboardConfig::new().chart(ChartSpec::bar("loc", Field::CompanyLocation, Reduction::Count)),
        );
        let view = board.compute(&records, &FilterSelection::new()).unwrap();

        let ChartData::Series { rows } = &view.charts[0].data else {
            panic!("expected series");
        };
        assert_eq!(rows[0].key, GroupKey::from("US"));
        assert_eq!(rows[0].label, "United States");
        assert_eq!(rows[1].label, "Germany");
    }

    #[test]
    fn test_labels_stay_codes_when_translation_is_off() {
        let records = sample();
        let board = dashboard(
            DashboardConfig::new()
                .translate_labels(false)
                .chart(ChartSpec::boxplot("exp", Field::ExperienceLevel)),
        );
        let view = board.compute(&records, &FilterSelection::new()).unwrap();

        let ChartData::Distribution { groups } = &view.charts[0].data else {
            panic!("expected distribution");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["EN", "SE"]);
    }

    #[test]
    fn test_empty_selection_result_degrades_gracefully() {
        let records = sample();
        let board = dashboard(DashboardConfig::default());
        let selection = FilterSelection::new().with_values(Field::JobTitle, ["Nobody"]);
        let view = board.compute(&records, &selection).unwrap();

        assert_eq!(view.total_records, 3);
        assert!(view.filtered.is_empty());
        assert_eq!(view.summary.count, 0);
        assert_eq!(view.summary.mean, None);
        assert!(view.charts.iter().all(|c| c.data.is_empty()));
    }

    #[test]
    fn test_pie_shares() {
        let records = sample();
        let board = dashboard(
            DashboardConfig::new().chart(ChartSpec::pie("remote", Field::RemoteRatio, Reduction::Count)),
        );
        let view = board.compute(&records, &FilterSelection::new()).unwrap();

        let ChartData::Shares { rows, percentages } = &view.charts[0].data else {
            panic!("expected shares");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, GroupKey::Int(0));
        assert!((percentages[0] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_labels() {
        let records = sample();
        let board = dashboard(DashboardConfig::new().chart(ChartSpec::heatmap(
            "heat",
            Field::ExperienceLevel,
            Field::CompanySize,
            Reduction::Mean,
        )));
        let view = board.compute(&records, &FilterSelection::new()).unwrap();

        let ChartData::Cross { cells } = &view.charts[0].data else {
            panic!("expected cross");
        };
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].primary_label, "Entry-level");
        assert_eq!(cells[1].primary_label, "Senior");
        assert_eq!(cells[1].secondary_label, "Medium");
        assert_eq!(cells[1].value, 150.0);
    }

    #[test]
    fn test_preview() {
        let records = sample();
        let board = dashboard(DashboardConfig::new());
        let view = board.compute(&records, &FilterSelection::new()).unwrap();
        assert_eq!(view.preview(2).len(), 2);
        assert_eq!(view.preview(50).len(), 3);
    }

    #[test]
    fn test_chart_kind_from_str() {
        assert_eq!("Heatmap".parse::<ChartKind>(), Ok(ChartKind::Heatmap));
        assert_eq!("map".parse::<ChartKind>(), Ok(ChartKind::Choropleth));
        assert!("radar".parse::<ChartKind>().is_err());
    }
}
