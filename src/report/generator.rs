//! Dashboard report generation.
//!
//! This module turns a computed dashboard view into a Markdown or JSON
//! report, the text form of what the interactive dashboard shows.

use crate::analysis::{
    ChartData, ChartOutput, DashboardView, FilterSelection, Reduction, SummaryMetrics,
};
use crate::models::Record;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Metadata about the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Name of the data source.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Records in the loaded dataset.
    pub total_records: usize,
    /// Records left after filtering.
    pub filtered_records: usize,
    /// Active filters as `(field, description)` pairs.
    pub active_filters: Vec<(String, String)>,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub summary: SummaryMetrics,
    /// First rows of the filtered set.
    pub preview: Vec<Record>,
    pub charts: Vec<ChartOutput>,
}

impl DashboardReport {
    /// Build a report from a computed view.
    pub fn from_view(
        view: &DashboardView<'_>,
        source: &str,
        selection: &FilterSelection,
        preview_rows: usize,
    ) -> Self {
        let metadata = ReportMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            total_records: view.total_records,
            filtered_records: view.filtered.len(),
            active_filters: selection
                .active()
                .map(|(field, filter)| (field.to_string(), filter.to_string()))
                .collect(),
        };

        Self {
            metadata,
            summary: view.summary.clone(),
            preview: view.preview(preview_rows).iter().map(|r| (*r).clone()).collect(),
            charts: view.charts.clone(),
        }
    }
}

/// Format an optional metric, `n/a` when undefined.
pub fn format_metric(value: Option<f64>) -> String {
    value.map(format_usd).unwrap_or_else(|| "n/a".to_string())
}

/// Format a dollar amount with thousands separators and two decimals.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, cents) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

fn format_value(value: f64, reduction: Reduction) -> String {
    match reduction {
        Reduction::Count => format!("{}", value as u64),
        _ => format_usd(value),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# Salary Dashboard Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_preview_section(&report.preview));

    for chart in &report.charts {
        output.push_str(&generate_chart_section(chart));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records:** {} of {}\n",
        metadata.filtered_records, metadata.total_records
    ));

    if metadata.active_filters.is_empty() {
        section.push_str("- **Filters:** none\n");
    } else {
        section.push_str("- **Filters:**\n");
        for (field, description) in &metadata.active_filters {
            section.push_str(&format!("  - `{}`: {}\n", field, description));
        }
    }
    section.push('\n');

    section
}

/// Generate the summary metrics section.
fn generate_summary_section(summary: &SummaryMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if summary.count == 0 {
        section.push_str("_No records match the current filters._\n\n");
    }

    section.push_str("| Count | Mean | Min | 25% | Median | 75% | Max | Std Dev |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} |\n\n",
        summary.count,
        format_metric(summary.mean),
        format_metric(summary.min),
        format_metric(summary.q1),
        format_metric(summary.median),
        format_metric(summary.q3),
        format_metric(summary.max),
        format_metric(summary.std_dev),
    ));

    section
}

/// Generate the dataset preview table.
fn generate_preview_section(preview: &[Record]) -> String {
    if preview.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Dataset Preview\n\n");
    section.push_str("| Year | Experience | Job Title | Salary (USD) | Residence | Remote | Location | Size |\n");
    section.push_str("|:---:|:---:|:---|---:|:---:|:---:|:---:|:---:|\n");

    for record in preview {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {}% | {} | {} |\n",
            record.work_year,
            record.experience_level.code(),
            escape_cell(&record.job_title),
            format_usd(record.salary_in_usd),
            record.employee_residence,
            record.remote_ratio,
            record.company_location,
            record.company_size.map(|s| s.code()).unwrap_or("-"),
        ));
    }
    section.push('\n');

    section
}

/// Generate the section for one chart.
fn generate_chart_section(chart: &ChartOutput) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", chart.title));

    if chart.data.is_empty() {
        section.push_str("_No data for the current filters._\n\n");
        return section;
    }

    let value_header = match chart.reduction {
        Reduction::Count => "Count".to_string(),
        other => format!("Salary ({})", other),
    };

    match &chart.data {
        ChartData::Series { rows } => {
            section.push_str(&format!("| Group | {} | Records |\n", value_header));
            section.push_str("|:---|---:|---:|\n");
            for row in rows {
                section.push_str(&format!(
                    "| {} | {} | {} |\n",
                    escape_cell(&row.label),
                    format_value(row.value, chart.reduction),
                    row.records
                ));
            }
        }
        ChartData::Shares { rows, percentages } => {
            section.push_str(&format!("| Group | {} | Share |\n", value_header));
            section.push_str("|:---|---:|---:|\n");
            for (row, share) in rows.iter().zip(percentages) {
                section.push_str(&format!(
                    "| {} | {} | {:.1}% |\n",
                    escape_cell(&row.label),
                    format_value(row.value, chart.reduction),
                    share
                ));
            }
        }
        ChartData::Cross { cells } => {
            section.push_str(&format!("| Group | Subgroup | {} | Records |\n", value_header));
            section.push_str("|:---|:---|---:|---:|\n");
            for cell in cells {
                section.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    escape_cell(&cell.primary_label),
                    escape_cell(&cell.secondary_label),
                    format_value(cell.value, chart.reduction),
                    cell.records
                ));
            }
        }
        ChartData::Histogram { bins } => {
            section.push_str("| Salary Range | Count |\n");
            section.push_str("|:---|---:|\n");
            for bin in bins {
                section.push_str(&format!(
                    "| {} – {} | {} |\n",
                    format_usd(bin.lower),
                    format_usd(bin.upper),
                    bin.count
                ));
            }
        }
        ChartData::Distribution { groups } => {
            section.push_str("| Group | Count | Min | Q1 | Median | Q3 | Max |\n");
            section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
            for group in groups {
                section.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} |\n",
                    escape_cell(&group.label),
                    group.count,
                    format_usd(group.min),
                    format_usd(group.q1),
                    format_usd(group.median),
                    format_usd(group.q3),
                    format_usd(group.max),
                ));
            }
        }
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by salarydash*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write report text to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.write_all(content.as_bytes())?;
    info!("Report written to {}", path.display());

    Ok(())
}
