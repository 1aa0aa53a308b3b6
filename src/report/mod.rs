//! Report generation and record export.

pub mod export;
pub mod generator;

pub use export::{write_csv, write_csv_file, write_xlsx_file, xlsx_bytes};
pub use generator::{
    format_metric, format_usd, generate_json_report, generate_markdown_report, write_report,
    DashboardReport, ReportMetadata,
};
