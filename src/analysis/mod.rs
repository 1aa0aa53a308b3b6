//! The filter-and-aggregate engine.
//!
//! Filtering produces the record subset, the aggregator reduces it, and the
//! dashboard ties both to a chart configuration.

pub mod aggregator;
pub mod dashboard;
pub mod filter;

pub use aggregator::*;
pub use dashboard::{
    ChartData, ChartKind, ChartOutput, ChartSpec, Dashboard, DashboardConfig, DashboardView,
    DEFAULT_BINS,
};
pub use filter::{apply_filters, FieldFilter, FilterSelection, RangeBounds};
