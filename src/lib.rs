//! SalaryDash
//!
//! Filter-and-aggregate engine behind a salary dashboard. Load a salary
//! dataset once, apply filter selections, and get back the filtered rows,
//! summary metrics and the grouped aggregates each chart draws.
//!
//! ```no_run
//! use salarydash::analysis::{Dashboard, DashboardConfig, FilterSelection};
//! use salarydash::dataset::{CountryTable, DataSource, DatasetCache, LoadOptions};
//! use salarydash::models::Field;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cache = DatasetCache::new(LoadOptions::default());
//! let dataset = cache.get_or_load(&DataSource::path("salaries.csv"))?;
//!
//! let selection = FilterSelection::new().with_values(Field::CompanyLocation, ["US"]);
//! let dashboard = Dashboard::new(DashboardConfig::default(), CountryTable::builtin())?;
//! let view = dashboard.compute(&dataset.records, &selection)?;
//!
//! println!("{} matching records", view.summary.count);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod dataset;
pub mod error;
pub mod models;
pub mod report;
