//! Dataset loading, caching and country lookup.

pub mod cache;
pub mod countries;
pub mod loader;

pub use cache::DatasetCache;
pub use countries::{country_code_to_name, CountryTable};
pub use loader::{load_records, read_records, DataSource, Dataset, LoadOptions, SourceId};
