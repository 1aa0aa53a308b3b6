//! Country code to display name lookup.

use crate::error::DataLoadError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Default names for codes that show up in the public salary dataset.
const BUILTIN: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("DZ", "Algeria"),
    ("EE", "Estonia"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GH", "Ghana"),
    ("GR", "Greece"),
    ("HK", "Hong Kong"),
    ("HR", "Croatia"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IN", "India"),
    ("IQ", "Iraq"),
    ("IR", "Iran"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KR", "South Korea"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("MT", "Malta"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("NG", "Nigeria"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PH", "Philippines"),
    ("PK", "Pakistan"),
    ("PL", "Poland"),
    ("PR", "Puerto Rico"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RU", "Russia"),
    ("SA", "Saudi Arabia"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("SI", "Slovenia"),
    ("TH", "Thailand"),
    ("TR", "Turkey"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("VN", "Vietnam"),
    ("ZA", "South Africa"),
];

#[derive(Debug, Deserialize)]
struct CountryRow {
    code: String,
    name: String,
}

/// Mapping from country code to display name.
#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    names: HashMap<String, String>,
}

impl CountryTable {
    /// An empty table; every lookup falls back to the code.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (code, name) in BUILTIN {
            table.insert(code, name);
        }
        table
    }

    /// Built-in table overlaid with the `code,name` rows of `path`.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let name = path.display().to_string();
        info!("Loading country table from {}", name);

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DataLoadError::Csv {
                name: name.clone(),
                source,
            })?;

        let mut table = Self::builtin();
        for (index, result) in rdr.deserialize::<CountryRow>().enumerate() {
            let row = result.map_err(|err| DataLoadError::MalformedRow {
                name: name.clone(),
                line: index as u64 + 2,
                reason: err.to_string(),
            })?;
            table.insert(&row.code, &row.name);
        }

        debug!("Country table has {} entries", table.len());
        Ok(table)
    }

    /// Add or replace one mapping.
    pub fn insert(&mut self, code: &str, name: &str) {
        self.names
            .insert(code.trim().to_uppercase(), name.trim().to_string());
    }

    /// Name for `code`, if known.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.names
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Name for `code`, or `code` itself when unknown.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Translate a country code for display, falling back to the code itself.
pub fn country_code_to_name(code: &str, table: &CountryTable) -> String {
    table.display_name(code).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_code() {
        let table = CountryTable::builtin();
        assert_eq!(country_code_to_name("US", &table), "United States");
        assert_eq!(country_code_to_name("de", &table), "Germany");
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let table = CountryTable::builtin();
        assert_eq!(country_code_to_name("ZZ", &table), "ZZ");
        assert_eq!(country_code_to_name(" x1 ", &table), " x1 ");
        assert_eq!(country_code_to_name("US", &CountryTable::empty()), "US");
    }

    #[test]
    fn test_blank_name_counts_as_miss() {
        let mut table = CountryTable::empty();
        table.insert("XK", "");
        assert_eq!(table.display_name("XK"), "XK");
    }

    #[test]
    fn test_load_overlays_builtin() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "code,name").unwrap();
        writeln!(file, "US,USA").unwrap();
        writeln!(file, "XK,Kosovo").unwrap();
        file.flush().unwrap();

        let table = CountryTable::load(file.path()).unwrap();
        assert_eq!(table.display_name("US"), "USA");
        assert_eq!(table.display_name("XK"), "Kosovo");
        assert_eq!(table.display_name("FR"), "France");
    }

    #[test]
    fn test_load_missing_file() {
        let err = CountryTable::load(Path::new("/no/such/countries.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Csv { .. }));
    }
}
