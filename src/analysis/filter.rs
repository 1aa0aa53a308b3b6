//! Filter selections and record filtering.
//!
//! A [`FilterSelection`] holds at most one constraint per field. Empty
//! constraints accept everything; active constraints compose with AND.

use crate::error::ConfigurationError;
use crate::models::{Field, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Accepted values for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldFilter {
    /// No constraint.
    Any,
    /// Value must equal one of the set. An empty set behaves as `Any`.
    OneOf { values: BTreeSet<String> },
    /// Numeric value must lie in `[lo, hi]`.
    Range { lo: f64, hi: f64 },
}

impl FieldFilter {
    /// Whether this filter constrains anything.
    pub fn is_active(&self) -> bool {
        match self {
            FieldFilter::Any => false,
            FieldFilter::OneOf { values } => !values.is_empty(),
            FieldFilter::Range { .. } => true,
        }
    }

    /// Whether `record` passes this filter on `field`.
    pub fn accepts(&self, record: &Record, field: Field) -> bool {
        if !self.is_active() {
            return true;
        }

        let Some(value) = record.value(field) else {
            return false;
        };

        match self {
            FieldFilter::Any => true,
            FieldFilter::OneOf { values } => values.iter().any(|v| value.matches_text(v)),
            FieldFilter::Range { lo, hi } => value
                .as_f64()
                .map(|v| *lo <= v && v <= *hi)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFilter::Any => write!(f, "any"),
            FieldFilter::OneOf { values } => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                write!(f, "one of [{}]", joined.join(", "))
            }
            FieldFilter::Range { lo, hi } => write!(f, "{} to {}", lo, hi),
        }
    }
}

static NO_CONSTRAINT: FieldFilter = FieldFilter::Any;

/// Inclusive numeric bounds parsed from `LO..HI`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBounds {
    pub lo: f64,
    pub hi: f64,
}

impl FromStr for RangeBounds {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigurationError::MalformedRange(s.to_string());
        let (lo, hi) = s.split_once("..").ok_or_else(malformed)?;
        let lo = lo.trim().parse::<f64>().map_err(|_| malformed())?;
        let hi = hi.trim().parse::<f64>().map_err(|_| malformed())?;
        if lo.is_nan() || hi.is_nan() {
            return Err(malformed());
        }
        Ok(Self { lo, hi })
    }
}

/// The active constraints across all fields.
///
/// Deserialized selections go through the same checks as
/// [`set_range`](Self::set_range).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSelection")]
pub struct FilterSelection {
    filters: BTreeMap<Field, FieldFilter>,
}

#[derive(Deserialize)]
struct RawSelection {
    #[serde(default)]
    filters: BTreeMap<Field, FieldFilter>,
}

impl TryFrom<RawSelection> for FilterSelection {
    type Error = ConfigurationError;

    fn try_from(raw: RawSelection) -> Result<Self, Self::Error> {
        let mut selection = FilterSelection::new();
        for (field, filter) in raw.filters {
            match filter {
                FieldFilter::Any => {}
                FieldFilter::OneOf { values } => selection.set_values(field, values),
                FieldFilter::Range { lo, hi } => selection.set_range(field, lo, hi)?,
            }
        }
        Ok(selection)
    }
}

impl FilterSelection {
    /// A selection that accepts every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `field` to the given values. Passing no values clears the
    /// constraint.
    pub fn with_values<I, S>(mut self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(field, values);
        self
    }

    /// Restrict a numeric `field` to `[lo, hi]`.
    pub fn with_range(mut self, field: Field, lo: f64, hi: f64) -> Result<Self, ConfigurationError> {
        self.set_range(field, lo, hi)?;
        Ok(self)
    }

    /// In-place form of [`with_values`](Self::with_values).
    pub fn set_values<I, S>(&mut self, field: Field, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.filters.remove(&field);
        } else {
            self.filters.insert(field, FieldFilter::OneOf { values });
        }
    }

    /// In-place form of [`with_range`](Self::with_range).
    pub fn set_range(&mut self, field: Field, lo: f64, hi: f64) -> Result<(), ConfigurationError> {
        if !field.is_numeric() {
            return Err(ConfigurationError::NotNumeric(field));
        }
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(ConfigurationError::InvalidRange { field, lo, hi });
        }
        self.filters.insert(field, FieldFilter::Range { lo, hi });
        Ok(())
    }

    /// Drop any constraint on `field`.
    pub fn clear(&mut self, field: Field) {
        self.filters.remove(&field);
    }

    /// Constraint on `field`, `Any` when unset.
    pub fn get(&self, field: Field) -> &FieldFilter {
        self.filters.get(&field).unwrap_or(&NO_CONSTRAINT)
    }

    /// Active constraints in field order.
    pub fn active(&self) -> impl Iterator<Item = (Field, &FieldFilter)> {
        self.filters
            .iter()
            .filter(|(_, filter)| filter.is_active())
            .map(|(field, filter)| (*field, filter))
    }

    /// Whether no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Whether `record` passes every active constraint.
    pub fn matches(&self, record: &Record) -> bool {
        self.active().all(|(field, filter)| filter.accepts(record, field))
    }
}

/// Keep the records that pass `selection`, preserving input order.
pub fn apply_filters<'a, I>(records: I, selection: &FilterSelection) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut total = 0usize;
    let filtered: Vec<&Record> = records
        .into_iter()
        .inspect(|_| total += 1)
        .filter(|record| selection.matches(record))
        .collect();

    debug!(
        "Filtered {} of {} records ({} active filters)",
        filtered.len(),
        total,
        selection.active().count()
    );

    filtered
}
