//! Salary aggregation and statistics.
//!
//! This module reduces filtered records into the numbers each dashboard
//! widget needs: scalar summary metrics, per-group reductions, two-field
//! cross tabs, histogram bins and box-plot statistics. All functions take
//! the filtered set as input, so groups only ever come from records that
//! survived the filters.

use crate::error::ConfigurationError;
use crate::models::{Field, GroupKey, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How a group's salaries collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Mean,
    Count,
    Min,
    Max,
    Median,
    Sum,
}

impl Reduction {
    /// Reduce a non-empty slice of salaries.
    fn apply(&self, values: &mut [f64]) -> f64 {
        match self {
            Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reduction::Count => values.len() as f64,
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Median => {
                values.sort_by(f64::total_cmp);
                quantile_sorted(values, 0.5)
            }
            Reduction::Sum => values.iter().sum(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reduction::Mean => "mean",
            Reduction::Count => "count",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Median => "median",
            Reduction::Sum => "sum",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Reduction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(Reduction::Mean),
            "count" => Ok(Reduction::Count),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "median" => Ok(Reduction::Median),
            "sum" => Ok(Reduction::Sum),
            _ => Err(ConfigurationError::UnsupportedReduction(s.to_string())),
        }
    }
}

/// Ordering of aggregate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
    /// Key order.
    None,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
            SortOrder::None => "none",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortOrder::Ascending),
            "descending" | "desc" => Ok(SortOrder::Descending),
            "none" | "key" => Ok(SortOrder::None),
            _ => Err(ConfigurationError::UnknownOrder(s.to_string())),
        }
    }
}

/// One group of a single-field aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group key as found in the data.
    pub key: GroupKey,
    /// Presentation label; the key's text unless relabelled.
    pub label: String,
    /// Reduced salary value.
    pub value: f64,
    /// Number of records in the group.
    pub records: usize,
}

/// One cell of a two-field aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossAggregateRow {
    pub primary: GroupKey,
    pub primary_label: String,
    pub secondary: GroupKey,
    pub secondary_label: String,
    pub value: f64,
    pub records: usize,
}

/// Scalar salary statistics over a record set.
///
/// Everything except `count` is `None` when there is nothing to reduce;
/// callers check `count > 0` before trusting the other fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// 25th percentile.
    pub q1: Option<f64>,
    pub median: Option<f64>,
    /// 75th percentile.
    pub q3: Option<f64>,
    /// Sample standard deviation; needs at least two records.
    pub std_dev: Option<f64>,
}

/// One equal-width salary bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary of one group, for box plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub key: GroupKey,
    pub label: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn ensure_groupable(field: Field) -> Result<(), ConfigurationError> {
    if field.is_groupable() {
        Ok(())
    } else {
        Err(ConfigurationError::NotGroupable(field))
    }
}

/// Partition salaries by the key of `field`. Records without a key are skipped.
fn partition(records: &[&Record], field: Field) -> BTreeMap<GroupKey, Vec<f64>> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();

    for record in records {
        if let Some(key) = record.group_key(field) {
            groups.entry(key).or_default().push(record.salary_in_usd);
        }
    }

    groups
}

/// Compute count, mean, min, max, quartiles and standard deviation of salaries.
pub fn summary_metrics(records: &[&Record]) -> SummaryMetrics {
    if records.is_empty() {
        return SummaryMetrics::default();
    }

    let mut salaries: Vec<f64> = records.iter().map(|r| r.salary_in_usd).collect();
    salaries.sort_by(f64::total_cmp);

    let count = salaries.len();
    let mean = salaries.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let variance =
            salaries.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });

    SummaryMetrics {
        count,
        mean: Some(mean),
        min: salaries.first().copied(),
        max: salaries.last().copied(),
        q1: Some(quantile_sorted(&salaries, 0.25)),
        median: Some(quantile_sorted(&salaries, 0.5)),
        q3: Some(quantile_sorted(&salaries, 0.75)),
        std_dev,
    }
}

/// Group by `field`, reduce each group's salaries, order and truncate.
///
/// Rows are ordered by value per `order`, ties broken by key ascending;
/// `SortOrder::None` keeps key order. `top_n` keeps the first N rows of the
/// ordered result.
pub fn group_aggregate(
    records: &[&Record],
    field: Field,
    reduction: Reduction,
    order: SortOrder,
    top_n: Option<usize>,
) -> Result<Vec<AggregateRow>, ConfigurationError> {
    ensure_groupable(field)?;

    let mut rows: Vec<AggregateRow> = partition(records, field)
        .into_iter()
        .map(|(key, mut salaries)| AggregateRow {
            label: key.to_string(),
            value: reduction.apply(&mut salaries),
            records: salaries.len(),
            key,
        })
        .collect();

    sort_rows(&mut rows, order);

    if let Some(n) = top_n {
        rows.truncate(n);
    }

    debug!(
        "Grouped {} records by {} into {} rows ({})",
        records.len(),
        field,
        rows.len(),
        reduction
    );

    Ok(rows)
}

fn sort_rows(rows: &mut [AggregateRow], order: SortOrder) {
    let by_key = |a: &AggregateRow, b: &AggregateRow| a.key.cmp(&b.key);
    match order {
        SortOrder::Ascending => {
            rows.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| by_key(a, b)))
        }
        SortOrder::Descending => {
            rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| by_key(a, b)))
        }
        SortOrder::None => rows.sort_by(by_key),
    }
}

/// Group by the pair (`primary`, `secondary`) and reduce each cell.
///
/// Only pairs that occur in `records` are emitted, ordered by
/// (primary, secondary) ascending.
pub fn two_field_group_aggregate(
    records: &[&Record],
    primary: Field,
    secondary: Field,
    reduction: Reduction,
) -> Result<Vec<CrossAggregateRow>, ConfigurationError> {
    ensure_groupable(primary)?;
    ensure_groupable(secondary)?;

    let mut cells: BTreeMap<(GroupKey, GroupKey), Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(a), Some(b)) = (record.group_key(primary), record.group_key(secondary)) {
            cells.entry((a, b)).or_default().push(record.salary_in_usd);
        }
    }

    let rows: Vec<CrossAggregateRow> = cells
        .into_iter()
        .map(|((a, b), mut salaries)| CrossAggregateRow {
            primary_label: a.to_string(),
            secondary_label: b.to_string(),
            value: reduction.apply(&mut salaries),
            records: salaries.len(),
            primary: a,
            secondary: b,
        })
        .collect();

    debug!(
        "Cross-grouped {} records by {} x {} into {} cells",
        records.len(),
        primary,
        secondary,
        rows.len()
    );

    Ok(rows)
}

/// Bucket salaries into `bins` equal-width bins spanning [min, max].
pub fn salary_histogram(
    records: &[&Record],
    bins: usize,
) -> Result<Vec<HistogramBin>, ConfigurationError> {
    if bins == 0 {
        return Err(ConfigurationError::ZeroBins);
    }

    let metrics = summary_metrics(records);
    let (Some(min), Some(max)) = (metrics.min, metrics.max) else {
        return Ok(Vec::new());
    };

    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: records.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for record in records {
        let index = ((record.salary_in_usd - min) / width).floor() as usize;
        histogram[index.min(bins - 1)].count += 1;
    }

    Ok(histogram)
}

/// Per-group five-number summaries, ordered by key.
pub fn group_distribution(
    records: &[&Record],
    field: Field,
) -> Result<Vec<BoxStats>, ConfigurationError> {
    ensure_groupable(field)?;

    Ok(partition(records, field)
        .into_iter()
        .map(|(key, mut salaries)| {
            salaries.sort_by(f64::total_cmp);
            BoxStats {
                label: key.to_string(),
                count: salaries.len(),
                min: salaries[0],
                q1: quantile_sorted(&salaries, 0.25),
                median: quantile_sorted(&salaries, 0.5),
                q3: quantile_sorted(&salaries, 0.75),
                max: salaries[salaries.len() - 1],
                key,
            }
        })
        .collect())
}

/// Sorted distinct values of a groupable field.
pub fn distinct_values<'a, I>(records: I, field: Field) -> Result<Vec<GroupKey>, ConfigurationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    ensure_groupable(field)?;

    let values: BTreeSet<GroupKey> = records
        .into_iter()
        .filter_map(|r| r.group_key(field))
        .collect();

    Ok(values.into_iter().collect())
}

/// Smallest and largest value of a numeric field, `None` on empty input.
pub fn value_range<'a, I>(records: I, field: Field) -> Result<Option<(f64, f64)>, ConfigurationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    if !field.is_numeric() {
        return Err(ConfigurationError::NotNumeric(field));
    }

    Ok(records
        .into_iter()
        .filter_map(|r| r.value(field).and_then(|v| v.as_f64()))
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }))
}

/// Share of each row's value in the total, in percent.
///
/// Used for pie charts; an all-zero input yields zeros.
pub fn percentages(rows: &[AggregateRow]) -> Vec<f64> {
    let total: f64 = rows.iter().map(|r| r.value).sum();
    rows.iter()
        .map(|r| {
            if total > 0.0 {
                r.value / total * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter::{apply_filters, FilterSelection};
    use crate::models::tests::record;
    use crate::models::ExperienceLevel;

    fn sample() -> Vec<Record> {
        vec![
            record("A", "US", 100.0),
            record("A", "DE", 300.0),
            record("B", "US", 200.0),
        ]
    }

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    #[test]
    fn test_summary_metrics() {
        let records = sample();
        let metrics = summary_metrics(&refs(&records));

        assert_eq!(metrics.count, 3);
        assert_eq!(metrics.mean, Some(200.0));
        assert_eq!(metrics.min, Some(100.0));
        assert_eq!(metrics.max, Some(300.0));
        assert_eq!(metrics.median, Some(200.0));
        assert_eq!(metrics.std_dev, Some(100.0));
    }

    #[test]
    fn test_summary_metrics_quartiles() {
        let records = sample();
        let metrics = summary_metrics(&refs(&records));

        assert_eq!(metrics.q1, Some(150.0));
        assert_eq!(metrics.q3, Some(250.0));

        let empty = summary_metrics(&[]);
        assert_eq!(empty.q1, None);
        assert_eq!(empty.q3, None);
    }

    #[test]
    fn test_summary_metrics_empty_uses_sentinels() {
        let metrics = summary_metrics(&[]);

        assert_eq!(metrics.count, 0);
        assert_eq!(metrics.mean, None);
        assert_eq!(metrics.min, None);
        assert_eq!(metrics.max, None);
        assert_eq!(metrics.std_dev, None);
    }

    #[test]
    fn test_single_record_has_no_std_dev() {
        let records = vec![record("A", "US", 50.0)];
        let metrics = summary_metrics(&refs(&records));
        assert_eq!(metrics.mean, Some(50.0));
        assert_eq!(metrics.std_dev, None);
    }

    #[test]
    fn test_group_aggregate_after_filter() {
        let records = sample();
        let selection = FilterSelection::new().with_values(Field::CompanyLocation, ["US"]);
        let filtered = apply_filters(&records, &selection);

        let rows = group_aggregate(
            &filtered,
            Field::JobTitle,
            Reduction::Mean,
            SortOrder::Descending,
            None,
        )
        .unwrap();

        let pairs: Vec<(String, f64)> = rows.iter().map(|r| (r.label.clone(), r.value)).collect();
        assert_eq!(pairs, vec![("B".to_string(), 200.0), ("A".to_string(), 100.0)]);
    }

    #[test]
    fn test_groups_are_exactly_distinct_values() {
        let records = sample();
        let filtered = refs(&records);
        let rows = group_aggregate(
            &filtered,
            Field::CompanyLocation,
            Reduction::Count,
            SortOrder::None,
            None,
        )
        .unwrap();

        let keys: Vec<GroupKey> = rows.into_iter().map(|r| r.key).collect();
        assert_eq!(keys, distinct_values(&records, Field::CompanyLocation).unwrap());
    }

    #[test]
    fn test_ties_break_by_key() {
        let records = vec![
            record("C", "US", 100.0),
            record("A", "US", 100.0),
            record("B", "US", 100.0),
        ];
        let filtered = refs(&records);

        for order in [SortOrder::Ascending, SortOrder::Descending, SortOrder::None] {
            let rows =
                group_aggregate(&filtered, Field::JobTitle, Reduction::Mean, order, None).unwrap();
            let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
            assert_eq!(labels, vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn test_top_n_truncates_after_ordering() {
        let records = vec![
            record("A", "US", 10.0),
            record("B", "US", 30.0),
            record("C", "US", 20.0),
        ];
        let rows = group_aggregate(
            &refs(&records),
            Field::JobTitle,
            Reduction::Max,
            SortOrder::Descending,
            Some(2),
        )
        .unwrap();

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "C"]);
    }

    #[test]
    fn test_group_aggregate_is_deterministic() {
        let records = sample();
        let filtered = refs(&records);
        let first =
            group_aggregate(&filtered, Field::JobTitle, Reduction::Count, SortOrder::Descending, None)
                .unwrap();
        let second =
            group_aggregate(&filtered, Field::JobTitle, Reduction::Count, SortOrder::Descending, None)
                .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_by_salary_is_rejected() {
        let records = sample();
        assert_eq!(
            group_aggregate(
                &refs(&records),
                Field::SalaryInUsd,
                Reduction::Mean,
                SortOrder::None,
                None
            ),
            Err(ConfigurationError::NotGroupable(Field::SalaryInUsd))
        );
    }

    #[test]
    fn test_empty_input_yields_empty_aggregates() {
        let empty: Vec<&Record> = Vec::new();
        assert!(group_aggregate(&empty, Field::JobTitle, Reduction::Mean, SortOrder::None, None)
            .unwrap()
            .is_empty());
        assert!(
            two_field_group_aggregate(&empty, Field::JobTitle, Field::ExperienceLevel, Reduction::Mean)
                .unwrap()
                .is_empty()
        );
        assert!(salary_histogram(&empty, 10).unwrap().is_empty());
        assert!(group_distribution(&empty, Field::JobTitle).unwrap().is_empty());
    }

    #[test]
    fn test_two_field_omits_empty_cells() {
        let mut records = sample();
        records[2].experience_level = ExperienceLevel::Entry;
        let rows = two_field_group_aggregate(
            &refs(&records),
            Field::JobTitle,
            Field::ExperienceLevel,
            Reduction::Mean,
        )
        .unwrap();

        let cells: Vec<(String, String, f64)> = rows
            .iter()
            .map(|r| (r.primary_label.clone(), r.secondary_label.clone(), r.value))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("A".to_string(), "SE".to_string(), 200.0),
                ("B".to_string(), "EN".to_string(), 200.0),
            ]
        );
    }

    #[test]
    fn test_reduction_from_str() {
        assert_eq!("avg".parse::<Reduction>(), Ok(Reduction::Mean));
        assert_eq!("COUNT".parse::<Reduction>(), Ok(Reduction::Count));
        assert_eq!(
            "mode".parse::<Reduction>(),
            Err(ConfigurationError::UnsupportedReduction("mode".to_string()))
        );
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_histogram_bins() {
        let records = vec![
            record("A", "US", 0.0),
            record("A", "US", 49.0),
            record("A", "US", 50.0),
            record("A", "US", 100.0),
        ];
        let bins = salary_histogram(&refs(&records), 2).unwrap();

        assert_eq!(bins.len(), 2);
        assert_eq!((bins[0].lower, bins[0].upper, bins[0].count), (0.0, 50.0, 2));
        assert_eq!((bins[1].lower, bins[1].upper, bins[1].count), (50.0, 100.0, 2));
        assert_eq!(salary_histogram(&refs(&records), 0), Err(ConfigurationError::ZeroBins));
    }

    #[test]
    fn test_histogram_single_value() {
        let records = vec![record("A", "US", 70.0), record("B", "US", 70.0)];
        let bins = salary_histogram(&refs(&records), 5).unwrap();
        assert_eq!(bins, vec![HistogramBin { lower: 70.0, upper: 70.0, count: 2 }]);
    }

    #[test]
    fn test_group_distribution() {
        let records = vec![
            record("A", "US", 1.0),
            record("A", "US", 2.0),
            record("A", "US", 3.0),
            record("A", "US", 4.0),
            record("B", "US", 10.0),
        ];
        let stats = group_distribution(&refs(&records), Field::JobTitle).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 4);
        assert_eq!(stats[0].q1, 1.75);
        assert_eq!(stats[0].median, 2.5);
        assert_eq!(stats[0].q3, 3.25);
        assert_eq!((stats[1].min, stats[1].max), (10.0, 10.0));
    }

    #[test]
    fn test_value_range() {
        let records = sample();
        assert_eq!(
            value_range(&records, Field::SalaryInUsd).unwrap(),
            Some((100.0, 300.0))
        );
        assert_eq!(value_range(Vec::<&Record>::new(), Field::WorkYear).unwrap(), None);
        assert!(value_range(&records, Field::JobTitle).is_err());
    }

    #[test]
    fn test_percentages() {
        let records = sample();
        let rows = group_aggregate(
            &refs(&records),
            Field::CompanyLocation,
            Reduction::Count,
            SortOrder::None,
            None,
        )
        .unwrap();
        let shares = percentages(&rows);
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }
}
