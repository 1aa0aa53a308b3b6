//! End-to-end runs over the bundled sample dataset.

use salarydash::analysis::{
    apply_filters, group_aggregate, summary_metrics, ChartData, ChartKind, ChartSpec, Dashboard,
    DashboardConfig, FilterSelection, Reduction, SortOrder,
};
use salarydash::dataset::{CountryTable, DataSource, Dataset, DatasetCache, LoadOptions};
use salarydash::models::{Field, GroupKey, Record};
use salarydash::report::{generate_json_report, generate_markdown_report, write_csv_file, DashboardReport};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/salaries.csv")
}

fn load() -> Arc<Dataset> {
    DatasetCache::new(LoadOptions::default())
        .get_or_load(&DataSource::path(fixture()))
        .unwrap()
}

#[test]
fn test_fixture_loads() {
    let dataset = load();
    assert_eq!(dataset.len(), 12);
    assert_eq!(dataset.records[3].company_name, None);
}

#[test]
fn test_location_filter_and_summary() {
    let dataset = load();
    let selection = FilterSelection::new().with_values(Field::CompanyLocation, ["US"]);

    let filtered = apply_filters(&dataset.records, &selection);
    let summary = summary_metrics(&filtered);

    assert_eq!(summary.count, 5);
    assert_eq!(summary.mean, Some(166000.0));
    assert_eq!(summary.median, Some(160000.0));
    assert_eq!(summary.min, Some(100000.0));
    assert_eq!(summary.max, Some(250000.0));
}

#[test]
fn test_mean_salary_by_title_within_us() {
    let dataset = load();
    let selection = FilterSelection::new().with_values(Field::CompanyLocation, ["US"]);
    let filtered = apply_filters(&dataset.records, &selection);

    let rows = group_aggregate(
        &filtered,
        Field::JobTitle,
        Reduction::Mean,
        SortOrder::Descending,
        None,
    )
    .unwrap();

    let pairs: Vec<(String, f64)> = rows.iter().map(|r| (r.key.to_string(), r.value)).collect();
    assert_eq!(
        pairs,
        vec![
            ("Head of Data".to_string(), 250000.0),
            ("ML Engineer".to_string(), 180000.0),
            ("Data Engineer".to_string(), 140000.0),
            ("Data Scientist".to_string(), 130000.0),
        ]
    );
}

#[test]
fn test_jobs_per_location_top_three() {
    let dataset = load();
    let all: Vec<&Record> = dataset.records.iter().collect();

    let rows = group_aggregate(
        &all,
        Field::CompanyLocation,
        Reduction::Count,
        SortOrder::Descending,
        Some(3),
    )
    .unwrap();

    let keys: Vec<&GroupKey> = rows.iter().map(|r| &r.key).collect();
    assert_eq!(
        keys,
        vec![&GroupKey::from("US"), &GroupKey::from("GB"), &GroupKey::from("DE")]
    );
    assert_eq!(rows[0].value, 5.0);
}

#[test]
fn test_combined_filters() {
    let dataset = load();

    let years = FilterSelection::new()
        .with_range(Field::WorkYear, 2022.0, 2023.0)
        .unwrap();
    assert_eq!(dataset.filter(&years).len(), 9);

    let senior_gb = FilterSelection::new()
        .with_values(Field::ExperienceLevel, ["SE"])
        .with_values(Field::CompanyLocation, ["GB"]);
    let filtered = dataset.filter(&senior_gb);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].job_title, "Data Engineer");
}

#[test]
fn test_default_dashboard_over_fixture() {
    let dataset = load();
    let dashboard = Dashboard::new(DashboardConfig::default(), CountryTable::builtin()).unwrap();

    let view = dashboard
        .compute(&dataset.records, &FilterSelection::new())
        .unwrap();

    assert_eq!(view.total_records, 12);
    assert_eq!(view.filtered.len(), 12);
    assert_eq!(view.charts.len(), 8);

    let jobs = view
        .charts
        .iter()
        .find(|c| c.title == "Number of Jobs per Company Location")
        .unwrap();
    let ChartData::Series { rows } = &jobs.data else {
        panic!("expected a series");
    };
    assert_eq!(rows[0].label, "United States");
    assert_eq!(rows[0].records, 5);
}

#[test]
fn test_filter_with_no_matches_still_renders() {
    let dataset = load();
    let dashboard = Dashboard::new(
        DashboardConfig::new()
            .chart(ChartSpec::bar("By Title", Field::JobTitle, Reduction::Mean))
            .chart(ChartSpec::histogram("Salaries", 10)),
        CountryTable::builtin(),
    )
    .unwrap();
    let selection = FilterSelection::new().with_values(Field::CompanyLocation, ["ZZ"]);

    let view = dashboard.compute(&dataset.records, &selection).unwrap();
    assert!(view.filtered.is_empty());
    assert_eq!(view.summary.mean, None);
    assert!(view.charts.iter().all(|c| c.data.is_empty()));
    assert_eq!(view.charts[1].kind, ChartKind::Histogram);

    let report = DashboardReport::from_view(&view, &dataset.name, &selection, 5);
    let markdown = generate_markdown_report(&report);
    assert!(markdown.contains("_No records match the current filters._"));
    assert!(generate_json_report(&report).is_ok());
}

#[test]
fn test_exported_csv_reloads_as_filtered_set() {
    let dataset = load();
    let selection = FilterSelection::new().with_values(Field::ExperienceLevel, ["SE"]);
    let filtered = dataset.filter(&selection);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("senior.csv");
    write_csv_file(&filtered, &path).unwrap();

    let reloaded = DatasetCache::new(LoadOptions::default())
        .get_or_load(&DataSource::path(&path))
        .unwrap();
    let expected: Vec<Record> = filtered.into_iter().cloned().collect();
    assert_eq!(reloaded.records, expected);
}
