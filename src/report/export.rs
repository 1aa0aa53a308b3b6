//! Export of filtered records.
//!
//! The filtered set is the single source for every export: delimited text
//! through `csv` and a spreadsheet through `rust_xlsxwriter`.

use crate::error::ExportError;
use crate::models::{Field, FieldValue, Record};
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

const SHEET_NAME: &str = "Filtered Salaries";

fn header() -> impl Iterator<Item = &'static str> {
    Field::ALL.into_iter().map(|f| f.as_str())
}

/// Write `records` as CSV with a header row, even when empty.
pub fn write_csv<W: Write>(records: &[&Record], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(header())?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Write `records` as CSV to `path`.
pub fn write_csv_file(records: &[&Record], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(records, file)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn build_workbook(records: &[&Record]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in header().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &bold)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (index, record) in records.iter().enumerate() {
        let row = (index + 1) as u32;
        for (col, field) in Field::ALL.into_iter().enumerate() {
            let col = col as u16;
            match record.value(field) {
                Some(FieldValue::Text(text)) => {
                    worksheet.write_string(row, col, text)?;
                }
                Some(FieldValue::Int(v)) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                Some(FieldValue::Number(v)) => {
                    worksheet.write_number(row, col, v)?;
                }
                None => {}
            }
        }
    }

    Ok(workbook)
}

/// Serialize `records` to XLSX bytes.
pub fn xlsx_bytes(records: &[&Record]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write `records` as an XLSX workbook to `path`.
pub fn write_xlsx_file(records: &[&Record], path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{read_records, LoadOptions};
    use crate::models::tests::record;
    use tempfile::TempDir;

    #[test]
    fn test_csv_export_reloads() {
        let mut first = record("Data Scientist", "US", 120000.0);
        first.company_name = Some("Acme, Inc.".to_string());
        let records = vec![first, record("ML Engineer", "DE", 90000.0)];
        let refs: Vec<&Record> = records.iter().collect();

        let mut buffer = Vec::new();
        write_csv(&refs, &mut buffer).unwrap();

        let reloaded = read_records(buffer.as_slice(), "export.csv", &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.records, records);
    }

    #[test]
    fn test_csv_export_of_empty_set_has_header() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("work_year,experience_level,"));
    }

    #[test]
    fn test_xlsx_bytes_are_a_zip() {
        let records = vec![record("Data Scientist", "US", 120000.0)];
        let refs: Vec<&Record> = records.iter().collect();

        let bytes = xlsx_bytes(&refs).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_file_exports() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("Data Scientist", "US", 120000.0)];
        let refs: Vec<&Record> = records.iter().collect();

        let csv_path = dir.path().join("filtered.csv");
        let xlsx_path = dir.path().join("filtered.xlsx");
        write_csv_file(&refs, &csv_path).unwrap();
        write_xlsx_file(&refs, &xlsx_path).unwrap();

        assert!(std::fs::read_to_string(&csv_path).unwrap().contains("Data Scientist"));
        assert!(std::fs::metadata(&xlsx_path).unwrap().len() > 0);
    }
}
