//! Spreadsheet upload parsing
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook, or a CSV file, into
//! header-keyed rows. Blank cells are left out of a row; rows with no
//! values at all are skipped.

use calamine::{open_workbook_auto_from_rs, Reader};
use sc_sms::SheetRow;
use std::io::Cursor;
use tracing::debug;

use crate::shared::error::{PlatformError, Result};

/// Parse an uploaded file. The format is picked from the file name.
pub fn parse_upload(file_name: Option<&str>, bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let is_csv = file_name
        .map(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);

    let rows = if is_csv { parse_csv(bytes)? } else { parse_workbook(bytes)? };
    debug!(rows = rows.len(), csv = is_csv, "Parsed spreadsheet upload");
    Ok(rows)
}

pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PlatformError::validation(format!("Unreadable spreadsheet: {}", e)))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PlatformError::validation("Spreadsheet has no worksheets"))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PlatformError::validation(format!("Unreadable worksheet '{}': {}", sheet, e)))?;

    let mut rows = range.rows().map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    Ok(keyed_rows(&header, rows))
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| PlatformError::validation(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(String::from)
        .collect();

    let records = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect::<Vec<_>>()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PlatformError::validation(format!("Unreadable CSV row: {}", e)))?;

    Ok(keyed_rows(&header, records.into_iter()))
}

fn keyed_rows(header: &[String], rows: impl Iterator<Item = Vec<String>>) -> Vec<SheetRow> {
    let keys: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    rows.filter_map(|cells| {
        let row: SheetRow = keys
            .iter()
            .zip(cells)
            .map(|(key, value)| (key.clone(), value.trim().to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        (!row.is_empty()).then_some(row)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_keyed_by_header() {
        let csv = b"name,phone,city\nAsha,9125377622,Pune\nRavi,,Delhi\n,,\n";
        let rows = parse_upload(Some("contacts.CSV"), csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("phone").map(String::as_str), Some("9125377622"));
        assert_eq!(
            rows[0].keys().cloned().collect::<Vec<_>>(),
            vec!["name", "phone", "city"]
        );
        assert!(rows[1].get("phone").is_none());
        assert_eq!(rows[1].get("city").map(String::as_str), Some("Delhi"));
    }

    #[test]
    fn test_blank_header_gets_column_name() {
        let csv = b",notes\n+919125377622,call later\n";
        let rows = parse_csv(csv).unwrap();

        assert_eq!(rows[0].get("column_1").map(String::as_str), Some("+919125377622"));
        assert_eq!(rows[0].keys().next().map(String::as_str), Some("column_1"));
    }

    #[test]
    fn test_short_rows_are_accepted() {
        let csv = b"phone,city\n9125377622\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
    }

    #[test]
    fn test_garbage_workbook_is_validation_error() {
        let err = parse_upload(Some("contacts.xlsx"), b"definitely not a zip").unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }
}
