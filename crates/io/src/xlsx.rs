// Excel export of exception sets

use std::path::Path;

use cdrecon_engine::model::Dataset;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

/// Serialize a dataset as a single-sheet XLSX workbook in memory.
///
/// Header row first, no index column. Cells holding an exactly representable
/// number are written as numbers; everything else is text; missing cells stay blank.
pub fn dataset_to_xlsx_bytes(dataset: &Dataset) -> Result<Vec<u8>, String> {
    let mut workbook = build_workbook(dataset)?;
    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to serialize XLSX: {}", e))
}

/// Write a dataset to an XLSX file.
pub fn export_dataset(dataset: &Dataset, path: &Path) -> Result<(), String> {
    let mut workbook = build_workbook(dataset)?;
    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))
}

fn build_workbook(dataset: &Dataset) -> Result<Workbook, String> {
    let mut workbook = Workbook::new();
    let name = sheet_name(&dataset.carrier);
    let worksheet = workbook
        .add_worksheet()
        .set_name(&name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", name, e))?;

    write_dataset(worksheet, dataset)?;
    Ok(workbook)
}

fn write_dataset(worksheet: &mut Worksheet, dataset: &Dataset) -> Result<(), String> {
    let header = Format::new().set_bold();
    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (idx, row) in dataset.rows.iter().enumerate() {
        // rust_xlsxwriter uses 0-based row/col as u32/u16
        let row32 = (idx + 1) as u32;
        for col in 0..dataset.columns.len() {
            let Some(text) = row.get(col) else {
                continue;
            };
            let col16 = col as u16;
            let written = match exact_number(text) {
                Some(n) => worksheet.write_number(row32, col16, n),
                None => worksheet.write_string(row32, col16, text),
            };
            written.map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
        }
    }

    if !dataset.columns.is_empty() {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| format!("Failed to freeze header: {}", e))?;
    }
    worksheet.autofit();
    Ok(())
}

/// A number Excel can hold without changing how it reads: no leading zeros,
/// no exponent or padding, at most 15 integer digits.
fn exact_number(text: &str) -> Option<f64> {
    let n: f64 = text.parse().ok()?;
    if !n.is_finite() || n.trunc().abs() >= 1e15 {
        return None;
    }
    if n.to_string() != text {
        return None;
    }
    Some(n)
}

/// Excel sheet names: at most 31 chars, none of `[]:*?/\`.
fn sheet_name(carrier: &str) -> String {
    let cleaned: String = carrier
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}
