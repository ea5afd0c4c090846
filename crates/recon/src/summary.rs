use crate::error::ReconError;
use crate::model::{Dataset, SummaryStats};

/// Total rows and summed measure of a table.
pub fn summary_stats(table: &Dataset, measure_key: &str) -> Result<SummaryStats, ReconError> {
    let idx = table.column_index(measure_key)?;
    let mut measure_sum = 0.0;
    for row in 0..table.len() {
        measure_sum += measure_value(table, row, idx)?;
    }
    Ok(SummaryStats {
        row_count: table.len(),
        measure_sum,
    })
}

/// Signed exception gap: positive when the left side carries more traffic.
pub fn exception_gap(left_sum: f64, right_sum: f64) -> f64 {
    left_sum - right_sum
}

/// Parse the measure cell at (`row`, `col`) as a finite number.
pub(crate) fn measure_value(table: &Dataset, row: usize, col: usize) -> Result<f64, ReconError> {
    let raw = table.rows[row].get(col);
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReconError::TypeMismatch {
            carrier: table.carrier.clone(),
            column: table.columns[col].clone(),
            row: row + 1,
            value: raw.unwrap_or("<missing>").to_string(),
        })
}
