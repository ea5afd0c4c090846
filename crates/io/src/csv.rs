// Delimited CDR import/export

use std::path::Path;

use cdrecon_engine::model::{Dataset, Record};
use encoding_rs::Encoding;

/// Load one carrier's CDR file. `delimiter` is sniffed when `None`; `encoding`
/// is a WHATWG label (`latin1`, `windows-1252`, ...) used when the bytes are
/// not valid UTF-8.
pub fn load_dataset(
    path: &Path,
    carrier: &str,
    delimiter: Option<u8>,
    encoding: Option<&str>,
) -> Result<Dataset, String> {
    let content = read_file_as_utf8(path, encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    let dataset = parse_dataset(&content, carrier, delimiter)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    log::info!(
        "loaded {} from {}: {} rows, {} columns",
        carrier,
        path.display(),
        dataset.len(),
        dataset.columns.len()
    );
    Ok(dataset)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the header line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines with the header's field count) * field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a file as text. UTF-8 is tried first; otherwise the bytes are decoded
/// with `encoding`, or Windows-1252 when no label is given (Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path, encoding: Option<&str>) -> Result<String, String> {
    let fallback = resolve_encoding(encoding)?;
    let bytes =
        std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok(decode(bytes, fallback))
}

fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, String> {
    match label {
        Some(l) => Encoding::for_label(l.trim().as_bytes())
            .ok_or_else(|| format!("unknown encoding '{l}'")),
        None => Ok(encoding_rs::WINDOWS_1252),
    }
}

fn decode(bytes: Vec<u8>, fallback: &'static Encoding) -> String {
    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::warn!("input is not valid UTF-8, decoding as {}", fallback.name());
            let (decoded, _, _) = fallback.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Parse delimited text with a header row. Empty fields become missing cells;
/// short rows are padded with missing cells.
pub fn parse_dataset(content: &str, carrier: &str, delimiter: u8) -> Result<Dataset, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut dataset = Dataset::new(carrier, columns);

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() > dataset.columns.len() {
            return Err(format!(
                "data row {}: expected {} fields, found {}",
                idx + 1,
                dataset.columns.len(),
                record.len()
            ));
        }
        let cells = (0..dataset.columns.len())
            .map(|i| record.get(i).filter(|s| !s.is_empty()).map(str::to_string))
            .collect();
        dataset.push(Record::new(cells));
    }

    Ok(dataset)
}

/// Write a dataset with its header row. Missing cells are written empty.
pub fn export(dataset: &Dataset, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer
        .write_record(&dataset.columns)
        .map_err(|e| e.to_string())?;

    for row in &dataset.rows {
        let fields = (0..dataset.columns.len()).map(|i| row.get(i).unwrap_or(""));
        writer.write_record(fields).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
