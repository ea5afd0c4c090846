// Human-readable rendering of reconciliation results for the terminal.
// Pure string building: no IO, no clap.

use cdrecon_engine::model::{
    CarrierReport, Dataset, ExceptionGap, GapDirection, ReconReport, SummaryStats, TopTable,
};

use crate::util::{display_width, format_thousands, pad_left, pad_right};

const MISSING: &str = "<missing>";
const MAX_CELL_WIDTH: usize = 24;

/// "MTN: 12,345 calls, 678,901 s of traffic"
pub fn render_totals(label: &str, stats: &SummaryStats) -> String {
    format!(
        "{label}: {} calls, {} s of traffic",
        format_thousands(stats.row_count as f64),
        format_thousands(stats.measure_sum)
    )
}

/// Ranked groups as an aligned three-column table.
pub fn render_top_table(table: &TopTable) -> String {
    if table.is_empty() {
        return "  (no calls)\n".to_string();
    }

    let keys: Vec<&str> = table
        .rows
        .iter()
        .map(|r| r.key.as_deref().unwrap_or(MISSING))
        .collect();
    let counts: Vec<String> = table
        .rows
        .iter()
        .map(|r| format_thousands(r.call_count as f64))
        .collect();
    let sums: Vec<String> = table
        .rows
        .iter()
        .map(|r| format_thousands(r.measure_sum))
        .collect();

    let key_w = column_width(&table.group_key, keys.iter().copied());
    let count_w = column_width("calls", counts.iter().map(String::as_str));
    let sum_w = column_width(&table.measure_key, sums.iter().map(String::as_str));

    let mut out = format!(
        "  {}  {}  {}\n",
        pad_right(&table.group_key, key_w),
        pad_left("calls", count_w),
        pad_left(&table.measure_key, sum_w)
    );
    for i in 0..table.rows.len() {
        out.push_str(&format!(
            "  {}  {}  {}\n",
            pad_right(keys[i], key_w),
            pad_left(&counts[i], count_w),
            pad_left(&sums[i], sum_w)
        ));
    }
    out
}

/// A few raw rows, every column shown.
pub fn render_sample(dataset: &Dataset) -> String {
    if dataset.columns.is_empty() {
        return String::new();
    }

    let widths: Vec<usize> = (0..dataset.columns.len())
        .map(|c| {
            column_width(
                &dataset.columns[c],
                dataset.rows.iter().map(|r| r.get(c).unwrap_or("")),
            )
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(s, w)| pad_right(s, *w))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(dataset.columns.iter().map(String::as_str).collect());
    for row in &dataset.rows {
        out.push_str(&line(
            (0..dataset.columns.len())
                .map(|c| row.get(c).unwrap_or(""))
                .collect(),
        ));
    }
    out
}

/// Which side carries more exception traffic, and by how much.
pub fn gap_sentence(gap: &ExceptionGap) -> String {
    let seconds = format_thousands(gap.abs());
    match gap.direction() {
        GapDirection::LeftLarger => format!(
            "exception gap between {} and {} is {} seconds",
            gap.left_carrier, gap.right_carrier, seconds
        ),
        GapDirection::RightLarger => format!(
            "exception gap between {} and {} is {} seconds",
            gap.right_carrier, gap.left_carrier, seconds
        ),
        GapDirection::Even => format!(
            "no exception gap between {} and {}",
            gap.left_carrier, gap.right_carrier
        ),
    }
}

fn render_carrier(out: &mut String, side: &CarrierReport) {
    out.push_str(&format!(
        "== {} ({} / {}) ==\n",
        side.carrier, side.fields.key, side.fields.measure
    ));
    out.push_str(&render_totals("loaded", &side.totals));
    out.push('\n');
    out.push_str("top callers:\n");
    out.push_str(&render_top_table(&side.top));
    out.push_str(&render_totals("exceptions", &side.exception_totals));
    out.push('\n');
    out.push_str("top callers among exceptions:\n");
    out.push_str(&render_top_table(&side.exception_top));
}

/// Full terminal report: both carriers, then the gap.
pub fn render_report(report: &ReconReport) -> String {
    let mut out = format!("{}\n\n", report.meta.config_name);
    render_carrier(&mut out, &report.left);
    out.push('\n');
    render_carrier(&mut out, &report.right);
    out.push('\n');
    out.push_str(&gap_sentence(&report.gap));
    out.push('\n');
    out
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(display_width)
        .chain(std::iter::once(display_width(header)))
        .max()
        .unwrap_or(0)
        .min(MAX_CELL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdrecon_engine::model::{Record, TopRow};

    fn table() -> TopTable {
        TopTable {
            group_key: "A_NUMBER".into(),
            measure_key: "CALL_DURATION".into(),
            rows: vec![
                TopRow {
                    key: Some("237670000002".into()),
                    call_count: 1500,
                    measure_sum: 98765.0,
                },
                TopRow {
                    key: None,
                    call_count: 3,
                    measure_sum: 30.0,
                },
            ],
        }
    }

    #[test]
    fn top_table_alignment() {
        let out = render_top_table(&table());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  A_NUMBER      calls  CALL_DURATION");
        assert_eq!(lines[1], "  237670000002  1,500         98,765");
        assert_eq!(lines[2], "  <missing>         3             30");
    }

    #[test]
    fn empty_top_table() {
        let mut t = table();
        t.rows.clear();
        assert_eq!(render_top_table(&t), "  (no calls)\n");
    }

    #[test]
    fn totals_line() {
        let stats = SummaryStats {
            row_count: 12345,
            measure_sum: 678901.0,
        };
        assert_eq!(render_totals("MTN", &stats), "MTN: 12,345 calls, 678,901 s of traffic");
    }

    #[test]
    fn gap_wording_follows_sign() {
        let left = ExceptionGap::new("MTN", "OCM", 5000.0, 1000.0);
        assert_eq!(gap_sentence(&left), "exception gap between MTN and OCM is 4,000 seconds");
        let right = ExceptionGap::new("MTN", "OCM", 1000.0, 5000.0);
        assert_eq!(gap_sentence(&right), "exception gap between OCM and MTN is 4,000 seconds");
        let even = ExceptionGap::new("MTN", "OCM", 10.0, 10.0);
        assert_eq!(gap_sentence(&even), "no exception gap between MTN and OCM");
    }

    #[test]
    fn sample_shows_all_columns() {
        let ds = Dataset::with_records(
            "OCM",
            vec!["a_number".into(), "duration".into()],
            vec![
                Record::from_values(&["1", "10"]),
                Record::new(vec![None, Some("5".into())]),
            ],
        );
        let out = render_sample(&ds);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  a_number  duration");
        assert_eq!(lines[1], "  1         10");
        assert_eq!(lines[2], "            5");
    }
}
