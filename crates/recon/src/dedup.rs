use std::collections::HashSet;

use crate::model::{Dataset, Record};

/// Drop rows identical in every cell to an earlier row. First occurrences keep
/// their relative order.
pub fn deduplicate(dataset: &Dataset) -> Dataset {
    let mut seen: HashSet<&Record> = HashSet::with_capacity(dataset.rows.len());
    let rows: Vec<Record> = dataset
        .rows
        .iter()
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect();

    log::debug!(
        "dedup {}: {} rows -> {} rows",
        dataset.carrier,
        dataset.len(),
        rows.len()
    );

    dataset.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(rows: &[&[&str]]) -> Dataset {
        Dataset::with_records(
            "OCM",
            vec!["a_number".into(), "duration".into()],
            rows.iter().map(|r| Record::from_values(*r)).collect(),
        )
    }

    #[test]
    fn removes_exact_duplicates_keeping_first() {
        let input = ds(&[&["1", "10"], &["2", "5"], &["1", "10"], &["3", "1"], &["2", "5"]]);
        let out = deduplicate(&input);
        assert_eq!(out, ds(&[&["1", "10"], &["2", "5"], &["3", "1"]]));
    }

    #[test]
    fn same_key_different_duration_is_kept() {
        let input = ds(&[&["1", "10"], &["1", "11"]]);
        assert_eq!(deduplicate(&input).len(), 2);
    }

    #[test]
    fn missing_cells_compare_equal() {
        let mut input = Dataset::new("OCM", vec!["a_number".into(), "duration".into()]);
        input.push(Record::new(vec![None, Some("4".into())]));
        input.push(Record::new(vec![None, Some("4".into())]));
        input.push(Record::new(vec![Some("".into()), Some("4".into())]));
        let out = deduplicate(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows[0].get(0), None);
        assert_eq!(out.rows[1].get(0), Some(""));
    }

    #[test]
    fn empty_in_empty_out() {
        let input = ds(&[]);
        let out = deduplicate(&input);
        assert!(out.is_empty());
        assert_eq!(out.columns, input.columns);
    }

    #[test]
    fn idempotent() {
        let input = ds(&[&["1", "10"], &["1", "10"], &["2", "5"]]);
        let once = deduplicate(&input);
        assert_eq!(deduplicate(&once), once);
    }
}
