use std::cmp::Reverse;
use std::collections::HashMap;

use crate::error::ReconError;
use crate::model::{Dataset, TopRow, TopTable};
use crate::summary::measure_value;

/// Number of groups kept in a ranking unless configured otherwise.
pub const DEFAULT_TOP_LIMIT: usize = 15;

/// Group rows by `group_key`, count rows and sum `measure_key` per group.
///
/// Groups come out in first-seen order. Missing keys form a group of their own.
pub fn aggregate_groups(
    table: &Dataset,
    group_key: &str,
    measure_key: &str,
) -> Result<Vec<TopRow>, ReconError> {
    let key_idx = table.column_index(group_key)?;
    let measure_idx = table.column_index(measure_key)?;

    let mut slots: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<TopRow> = Vec::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let value = measure_value(table, row_idx, measure_idx)?;
        let key = row.get(key_idx);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(TopRow {
                key: key.map(str::to_string),
                call_count: 0,
                measure_sum: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].call_count += 1;
        groups[slot].measure_sum += value;
    }

    Ok(groups)
}

/// Rank groups by call count, descending, keeping at most `limit`.
///
/// The sort is stable: groups with equal counts stay in first-seen order.
pub fn top_groups(
    table: &Dataset,
    group_key: &str,
    measure_key: &str,
    limit: usize,
) -> Result<TopTable, ReconError> {
    let mut rows = aggregate_groups(table, group_key, measure_key)?;
    let distinct = rows.len();
    rows.sort_by_key(|g| Reverse(g.call_count));
    rows.truncate(limit);

    log::debug!(
        "top {} by {}: {} groups, kept {}",
        table.carrier,
        group_key,
        distinct,
        rows.len()
    );

    Ok(TopTable {
        group_key: group_key.to_string(),
        measure_key: measure_key.to_string(),
        rows,
    })
}
