use std::collections::HashSet;

use crate::config::NullKeyPolicy;
use crate::dedup::deduplicate;
use crate::error::ReconError;
use crate::model::{Dataset, ExceptionPair};

/// Symmetric exact-key difference of two datasets, with missing keys matching
/// each other.
///
/// Both sides are deduplicated first. `left` holds the rows of `a` whose key
/// value never appears in `b`'s key column; `right` is the mirror image. Keys
/// compare byte-for-byte: no trimming, no case folding.
pub fn reconcile(
    a: &Dataset,
    key_a: &str,
    b: &Dataset,
    key_b: &str,
) -> Result<ExceptionPair, ReconError> {
    reconcile_with_policy(a, key_a, b, key_b, NullKeyPolicy::default())
}

/// [`reconcile`] with an explicit rule for missing key values.
pub fn reconcile_with_policy(
    a: &Dataset,
    key_a: &str,
    b: &Dataset,
    key_b: &str,
    null_keys: NullKeyPolicy,
) -> Result<ExceptionPair, ReconError> {
    let a_idx = a.column_index(key_a)?;
    let b_idx = b.column_index(key_b)?;

    let a = deduplicate(a);
    let b = deduplicate(b);

    let a_keys = key_set(&a, a_idx);
    let b_keys = key_set(&b, b_idx);

    let left = exceptions(&a, a_idx, &b_keys, null_keys);
    let right = exceptions(&b, b_idx, &a_keys, null_keys);

    log::debug!(
        "reconcile {} ({}) vs {} ({}): {} / {} exceptions",
        a.carrier,
        a.len(),
        b.carrier,
        b.len(),
        left.len(),
        right.len()
    );

    Ok(ExceptionPair { left, right })
}

fn key_set(dataset: &Dataset, idx: usize) -> HashSet<Option<&str>> {
    dataset.rows.iter().map(|r| r.get(idx)).collect()
}

fn exceptions<'a>(
    dataset: &'a Dataset,
    idx: usize,
    other_keys: &HashSet<Option<&'a str>>,
    null_keys: NullKeyPolicy,
) -> Dataset {
    let rows = dataset
        .rows
        .iter()
        .filter(|r| match r.get(idx) {
            None if null_keys == NullKeyPolicy::NeverMatch => true,
            key => !other_keys.contains(&key),
        })
        .cloned()
        .collect();
    dataset.with_rows(rows)
}
