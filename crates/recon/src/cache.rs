//! Explicit memoization for repeated runs over unchanged inputs.
//!
//! Entries are keyed by a SHA-256 fingerprint of everything the result depends
//! on: dataset contents (carrier, columns, every cell), field names, null-key
//! policy and limit. Editing a dataset changes its fingerprint, so stale
//! entries are never returned. Each map holds at most `capacity` entries and
//! evicts the least recently used one, so results for superseded data are
//! dropped as new ones arrive; `clear` drops everything.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};

use crate::aggregate::top_groups;
use crate::config::NullKeyPolicy;
use crate::error::ReconError;
use crate::matcher::reconcile_with_policy;
use crate::model::{Dataset, ExceptionPair, TopTable};

pub type Fingerprint = [u8; 32];

/// Entries kept per operation. One run needs one reconciliation and four rankings.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Fingerprint-keyed store with least-recently-used eviction.
#[derive(Debug)]
struct Lru<V> {
    entries: HashMap<Fingerprint, V>,
    /// Most recently used at the front.
    order: VecDeque<Fingerprint>,
    capacity: usize,
}

impl<V> Lru<V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Cached value for `key`, computing and storing it on a miss. The bool is
    /// true on a hit. Failed computations store nothing.
    fn get_or_try_insert<E>(
        &mut self,
        key: Fingerprint,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<(&V, bool), E> {
        let hit = self.entries.contains_key(&key);
        if hit {
            self.order.retain(|k| *k != key);
        } else {
            let value = compute()?;
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_back() {
                    self.entries.remove(&oldest);
                }
            }
            self.entries.insert(key, value);
        }
        self.order.push_front(key);
        Ok((&self.entries[&key], hit))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[derive(Debug)]
pub struct ReconCache {
    exceptions: Lru<ExceptionPair>,
    rankings: Lru<TopTable>,
    hits: usize,
    misses: usize,
}

impl Default for ReconCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ReconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` results per operation (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            exceptions: Lru::new(capacity),
            rankings: Lru::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn reconcile(
        &mut self,
        a: &Dataset,
        key_a: &str,
        b: &Dataset,
        key_b: &str,
        null_keys: NullKeyPolicy,
    ) -> Result<&ExceptionPair, ReconError> {
        let mut hasher = Sha256::new();
        hasher.update(b"reconcile");
        hasher.update(fingerprint(a));
        hash_str(&mut hasher, key_a);
        hasher.update(fingerprint(b));
        hash_str(&mut hasher, key_b);
        hash_str(&mut hasher, &null_keys.to_string());
        let fp: Fingerprint = hasher.finalize().into();

        let (pair, hit) = self
            .exceptions
            .get_or_try_insert(fp, || reconcile_with_policy(a, key_a, b, key_b, null_keys))?;
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        Ok(pair)
    }

    pub fn top_groups(
        &mut self,
        table: &Dataset,
        group_key: &str,
        measure_key: &str,
        limit: usize,
    ) -> Result<&TopTable, ReconError> {
        let mut hasher = Sha256::new();
        hasher.update(b"top_groups");
        hasher.update(fingerprint(table));
        hash_str(&mut hasher, group_key);
        hash_str(&mut hasher, measure_key);
        hasher.update((limit as u64).to_le_bytes());
        let fp: Fingerprint = hasher.finalize().into();

        let (ranking, hit) = self
            .rankings
            .get_or_try_insert(fp, || top_groups(table, group_key, measure_key, limit))?;
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        Ok(ranking)
    }

    pub fn len(&self) -> usize {
        self.exceptions.len() + self.rankings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (hits, misses) since creation or the last `clear`.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.exceptions.clear();
        self.rankings.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Fingerprint of a dataset's carrier, columns and cells.
fn fingerprint(dataset: &Dataset) -> Fingerprint {
    let mut hasher = Sha256::new();
    hash_str(&mut hasher, &dataset.carrier);
    hasher.update((dataset.columns.len() as u64).to_le_bytes());
    for c in &dataset.columns {
        hash_str(&mut hasher, c);
    }
    hasher.update((dataset.rows.len() as u64).to_le_bytes());
    for row in &dataset.rows {
        hasher.update((row.cells.len() as u64).to_le_bytes());
        for cell in &row.cells {
            match cell {
                None => hasher.update([0u8]),
                Some(s) => {
                    hasher.update([1u8]);
                    hash_str(&mut hasher, s);
                }
            }
        }
    }
    hasher.finalize().into()
}

// Length-prefixed so that ["ab", "c"] and ["a", "bc"] hash differently.
fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn ds(carrier: &str, key: &str, rows: &[(&str, &str)]) -> Dataset {
        Dataset::with_records(
            carrier,
            vec![key.into(), "duration".into()],
            rows.iter().map(|(k, d)| Record::from_values(&[*k, *d])).collect(),
        )
    }

    #[test]
    fn repeated_reconcile_hits() {
        let a = ds("MTN", "A_NUMBER", &[("1", "10"), ("2", "5")]);
        let b = ds("OCM", "a_number", &[("1", "7")]);
        let mut cache = ReconCache::new();

        let first = cache
            .reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match)
            .unwrap()
            .clone();
        let second = cache
            .reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match)
            .unwrap()
            .clone();
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_dataset_misses() {
        let a = ds("MTN", "A_NUMBER", &[("1", "10"), ("2", "5")]);
        let mut b = ds("OCM", "a_number", &[("1", "7")]);
        let mut cache = ReconCache::new();

        let before = cache
            .reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match)
            .unwrap()
            .left
            .len();
        b.push(Record::from_values(&["2", "5"]));
        let after = cache
            .reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match)
            .unwrap()
            .left
            .len();

        assert_eq!(before, 1);
        assert_eq!(after, 0);
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn policy_and_limit_are_part_of_the_key() {
        let a = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let b = ds("OCM", "a_number", &[("1", "7")]);
        let mut cache = ReconCache::new();
        cache.reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match).unwrap();
        cache.reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::NeverMatch).unwrap();
        cache.top_groups(&a, "A_NUMBER", "duration", 15).unwrap();
        cache.top_groups(&a, "A_NUMBER", "duration", 5).unwrap();
        cache.top_groups(&a, "A_NUMBER", "duration", 5).unwrap();
        assert_eq!(cache.stats(), (1, 4));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn errors_are_not_cached() {
        let a = ds("MTN", "A_NUMBER", &[("1", "x")]);
        let mut cache = ReconCache::new();
        assert!(cache.top_groups(&a, "A_NUMBER", "duration", 15).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_resets() {
        let a = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let mut cache = ReconCache::new();
        cache.top_groups(&a, "A_NUMBER", "duration", 15).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 0));
    }

    #[test]
    fn fingerprint_distinguishes_missing_from_empty() {
        let mut x = Dataset::new("MTN", vec!["k".into()]);
        x.push(Record::new(vec![None]));
        let mut y = Dataset::new("MTN", vec!["k".into()]);
        y.push(Record::new(vec![Some(String::new())]));
        assert_ne!(fingerprint(&x), fingerprint(&y));
    }

    #[test]
    fn edited_dataset_does_not_grow_the_cache() {
        let mut a = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let b = ds("OCM", "a_number", &[("1", "7")]);
        let mut cache = ReconCache::new();

        let mut sizes = Vec::new();
        for i in 0..50 {
            a.push(Record::from_values(&[i.to_string().as_str(), "3"]));
            cache.reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match).unwrap();
            cache.top_groups(&a, "A_NUMBER", "duration", 15).unwrap();
            sizes.push(cache.len());
        }

        assert!(sizes.iter().all(|&n| n <= 2 * DEFAULT_CACHE_CAPACITY));
        assert_eq!(sizes[10], sizes[49]);
        assert_eq!(cache.stats(), (0, 100));
    }

    #[test]
    fn single_slot_cache_replaces_superseded_results() {
        let mut a = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let b = ds("OCM", "a_number", &[("1", "7")]);
        let mut cache = ReconCache::with_capacity(1);

        for i in 2..20 {
            a.push(Record::from_values(&[i.to_string().as_str(), "3"]));
            let left = cache
                .reconcile(&a, "A_NUMBER", &b, "a_number", NullKeyPolicy::Match)
                .unwrap()
                .left
                .len();
            assert_eq!(left, i - 1);
            let groups = cache.top_groups(&a, "A_NUMBER", "duration", 100).unwrap().len();
            assert_eq!(groups, i);
            assert_eq!(cache.len(), 2);
        }
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let x = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let y = ds("MTN", "A_NUMBER", &[("2", "10")]);
        let z = ds("MTN", "A_NUMBER", &[("3", "10")]);
        let mut cache = ReconCache::with_capacity(2);

        cache.top_groups(&x, "A_NUMBER", "duration", 15).unwrap();
        cache.top_groups(&y, "A_NUMBER", "duration", 15).unwrap();
        // x becomes most recent, so z pushes y out
        cache.top_groups(&x, "A_NUMBER", "duration", 15).unwrap();
        cache.top_groups(&z, "A_NUMBER", "duration", 15).unwrap();
        assert_eq!(cache.stats(), (1, 3));

        cache.top_groups(&x, "A_NUMBER", "duration", 15).unwrap();
        assert_eq!(cache.stats(), (2, 3));
        cache.top_groups(&y, "A_NUMBER", "duration", 15).unwrap();
        assert_eq!(cache.stats(), (2, 4));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_still_caches_one_entry() {
        let a = ds("MTN", "A_NUMBER", &[("1", "10")]);
        let mut cache = ReconCache::with_capacity(0);
        cache.top_groups(&a, "A_NUMBER", "duration", 15).unwrap();
        cache.top_groups(&a, "A_NUMBER", "duration", 15).unwrap();
        assert_eq!(cache.stats(), (1, 1));
    }
}
