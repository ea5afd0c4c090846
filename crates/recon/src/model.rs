use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::config::{FieldMap, NullKeyPolicy};
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single cell. `None` is a missing value (empty field in the source file).
pub type Cell = Option<String>;

/// One CDR row, cells aligned with the owning dataset's columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    pub cells: Vec<Cell>,
}

impl Record {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Build a record where every cell is present.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            cells: values.iter().map(|v| Some(v.as_ref().to_string())).collect(),
        }
    }

    /// Cell text at `idx`. Missing cells and out-of-range indexes both read as `None`.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }
}

/// An ordered CDR table from one carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub carrier: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Dataset {
    pub fn new(carrier: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            carrier: carrier.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_records(
        carrier: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Record>,
    ) -> Self {
        Self {
            carrier: carrier.into(),
            columns,
            rows,
        }
    }

    /// Same carrier and columns, different rows.
    pub fn with_rows(&self, rows: Vec<Record>) -> Self {
        Self {
            carrier: self.carrier.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name (case-sensitive) to its index.
    pub fn column_index(&self, name: &str) -> Result<usize, ReconError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReconError::MissingColumn {
                carrier: self.carrier.clone(),
                column: name.to_string(),
            })
    }

    /// Up to `n` randomly chosen rows, kept in their original order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Dataset {
        let amount = n.min(self.rows.len());
        let mut picked = rand::seq::index::sample(rng, self.rows.len(), amount).into_vec();
        picked.sort_unstable();
        self.with_rows(picked.into_iter().map(|i| self.rows[i].clone()).collect())
    }
}

/// Datasets keyed by carrier tag.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub datasets: HashMap<String, Dataset>,
}

impl ReconInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under its own carrier tag, replacing any previous one.
    pub fn insert(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.carrier.clone(), dataset);
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Rows of each side whose key never appears on the other side.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionPair {
    pub left: Dataset,
    pub right: Dataset,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRow {
    pub key: Cell,
    pub call_count: usize,
    pub measure_sum: f64,
}

/// Groups ranked by call count, descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTable {
    pub group_key: String,
    pub measure_key: String,
    pub rows: Vec<TopRow>,
}

impl TopTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub row_count: usize,
    pub measure_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapDirection {
    LeftLarger,
    RightLarger,
    Even,
}

/// Signed difference of exception traffic: `left - right`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionGap {
    pub left_carrier: String,
    pub right_carrier: String,
    pub seconds: f64,
}

impl ExceptionGap {
    pub fn new(left_carrier: &str, right_carrier: &str, left_sum: f64, right_sum: f64) -> Self {
        Self {
            left_carrier: left_carrier.to_string(),
            right_carrier: right_carrier.to_string(),
            seconds: crate::summary::exception_gap(left_sum, right_sum),
        }
    }

    pub fn direction(&self) -> GapDirection {
        if self.seconds > 0.0 {
            GapDirection::LeftLarger
        } else if self.seconds < 0.0 {
            GapDirection::RightLarger
        } else {
            GapDirection::Even
        }
    }

    pub fn abs(&self) -> f64 {
        self.seconds.abs()
    }
}

/// Everything computed for one carrier of the pair.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierReport {
    pub carrier: String,
    pub fields: FieldMap,
    /// Totals over the dataset as loaded.
    pub totals: SummaryStats,
    pub top: TopTable,
    pub exception_totals: SummaryStats,
    pub exception_top: TopTable,
    #[serde(skip_serializing)]
    pub exceptions: Dataset,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub top_limit: usize,
    pub null_keys: NullKeyPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub left: CarrierReport,
    pub right: CarrierReport,
    pub gap: ExceptionGap,
}
