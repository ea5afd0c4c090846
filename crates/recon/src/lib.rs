//! `cdrecon-engine`: CDR exception reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded carrier datasets, returns exception
//! sets, rankings and summary scalars. No CLI or IO dependencies.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod summary;

pub use aggregate::{top_groups, DEFAULT_TOP_LIMIT};
pub use cache::{ReconCache, DEFAULT_CACHE_CAPACITY};
pub use config::{CarrierConfig, FieldMap, NullKeyPolicy, ReconConfig};
pub use dedup::deduplicate;
pub use engine::run;
pub use error::ReconError;
pub use matcher::{reconcile, reconcile_with_policy};
pub use model::{
    Cell, Dataset, ExceptionGap, ExceptionPair, GapDirection, ReconInput, ReconReport, Record,
    SummaryStats, TopRow, TopTable,
};
pub use summary::{exception_gap, summary_stats};
