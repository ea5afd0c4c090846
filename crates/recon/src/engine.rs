use crate::aggregate::top_groups;
use crate::cache::ReconCache;
use crate::config::{FieldMap, ReconConfig};
use crate::error::ReconError;
use crate::matcher::reconcile_with_policy;
use crate::model::{
    CarrierReport, Dataset, ExceptionGap, ReconInput, ReconMeta, ReconReport, TopTable,
};
use crate::summary::summary_stats;

/// Run reconciliation for the configured pair. Returns exception sets,
/// rankings and totals for both carriers plus the exception gap.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconReport, ReconError> {
    run_with(config, input, None)
}

/// Same as [`run`], reusing results from `cache` when inputs are unchanged.
pub fn run_cached(
    config: &ReconConfig,
    input: &ReconInput,
    cache: &mut ReconCache,
) -> Result<ReconReport, ReconError> {
    run_with(config, input, Some(cache))
}

fn run_with(
    config: &ReconConfig,
    input: &ReconInput,
    mut cache: Option<&mut ReconCache>,
) -> Result<ReconReport, ReconError> {
    let left_name = config.pair.left.as_str();
    let right_name = config.pair.right.as_str();
    let left_fields = config.carrier(left_name)?.fields();
    let right_fields = config.carrier(right_name)?.fields();

    let left = dataset(input, left_name)?;
    let right = dataset(input, right_name)?;

    let exceptions = match cache.as_deref_mut() {
        Some(cache) => cache
            .reconcile(left, &left_fields.key, right, &right_fields.key, config.null_keys)?
            .clone(),
        None => reconcile_with_policy(
            left,
            &left_fields.key,
            right,
            &right_fields.key,
            config.null_keys,
        )?,
    };

    let left_report = carrier_report(
        cache.as_deref_mut(),
        left_name,
        left,
        left_fields,
        exceptions.left,
        config.top_limit,
    )?;
    let right_report = carrier_report(
        cache.as_deref_mut(),
        right_name,
        right,
        right_fields,
        exceptions.right,
        config.top_limit,
    )?;

    let gap = ExceptionGap::new(
        left_name,
        right_name,
        left_report.exception_totals.measure_sum,
        right_report.exception_totals.measure_sum,
    );

    log::info!(
        "{}: {} {} exceptions, {} {} exceptions, gap {}s",
        config.name,
        left_report.exception_totals.row_count,
        left_name,
        right_report.exception_totals.row_count,
        right_name,
        gap.seconds
    );

    Ok(ReconReport {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            top_limit: config.top_limit,
            null_keys: config.null_keys,
        },
        left: left_report,
        right: right_report,
        gap,
    })
}

fn dataset<'a>(input: &'a ReconInput, carrier: &str) -> Result<&'a Dataset, ReconError> {
    input
        .datasets
        .get(carrier)
        .ok_or_else(|| ReconError::MissingDataset(carrier.to_string()))
}

/// Totals and ranking over the dataset as loaded, then over its exceptions.
fn carrier_report(
    mut cache: Option<&mut ReconCache>,
    carrier: &str,
    loaded: &Dataset,
    fields: FieldMap,
    exceptions: Dataset,
    limit: usize,
) -> Result<CarrierReport, ReconError> {
    let totals = summary_stats(loaded, &fields.measure)?;
    let top = ranking(cache.as_deref_mut(), loaded, &fields, limit)?;
    let exception_totals = summary_stats(&exceptions, &fields.measure)?;
    let exception_top = ranking(cache, &exceptions, &fields, limit)?;

    Ok(CarrierReport {
        carrier: carrier.to_string(),
        fields,
        totals,
        top,
        exception_totals,
        exception_top,
        exceptions,
    })
}

fn ranking(
    cache: Option<&mut ReconCache>,
    table: &Dataset,
    fields: &FieldMap,
    limit: usize,
) -> Result<TopTable, ReconError> {
    match cache {
        Some(cache) => cache
            .top_groups(table, &fields.key, &fields.measure, limit)
            .cloned(),
        None => top_groups(table, &fields.key, &fields.measure, limit),
    }
}
