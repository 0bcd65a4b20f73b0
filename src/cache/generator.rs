//! Cache key generation.
//!
//! Chooses per call between a dataset-aware key and a plain structural key.

use super::error::CacheError;
use super::keys::{CacheKey, DatasetKey, KeyValue};
use super::locator::{CallArg, locate};

/// Build the key for a call.
///
/// Calls whose arguments carry a dataset identity get a dataset-aware key so
/// that per-dataset invalidation can find them later. Everything else gets a
/// structural key: `Empty` for no arguments, the bare value for a single
/// scalar argument, otherwise the whole tuple.
pub fn generate_key(args: &[CallArg]) -> CacheKey {
    match locate(args) {
        Some(datasets) => CacheKey::Dataset(DatasetKey::new(lower(args), datasets)),
        None => structural_key(args),
    }
}

/// Build a dataset-aware key or fail when the arguments name no datasets.
pub fn generate_dataset_aware_key(args: &[CallArg]) -> Result<CacheKey, CacheError> {
    let datasets = locate(args).ok_or_else(|| {
        CacheError::invalid_argument(format!(
            "no dataset identity among {} call argument(s)",
            args.len()
        ))
    })?;
    Ok(CacheKey::Dataset(DatasetKey::new(lower(args), datasets)))
}

fn structural_key(args: &[CallArg]) -> CacheKey {
    match args {
        [] => CacheKey::Empty,
        [only] => match only.to_key_value() {
            value @ (KeyValue::Null | KeyValue::List(_)) => CacheKey::Tuple(vec![value]),
            value => CacheKey::Single(value),
        },
        _ => CacheKey::Tuple(lower(args)),
    }
}

fn lower(args: &[CallArg]) -> Vec<KeyValue> {
    args.iter().map(CallArg::to_key_value).collect()
}
