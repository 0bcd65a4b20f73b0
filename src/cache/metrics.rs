//! Metric names emitted by the cache.

pub const METRIC_KEYS_REMOVED: &str = "dataset_cache_keys_removed_total";
pub const METRIC_NAMESPACES_CLEARED: &str = "dataset_cache_namespaces_cleared_total";
pub const METRIC_PERMISSION_DENIED: &str = "dataset_cache_permission_denied_total";
pub const METRIC_REFRESH_SKIPPED: &str = "dataset_cache_refresh_skipped_total";
pub const METRIC_CACHE_HIT: &str = "dataset_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "dataset_cache_miss_total";
pub const METRIC_CLEAR_MS: &str = "dataset_cache_clear_ms";
