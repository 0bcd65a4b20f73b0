use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metrics::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CLEAR_MS, METRIC_KEYS_REMOVED,
    METRIC_NAMESPACES_CLEARED, METRIC_PERMISSION_DENIED, METRIC_REFRESH_SKIPPED,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every cache metric with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_KEYS_REMOVED,
            Unit::Count,
            "Total number of cache entries removed by invalidation."
        );
        describe_counter!(
            METRIC_NAMESPACES_CLEARED,
            Unit::Count,
            "Total number of namespaces reported cleared."
        );
        describe_counter!(
            METRIC_PERMISSION_DENIED,
            Unit::Count,
            "Total number of cache resolutions denied by the permission check."
        );
        describe_counter!(
            METRIC_REFRESH_SKIPPED,
            Unit::Count,
            "Total number of full refreshes skipped because one was already running."
        );
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of memoized calls served from the cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of memoized calls that had to compute their result."
        );
        describe_histogram!(
            METRIC_CLEAR_MS,
            Unit::Milliseconds,
            "Invalidation latency in milliseconds."
        );
    });
}
