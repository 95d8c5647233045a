use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "llms_txt_cache_hit_total",
            Unit::Count,
            "Total number of document cache hits."
        );
        describe_counter!(
            "llms_txt_cache_miss_total",
            Unit::Count,
            "Total number of document cache misses."
        );
        describe_counter!(
            "llms_txt_cache_invalidate_total",
            Unit::Count,
            "Total number of cached documents dropped by invalidation."
        );
        describe_counter!(
            "llms_txt_refresh_total",
            Unit::Count,
            "Scheduled freshness checks, labelled by outcome."
        );
        describe_histogram!(
            "llms_txt_generate_ms",
            Unit::Milliseconds,
            "Document serving latency in milliseconds, including cache lookups."
        );
    });
}
