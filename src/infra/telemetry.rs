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

pub const IMAGES_RENDERED_TOTAL: &str = "naas_images_rendered_total";
pub const RENDER_MS: &str = "naas_render_ms";
pub const RATE_LIMITED_TOTAL: &str = "naas_rate_limited_total";
pub const REASONS_SERVED_TOTAL: &str = "naas_reasons_served_total";

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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            IMAGES_RENDERED_TOTAL,
            Unit::Count,
            "Total number of PNG cards rendered, by variant and style."
        );
        describe_histogram!(
            RENDER_MS,
            Unit::Milliseconds,
            "Time spent drawing one card before encoding."
        );
        describe_counter!(
            RATE_LIMITED_TOTAL,
            Unit::Count,
            "Total number of requests rejected by the rate limiter."
        );
        describe_counter!(
            REASONS_SERVED_TOTAL,
            Unit::Count,
            "Total number of reasons returned as JSON."
        );
    });
}
