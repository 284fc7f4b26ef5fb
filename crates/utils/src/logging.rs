use sentry_tracing::EventFilter;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "info,server=debug,services=debug,db=debug";

/// Install the global subscriber: fmt output filtered by `RUST_LOG`, plus a sentry
/// layer forwarding errors (and warnings as breadcrumbs) when sentry is enabled.
pub fn init_tracing(with_sentry: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let sentry_layer = with_sentry.then(|| {
        sentry_tracing::layer().event_filter(|meta| match *meta.level() {
            Level::ERROR => EventFilter::Event,
            Level::WARN => EventFilter::Breadcrumb,
            _ => EventFilter::Ignore,
        })
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(sentry_layer)
        .init();
}
