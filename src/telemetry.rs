//! Structured (Bunyan JSON) logging for the relay.
//!
//! Every request gets a span from `TracingLogger`, and handlers add their own
//! through `#[tracing::instrument]`. Nothing logged here may contain the API
//! key in clear; use `ApiCredential::redacted`.

use tracing::subscriber::set_global_default;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_bunyan_formatter::BunyanFormattingLayer;
use tracing_bunyan_formatter::JsonStorageLayer;
use tracing_log::log::SetLoggerError;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Connection-level chatter from the HTTP stack; at `debug` it logs every
/// frame of every upstream call.
const QUIET_DEPENDENCIES: &[&str] = &["h2=warn", "hyper=warn", "hyper_util=warn", "rustls=warn"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to redirect `log` records to tracing")]
    Logger(#[from] SetLoggerError),
    #[error("a global tracing subscriber is already set")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// `filter_level` plus `QUIET_DEPENDENCIES`, unless `RUST_LOG` is set, in
/// which case it wins outright.
fn env_filter(filter_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = std::iter::once(filter_level)
            .chain(QUIET_DEPENDENCIES.iter().copied())
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(directives)
    })
}

/// Bunyan-formatted JSON logs, written to `sink` and tagged with `name`.
///
/// 'subscriber' is the `tracing` trait here, not someone on the mailing list.
/// `sink` is anything that can hand out writers (`std::io::stdout`, or a
/// closure returning an `io::Write`), not a writer itself.
pub fn get_subscriber<Sink>(
    name: &str,
    filter_level: &str,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    // must be a `MakeWriter` for every lifetime `'a`
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Registry::default()
        .with(env_filter(filter_level))
        // `JsonStorageLayer` must come before the formatter, which reads span
        // fields from it
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name.to_string(), sink))
}

/// Install `subscriber` globally. Call once, before `Application::build`, or
/// the startup logs (bound port, key status) are lost.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    // actix and reqwest still emit `log` records
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
