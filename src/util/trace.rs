//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Guard returned by [`init_tracing`]; flushes the chrome trace on drop.
#[cfg(feature = "trace")]
pub type TraceGuard = tracing_chrome::FlushGuard;
#[cfg(not(feature = "trace"))]
pub type TraceGuard = ();

/// Install a chrome trace writer on `trace.json` when `SDF_TRACER_TRACE=1`.
///
/// Hosts that log through `log` should call only this; without a global
/// subscriber, `tracing` events are forwarded to the `log` logger.
pub fn init_chrome_trace() -> Option<TraceGuard> {
    #[cfg(feature = "trace")]
    if std::env::var("SDF_TRACER_TRACE").ok().as_deref() == Some("1") {
        let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
            .file("trace.json")
            .build();
        let subscriber = tracing_subscriber::registry().with(chrome_layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            return None;
        }
        return Some(guard);
    }
    None
}

/// Install a global subscriber.
///
/// `SDF_TRACER_TRACE=1` writes a chrome trace to `trace.json`; otherwise a
/// fmt layer filtered by `RUST_LOG` is installed when that variable is set.
pub fn init_tracing() -> Option<TraceGuard> {
    if let Some(guard) = init_chrome_trace() {
        return Some(guard);
    }
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
    None
}
