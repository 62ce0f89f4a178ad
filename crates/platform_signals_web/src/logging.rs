//! Global `tracing` subscriber installation.

use platform_signals::PlatformError;

/// Default directive used when neither the caller nor `RUST_LOG` provides one.
pub const DEFAULT_LOG_FILTER: &str = "platform_signals=info,platform_signals_web=info";

/// Installs the process-wide subscriber.
///
/// On `wasm32` events go to the browser console through `tracing-wasm`; elsewhere a compact
/// `tracing-subscriber` formatter writes to stdout, filtered by `RUST_LOG` or `filter`.
///
/// # Errors
///
/// Returns [`PlatformError::Config`] when the filter is invalid or a subscriber is already set.
pub fn init_logging(filter: &str) -> Result<(), PlatformError> {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = filter;
        tracing_wasm::try_set_as_global_default()
            .map_err(|err| PlatformError::Config(format!("failed to initialize logging: {err}")))
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter))
            .map_err(|err| PlatformError::Config(format!("invalid log filter: {err}")))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()
            .map_err(|err| PlatformError::Config(format!("failed to initialize logging: {err}")))
    }
}
