use platform_signals::{Platform, PlatformConfig, PlatformEnv, Runtime};

use crate::scheduler::host_scheduler;

/// Compile-time selected host strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// `web-sys` objects of the current page.
    Browser,
    /// No native globals; every adapter serves its defaults.
    Detached,
}

/// Returns the host strategy of the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(target_arch = "wasm32")]
    {
        HostStrategy::Browser
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        HostStrategy::Detached
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::Detached => "detached",
    }
}

/// Native handles for the selected host.
pub fn browser_env() -> PlatformEnv {
    #[cfg(target_arch = "wasm32")]
    {
        crate::native::browser_env()
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        PlatformEnv::detached()
    }
}

/// Reactive runtime driven by [`host_scheduler`].
pub fn browser_runtime() -> Runtime {
    Runtime::new(host_scheduler())
}

/// Ready-to-use platform for the selected host.
pub fn browser_platform(config: PlatformConfig) -> Platform {
    let platform = Platform::new(browser_runtime(), browser_env(), config);
    tracing::debug!(host = host_strategy_name(), "browser platform assembled");
    platform
}
