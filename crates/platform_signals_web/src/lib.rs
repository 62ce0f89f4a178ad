//! Browser (`wasm32`) host for [`platform_signals`].
//!
//! Native contracts are implemented over `web-sys` in `native` (wasm only). On every other
//! target the same entry points return a detached environment, so server-side rendering and
//! native tests see the documented adapter defaults.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host selection and platform assembly.
pub mod host;
pub mod logging;
#[cfg(target_arch = "wasm32")]
pub mod native;
pub mod scheduler;

pub use host::{
    browser_env, browser_platform, browser_runtime, host_strategy_name, selected_host_strategy,
    HostStrategy,
};
pub use logging::{init_logging, DEFAULT_LOG_FILTER};
#[cfg(target_arch = "wasm32")]
pub use scheduler::MicrotaskScheduler;
pub use scheduler::host_scheduler;
