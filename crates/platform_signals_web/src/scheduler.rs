//! Scheduler selection for the current target.

use std::rc::Rc;

use platform_signals::Scheduler;

/// Runs deferred flushes and acquisitions as browser microtasks.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrotaskScheduler;

#[cfg(target_arch = "wasm32")]
impl Scheduler for MicrotaskScheduler {
    fn spawn(&self, task: futures::future::LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Microtask scheduler on `wasm32`; a [`platform_signals::LocalPoolScheduler`] elsewhere.
///
/// The pool is never driven by this crate. Detached environments produce no native events, so
/// nothing is ever queued on it unless the host writes through an adapter.
pub fn host_scheduler() -> Rc<dyn Scheduler> {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(MicrotaskScheduler)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(platform_signals::LocalPoolScheduler::new())
    }
}
