//! Minimal single-threaded dependency-tracking graph.
//!
//! Platform adapters only need three things from a reactive host: an observable cell with
//! on-observed/on-unobserved hooks, a way to report reads, and a way to report changes. This
//! module provides exactly that so adapters can run without an external framework:
//!
//! - [`Atom`]: observable cell with optional activation hooks.
//! - [`Reaction`]: RAII handle for a tracked computation; dropping it unsubscribes.
//! - [`Runtime`]: tracking stack, pending queue and [`Scheduler`] hand-off.
//!
//! # Invariants
//!
//! 1. An atom's on-observed hook fires only on the 0→1 observer transition and its
//!    on-unobserved hook only on the 1→0 transition.
//! 2. Reading the same atom twice in one run registers one dependency.
//! 3. [`Atom::report_changed`] never runs reactions synchronously; it schedules one flush.
//! 4. A stale reaction is queued at most once per flush regardless of how many changes hit it.

mod atom;
mod reaction;
mod runtime;

pub use atom::Atom;
pub use reaction::Reaction;
pub use runtime::{LocalPoolScheduler, Runtime, Scheduler, MAX_FLUSH_ROUNDS};
