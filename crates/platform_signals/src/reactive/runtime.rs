use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use futures::{
    executor::{LocalPool, LocalSpawner},
    future::LocalBoxFuture,
    task::LocalSpawnExt,
    FutureExt,
};

use super::{atom::Atom, reaction::ReactionInner, Reaction};

/// Upper bound on consecutive flush rounds before the runtime gives up on a change cycle.
pub const MAX_FLUSH_ROUNDS: usize = 100;

/// Host event-loop hook used to defer flushes and drive async acquisitions.
pub trait Scheduler {
    /// Queues a local future to run on the host event loop.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// [`Scheduler`] backed by a `futures` [`LocalPool`].
///
/// Nothing runs until [`LocalPoolScheduler::run_until_stalled`] is called, which makes it the
/// scheduler of choice for tests and headless hosts that pump their own loop.
pub struct LocalPoolScheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl LocalPoolScheduler {
    /// Creates an idle pool.
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Runs every queued task until none can make progress.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }
}

impl Default for LocalPoolScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalPoolScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPoolScheduler").finish_non_exhaustive()
    }
}

impl Scheduler for LocalPoolScheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::warn!("local pool rejected task: {err}");
        }
    }
}

pub(super) struct TrackingFrame {
    pub(super) reaction: Option<Rc<ReactionInner>>,
    pub(super) observed: Vec<Atom>,
}

pub(crate) struct RuntimeInner {
    scheduler: Rc<dyn Scheduler>,
    next_id: Cell<u64>,
    pub(super) tracking: RefCell<Vec<TrackingFrame>>,
    pending: RefCell<Vec<Rc<ReactionInner>>>,
    flush_scheduled: Cell<bool>,
    flushing: Cell<bool>,
}

impl RuntimeInner {
    pub(super) fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub(super) fn enqueue(self: &Rc<Self>, reaction: Rc<ReactionInner>) {
        if reaction.is_disposed() || reaction.is_stale() {
            return;
        }
        reaction.mark_stale(true);
        self.pending.borrow_mut().push(reaction);
        self.schedule_flush();
    }

    fn schedule_flush(self: &Rc<Self>) {
        if self.flushing.get() || self.flush_scheduled.replace(true) {
            return;
        }
        let runtime = Rc::downgrade(self);
        self.scheduler.spawn(
            async move {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.flush();
                }
            }
            .boxed_local(),
        );
    }

    pub(super) fn flush(self: &Rc<Self>) -> usize {
        if self.flushing.replace(true) {
            return 0;
        }
        self.flush_scheduled.set(false);

        let mut runs = 0;
        let mut rounds = 0;
        loop {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                break;
            }
            rounds += 1;
            if rounds > MAX_FLUSH_ROUNDS {
                tracing::warn!(
                    pending = batch.len(),
                    "reaction flush exceeded {MAX_FLUSH_ROUNDS} rounds; dropping pending reruns"
                );
                for reaction in batch {
                    reaction.mark_stale(false);
                }
                self.pending.borrow_mut().clear();
                break;
            }
            for reaction in batch {
                if reaction.is_stale() && !reaction.is_disposed() {
                    reaction.run();
                    runs += 1;
                }
            }
        }

        self.flushing.set(false);
        runs
    }

    pub(super) fn untracked<T>(&self, f: impl FnOnce() -> T) -> T {
        self.tracking.borrow_mut().push(TrackingFrame {
            reaction: None,
            observed: Vec::new(),
        });
        let value = f();
        self.tracking.borrow_mut().pop();
        value
    }
}

/// Handle to a reactive graph instance.
///
/// Cloning yields another handle to the same graph.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("pending", &self.inner.pending.borrow().len())
            .field("flush_scheduled", &self.inner.flush_scheduled.get())
            .finish()
    }
}

impl Runtime {
    /// Creates a graph whose deferred work is handed to `scheduler`.
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                next_id: Cell::new(1),
                tracking: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
                flush_scheduled: Cell::new(false),
                flushing: Cell::new(false),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    /// Creates an atom without activation hooks.
    pub fn atom(&self, label: impl Into<String>) -> Atom {
        Atom::new(self, label, None, None)
    }

    /// Creates an atom whose hooks fire on the first observer and after the last one leaves.
    pub fn atom_with_hooks(
        &self,
        label: impl Into<String>,
        on_observed: impl Fn() + 'static,
        on_unobserved: impl Fn() + 'static,
    ) -> Atom {
        Atom::new(
            self,
            label,
            Some(Box::new(on_observed)),
            Some(Box::new(on_unobserved)),
        )
    }

    /// Runs `body` now, tracking its reads, and again on every flush after a dependency changed.
    pub fn autorun(&self, label: impl Into<String>, body: impl FnMut() + 'static) -> Reaction {
        let reaction = ReactionInner::new(&self.inner, label.into(), Box::new(body));
        reaction.run();
        Reaction::from_inner(reaction)
    }

    /// Tracks `expr` and calls `effect` with its new value whenever it changes.
    ///
    /// The effect is not invoked for the initial value and runs untracked.
    pub fn reaction<T, E, F>(&self, label: impl Into<String>, mut expr: E, mut effect: F) -> Reaction
    where
        T: PartialEq + 'static,
        E: FnMut() -> T + 'static,
        F: FnMut(&T) + 'static,
    {
        let runtime = Rc::downgrade(&self.inner);
        let mut previous: Option<T> = None;
        self.autorun(label, move || {
            let value = expr();
            let changed = previous.as_ref().is_some_and(|prev| *prev != value);
            if changed {
                match runtime.upgrade() {
                    Some(runtime) => runtime.untracked(|| effect(&value)),
                    None => effect(&value),
                }
            }
            previous = Some(value);
        })
    }

    /// Evaluates `f` without registering any dependency for the current computation.
    pub fn untracked<T>(&self, f: impl FnOnce() -> T) -> T {
        self.inner.untracked(f)
    }

    /// Runs every pending reaction synchronously and returns how many runs happened.
    pub fn flush(&self) -> usize {
        self.inner.flush()
    }

    /// Returns whether a flush is queued on the scheduler.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.flush_scheduled.get()
    }

    /// Hands a local future to the scheduler.
    pub fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.inner.scheduler.spawn(task);
    }
}
