use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use super::{
    atom::Atom,
    runtime::{RuntimeInner, TrackingFrame},
};

type Body = Box<dyn FnMut()>;

pub(crate) struct ReactionInner {
    id: u64,
    label: String,
    runtime: Weak<RuntimeInner>,
    body: RefCell<Option<Body>>,
    deps: RefCell<Vec<Atom>>,
    stale: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<u64>,
}

impl ReactionInner {
    pub(super) fn new(runtime: &Rc<RuntimeInner>, label: String, body: Body) -> Rc<Self> {
        Rc::new(Self {
            id: runtime.next_id(),
            label,
            runtime: Rc::downgrade(runtime),
            body: RefCell::new(Some(body)),
            deps: RefCell::new(Vec::new()),
            stale: Cell::new(false),
            disposed: Cell::new(false),
            runs: Cell::new(0),
        })
    }

    pub(super) fn id(&self) -> u64 {
        self.id
    }

    pub(super) fn is_stale(&self) -> bool {
        self.stale.get()
    }

    pub(super) fn mark_stale(&self, stale: bool) {
        self.stale.set(stale);
    }

    pub(super) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(super) fn run(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        self.stale.set(false);
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        // A reaction re-entering itself keeps its previous dependencies.
        let Some(mut body) = self.body.borrow_mut().take() else {
            return;
        };

        runtime.tracking.borrow_mut().push(TrackingFrame {
            reaction: Some(Rc::clone(self)),
            observed: Vec::new(),
        });
        body();
        let observed = runtime
            .tracking
            .borrow_mut()
            .pop()
            .map(|frame| frame.observed)
            .unwrap_or_default();
        self.runs.set(self.runs.get() + 1);

        if self.disposed.get() {
            for atom in observed {
                atom.remove_observer(self.id);
            }
            return;
        }
        *self.body.borrow_mut() = Some(body);

        let previous = std::mem::replace(&mut *self.deps.borrow_mut(), observed.clone());
        for atom in previous {
            if !observed.iter().any(|current| current.ptr_eq(&atom)) {
                atom.remove_observer(self.id);
            }
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        tracing::trace!(reaction = %self.label, "reaction disposed");
        let deps = std::mem::take(&mut *self.deps.borrow_mut());
        for atom in deps {
            atom.remove_observer(self.id);
        }
        self.body.borrow_mut().take();
    }
}

/// Handle to a tracked computation created by [`Runtime::autorun`](super::Runtime::autorun)
/// or [`Runtime::reaction`](super::Runtime::reaction).
///
/// Dropping the handle disposes the computation, which unobserves every dependency.
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("label", &self.inner.label)
            .field("runs", &self.inner.runs.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl Reaction {
    pub(super) fn from_inner(inner: Rc<ReactionInner>) -> Self {
        Self { inner }
    }

    /// Stops tracking and releases every dependency.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Returns whether [`Reaction::dispose`] already ran.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of times the body ran, including the initial run.
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Number of atoms the last run depended on.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }
}

impl Drop for Reaction {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}
