use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use super::{
    reaction::ReactionInner,
    runtime::{Runtime, RuntimeInner},
};

type Hook = Box<dyn Fn()>;

struct AtomInner {
    id: u64,
    label: String,
    runtime: Weak<RuntimeInner>,
    observers: RefCell<Vec<(u64, Weak<ReactionInner>)>>,
    on_observed: Option<Hook>,
    on_unobserved: Option<Hook>,
}

/// Observable cell carrying no value of its own.
///
/// Readers call [`Atom::report_observed`] before pulling state from somewhere else; writers
/// call [`Atom::report_changed`] afterwards. Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct Atom {
    inner: Rc<AtomInner>,
}

impl std::fmt::Debug for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("label", &self.inner.label)
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl Atom {
    pub(super) fn new(
        runtime: &Runtime,
        label: impl Into<String>,
        on_observed: Option<Hook>,
        on_unobserved: Option<Hook>,
    ) -> Self {
        let runtime = runtime.downgrade();
        let id = runtime.upgrade().map_or(0, |runtime| runtime.next_id());
        Self {
            inner: Rc::new(AtomInner {
                id,
                label: label.into(),
                runtime,
                observers: RefCell::new(Vec::new()),
                on_observed,
                on_unobserved,
            }),
        }
    }

    /// Debug label given at construction.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Number of reactions currently depending on this atom.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Returns whether both handles point to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers this atom as a dependency of the computation currently being tracked.
    ///
    /// Returns `false` when called outside a tracked computation. The first observer runs the
    /// on-observed hook before this call returns.
    pub fn report_observed(&self) -> bool {
        let Some(runtime) = self.inner.runtime.upgrade() else {
            return false;
        };
        let reaction = {
            let mut tracking = runtime.tracking.borrow_mut();
            let Some(frame) = tracking.last_mut() else {
                return false;
            };
            let Some(reaction) = frame.reaction.clone() else {
                return false;
            };
            if frame.observed.iter().any(|atom| atom.ptr_eq(self)) {
                return true;
            }
            frame.observed.push(self.clone());
            reaction
        };
        self.add_observer(&reaction);
        true
    }

    /// Queues every dependent reaction for the next flush.
    pub fn report_changed(&self) {
        let Some(runtime) = self.inner.runtime.upgrade() else {
            return;
        };
        let observers: Vec<Rc<ReactionInner>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .filter_map(|(_, reaction)| reaction.upgrade())
            .collect();
        for reaction in observers {
            runtime.enqueue(reaction);
        }
    }

    pub(super) fn add_observer(&self, reaction: &Rc<ReactionInner>) {
        let became_observed = {
            let mut observers = self.inner.observers.borrow_mut();
            if observers.iter().any(|(id, _)| *id == reaction.id()) {
                return;
            }
            observers.push((reaction.id(), Rc::downgrade(reaction)));
            observers.len() == 1
        };
        if became_observed {
            tracing::trace!(atom = %self.inner.label, id = self.inner.id, "atom observed");
            if let Some(hook) = &self.inner.on_observed {
                hook();
            }
        }
    }

    pub(super) fn remove_observer(&self, reaction_id: u64) {
        let became_unobserved = {
            let mut observers = self.inner.observers.borrow_mut();
            let before = observers.len();
            observers.retain(|(id, _)| *id != reaction_id);
            before != observers.len() && observers.is_empty()
        };
        if became_unobserved {
            tracing::trace!(atom = %self.inner.label, id = self.inner.id, "atom unobserved");
            if let Some(hook) = &self.inner.on_unobserved {
                hook();
            }
        }
    }
}
