//! Lazily-activated subscription unit binding native events to the reactive graph.
//!
//! An [`ObservableBridge`] owns one [`Atom`] plus a metadata bag. Adapters call
//! [`ObservableBridge::report_observed`] from their getters; the first observer triggers the
//! activation callback (attach native listeners, start acquisitions) and the last observer
//! leaving triggers the deactivation callback (detach, clear handles).

use std::{
    cell::{Ref, RefCell, RefMut},
    rc::{Rc, Weak},
};

use crate::{
    native::{Listener, ListenerGuard},
    reactive::{Atom, Runtime},
};

type Callback<M> = Box<dyn Fn(&ObservableBridge<M>)>;

/// Metadata of bridges whose only state is their native listener registrations.
pub type ListenerSet = Vec<ListenerGuard>;

struct BridgeInner<M> {
    label: String,
    atom: Atom,
    meta: RefCell<M>,
}

/// Reactive cell with activation hooks and adapter-owned metadata.
///
/// Cloning yields another handle to the same bridge.
pub struct ObservableBridge<M = ()> {
    inner: Rc<BridgeInner<M>>,
}

impl<M> Clone for ObservableBridge<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<M> std::fmt::Debug for ObservableBridge<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableBridge")
            .field("label", &self.inner.label)
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}

/// Non-owning bridge handle held by native callbacks and in-flight acquisitions.
pub struct WeakBridge<M> {
    inner: Weak<BridgeInner<M>>,
}

impl<M> Clone for WeakBridge<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<M> WeakBridge<M> {
    /// Returns the bridge if it is still alive.
    pub fn upgrade(&self) -> Option<ObservableBridge<M>> {
        self.inner.upgrade().map(|inner| ObservableBridge { inner })
    }
}

/// Debug labels are kept in debug builds only.
fn debug_label(label: &str) -> String {
    if cfg!(debug_assertions) {
        label.to_string()
    } else {
        String::new()
    }
}

impl<M: 'static> ObservableBridge<M> {
    /// Creates a bridge. Never touches native APIs.
    ///
    /// `on_activate` runs when the observer count goes from zero to one, `on_deactivate` when
    /// it drops back to zero. Both receive the bridge so they can reach the metadata bag.
    pub fn new(
        runtime: &Runtime,
        label: &str,
        on_activate: impl Fn(&ObservableBridge<M>) + 'static,
        on_deactivate: impl Fn(&ObservableBridge<M>) + 'static,
        meta: M,
    ) -> Self {
        let on_activate: Callback<M> = Box::new(on_activate);
        let on_deactivate: Callback<M> = Box::new(on_deactivate);
        let label = debug_label(label);
        let inner = Rc::new_cyclic(|weak: &Weak<BridgeInner<M>>| {
            let activate_ref = weak.clone();
            let deactivate_ref = weak.clone();
            let atom = runtime.atom_with_hooks(
                label.clone(),
                move || {
                    if let Some(inner) = activate_ref.upgrade() {
                        on_activate(&ObservableBridge { inner });
                    }
                },
                move || {
                    if let Some(inner) = deactivate_ref.upgrade() {
                        on_deactivate(&ObservableBridge { inner });
                    }
                },
            );
            BridgeInner {
                label,
                atom,
                meta: RefCell::new(meta),
            }
        });
        Self { inner }
    }

    /// Creates a bridge without activation work, used for purely local reactive state.
    pub fn passive(runtime: &Runtime, label: &str, meta: M) -> Self {
        Self::new(runtime, label, |_| {}, |_| {}, meta)
    }
}

impl ObservableBridge<ListenerSet> {
    /// Creates a bridge that registers `attach`'s listeners while observed.
    ///
    /// `attach` receives the bridge notifier and returns one guard per registration; an absent
    /// native object simply yields no guards.
    pub fn listening(
        runtime: &Runtime,
        label: &str,
        attach: impl Fn(&Listener) -> ListenerSet + 'static,
    ) -> Self {
        Self::new(
            runtime,
            label,
            move |bridge: &ObservableBridge<ListenerSet>| {
                let guards = attach(&bridge.notifier());
                tracing::trace!(bridge = bridge.label(), listeners = guards.len(), "attached");
                let previous = std::mem::replace(&mut *bridge.meta_mut(), guards);
                drop(previous);
            },
            |bridge: &ObservableBridge<ListenerSet>| {
                let guards = std::mem::take(&mut *bridge.meta_mut());
                tracing::trace!(bridge = bridge.label(), listeners = guards.len(), "detached");
                drop(guards);
            },
            Vec::new(),
        )
    }
}

impl<M> ObservableBridge<M> {
    /// Registers the bridge as a dependency of the current tracked computation.
    ///
    /// Returns `false` outside tracking. The first observer activates the bridge before this
    /// call returns.
    pub fn report_observed(&self) -> bool {
        self.inner.atom.report_observed()
    }

    /// Marks every dependent stale; reruns happen on the next scheduler tick.
    pub fn report_changed(&self) {
        self.inner.atom.report_changed();
    }

    /// Listener that reports a change through a weak reference to this bridge.
    pub fn notifier(&self) -> Listener
    where
        M: 'static,
    {
        let weak = self.downgrade();
        Rc::new(move || {
            if let Some(bridge) = weak.upgrade() {
                bridge.report_changed();
            }
        })
    }

    /// Immutable access to the metadata bag.
    pub fn meta(&self) -> Ref<'_, M> {
        self.inner.meta.borrow()
    }

    /// Mutable access to the metadata bag.
    pub fn meta_mut(&self) -> RefMut<'_, M> {
        self.inner.meta.borrow_mut()
    }

    /// Number of dependents currently observing the bridge.
    pub fn observer_count(&self) -> usize {
        self.inner.atom.observer_count()
    }

    /// Returns whether at least one dependent observes the bridge.
    pub fn is_observed(&self) -> bool {
        self.observer_count() > 0
    }

    /// Debug label (empty in release builds).
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Creates a non-owning handle.
    pub fn downgrade(&self) -> WeakBridge<M> {
        WeakBridge {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::reactive::LocalPoolScheduler;

    #[derive(Default)]
    struct Counters {
        activations: usize,
        deactivations: usize,
    }

    fn counting_bridge(runtime: &Runtime) -> ObservableBridge<Counters> {
        ObservableBridge::new(
            runtime,
            "counting",
            |bridge: &ObservableBridge<Counters>| bridge.meta_mut().activations += 1,
            |bridge: &ObservableBridge<Counters>| bridge.meta_mut().deactivations += 1,
            Counters::default(),
        )
    }

    #[test]
    fn activation_follows_observer_transitions() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let bridge = counting_bridge(&runtime);
        assert!(!bridge.report_observed());
        assert_eq!(bridge.meta().activations, 0);

        let reader = bridge.clone();
        let first = runtime.autorun("first", move || {
            reader.report_observed();
        });
        let reader = bridge.clone();
        let second = runtime.autorun("second", move || {
            reader.report_observed();
        });
        assert_eq!(bridge.meta().activations, 1);
        assert_eq!(bridge.observer_count(), 2);

        drop(first);
        drop(second);
        assert_eq!(bridge.meta().deactivations, 1);

        let reader = bridge.clone();
        let _third = runtime.autorun("third", move || {
            reader.report_observed();
        });
        assert_eq!(bridge.meta().activations, 2);
    }

    #[test]
    fn activation_runs_before_report_observed_returns() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let bridge = ObservableBridge::new(
            &runtime,
            "sync",
            |bridge: &ObservableBridge<bool>| *bridge.meta_mut() = true,
            |bridge: &ObservableBridge<bool>| *bridge.meta_mut() = false,
            false,
        );
        let seen = Rc::new(Cell::new(false));
        let seen_in = seen.clone();
        let reader = bridge.clone();
        let _reaction = runtime.autorun("reader", move || {
            reader.report_observed();
            seen_in.set(*reader.meta());
        });
        assert!(seen.get());
    }

    #[test]
    fn notifier_reports_through_weak_handle() {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let bridge = ObservableBridge::passive(&runtime, "notify", ());
        let runs = Rc::new(Cell::new(0));
        let runs_in = runs.clone();
        let reader = bridge.clone();
        let _reaction = runtime.autorun("reader", move || {
            reader.report_observed();
            runs_in.set(runs_in.get() + 1);
        });

        let notify = bridge.notifier();
        notify();
        scheduler.run_until_stalled();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn listening_bridge_holds_guards_only_while_observed() {
        use crate::native::{memory::MemoryEventTarget, EventTarget};

        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let target = Rc::new(MemoryEventTarget::default());
        let attach_target = target.clone();
        let bridge = ObservableBridge::listening(&runtime, "resize", move |notify| {
            vec![attach_target.add_listener("resize", notify.clone())]
        });
        assert_eq!(target.listener_count("resize"), 0);

        let reader = bridge.clone();
        let reaction = runtime.autorun("reader", move || {
            reader.report_observed();
        });
        assert_eq!(target.listener_count("resize"), 1);
        assert_eq!(bridge.meta().len(), 1);

        drop(reaction);
        assert_eq!(target.listener_count("resize"), 0);
        assert!(bridge.meta().is_empty());
    }

    #[test]
    fn labels_are_kept_in_debug_builds() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let bridge = ObservableBridge::passive(&runtime, "batteryStatus", ());
        if cfg!(debug_assertions) {
            assert_eq!(bridge.label(), "batteryStatus");
        } else {
            assert_eq!(bridge.label(), "");
        }
    }
}
