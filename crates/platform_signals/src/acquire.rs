//! Bridges whose native handle arrives asynchronously (`getBattery()`, `permissions.query()`).
//!
//! States: no handle and nothing in flight is `Unsubscribed`; one shared in-flight request is
//! `Subscribing`; a settled handle with listeners attached is `Subscribed`. Concurrent
//! acquisitions share one future, the last settlement wins and nothing is retried
//! automatically.

use std::rc::Rc;

use futures::{
    future::{self, LocalBoxFuture, Shared},
    FutureExt,
};

use crate::{
    bridge::ObservableBridge,
    error::PlatformError,
    native::{Listener, ListenerGuard, NativeFuture},
    reactive::Runtime,
};

/// Shareable future that resolves once an acquisition settled, whatever the outcome.
pub type Acquisition = Shared<LocalBoxFuture<'static, ()>>;

/// Lifecycle of an asynchronously acquired native subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubscriptionState {
    /// No listener attached; reads return defaults.
    #[default]
    Unsubscribed,
    /// A native request is in flight.
    Subscribing,
    /// Native listeners are attached.
    Subscribed,
}

type Request<H> = Box<dyn Fn() -> Option<NativeFuture<Result<Rc<H>, PlatformError>>>>;
type Attach<H> = Box<dyn Fn(&H, &Listener) -> Vec<ListenerGuard>>;

struct Driver<H: ?Sized> {
    runtime: Runtime,
    api: &'static str,
    request: Request<H>,
    attach: Attach<H>,
}

pub(crate) struct AsyncSource<H: ?Sized> {
    handle: Option<Rc<H>>,
    loading: Option<Acquisition>,
    error: Option<PlatformError>,
    listeners: Vec<ListenerGuard>,
    driver: Rc<Driver<H>>,
}

/// Bridge plus the acquisition state machine around it.
pub(crate) struct AsyncBridge<H: ?Sized> {
    bridge: ObservableBridge<AsyncSource<H>>,
}

impl<H: ?Sized> Clone for AsyncBridge<H> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
        }
    }
}

impl<H: ?Sized + 'static> AsyncBridge<H> {
    /// `request` returns `None` when the API is absent; `attach` registers every native listener
    /// of the handle against the bridge notifier.
    pub(crate) fn new(
        runtime: &Runtime,
        label: &str,
        api: &'static str,
        request: impl Fn() -> Option<NativeFuture<Result<Rc<H>, PlatformError>>> + 'static,
        attach: impl Fn(&H, &Listener) -> Vec<ListenerGuard> + 'static,
    ) -> Self {
        let driver = Rc::new(Driver {
            runtime: runtime.clone(),
            api,
            request: Box::new(request),
            attach: Box::new(attach),
        });
        let bridge = ObservableBridge::new(
            runtime,
            label,
            activate::<H>,
            deactivate::<H>,
            AsyncSource {
                handle: None,
                loading: None,
                error: None,
                listeners: Vec::new(),
                driver,
            },
        );
        Self { bridge }
    }

    /// Registers the read with the current computation and returns the settled handle.
    pub(crate) fn observe(&self) -> Option<Rc<H>> {
        self.bridge.report_observed();
        self.bridge.meta().handle.clone()
    }

    /// Last acquisition failure (observed read).
    pub(crate) fn error(&self) -> Option<PlatformError> {
        self.bridge.report_observed();
        self.bridge.meta().error.clone()
    }

    /// Current lifecycle state (observed read).
    pub(crate) fn state(&self) -> SubscriptionState {
        self.bridge.report_observed();
        let meta = self.bridge.meta();
        if meta.loading.is_some() {
            SubscriptionState::Subscribing
        } else if meta.handle.is_some() && !meta.listeners.is_empty() {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Unsubscribed
        }
    }

    /// Clears the stored error and re-issues acquisition, sharing any request in flight.
    pub(crate) fn retry(&self) -> Acquisition {
        self.bridge.meta_mut().error = None;
        acquire(&self.bridge)
    }

    pub(crate) fn bridge(&self) -> &ObservableBridge<AsyncSource<H>> {
        &self.bridge
    }
}

fn activate<H: ?Sized + 'static>(bridge: &ObservableBridge<AsyncSource<H>>) {
    tracing::trace!(bridge = bridge.label(), "activating async source");
    let handle = bridge.meta().handle.clone();
    match handle {
        Some(handle) => attach_listeners(bridge, &handle),
        None => {
            let _ = acquire(bridge);
        }
    }
}

fn deactivate<H: ?Sized>(bridge: &ObservableBridge<AsyncSource<H>>) {
    tracing::trace!(bridge = bridge.label(), "deactivating async source");
    let (listeners, handle) = {
        let mut meta = bridge.meta_mut();
        (std::mem::take(&mut meta.listeners), meta.handle.take())
    };
    drop(listeners);
    drop(handle);
}

fn attach_listeners<H: ?Sized + 'static>(bridge: &ObservableBridge<AsyncSource<H>>, handle: &H) {
    let driver = Rc::clone(&bridge.meta().driver);
    let guards = (driver.attach)(handle, &bridge.notifier());
    let previous = std::mem::replace(&mut bridge.meta_mut().listeners, guards);
    drop(previous);
}

fn acquire<H: ?Sized + 'static>(bridge: &ObservableBridge<AsyncSource<H>>) -> Acquisition {
    let in_flight = bridge.meta().loading.clone();
    if let Some(loading) = in_flight {
        return loading;
    }

    let driver = Rc::clone(&bridge.meta().driver);
    let Some(request) = (driver.request)() else {
        tracing::debug!(api = driver.api, "native api absent; staying unsubscribed");
        return future::ready(()).boxed_local().shared();
    };

    let weak = bridge.downgrade();
    let task = async move {
        let outcome = request.await;
        if let Some(bridge) = weak.upgrade() {
            settle(&bridge, outcome);
        }
    }
    .boxed_local()
    .shared();

    bridge.meta_mut().loading = Some(task.clone());
    bridge.report_changed();
    driver.runtime.spawn(task.clone().boxed_local());
    task
}

fn settle<H: ?Sized + 'static>(
    bridge: &ObservableBridge<AsyncSource<H>>,
    outcome: Result<Rc<H>, PlatformError>,
) {
    let api = bridge.meta().driver.api;
    bridge.meta_mut().loading = None;
    match outcome {
        Ok(handle) => {
            {
                let mut meta = bridge.meta_mut();
                meta.error = None;
                meta.handle = Some(Rc::clone(&handle));
            }
            if bridge.is_observed() {
                attach_listeners(bridge, &handle);
            }
            tracing::trace!(api, "native handle acquired");
        }
        Err(error) => {
            tracing::warn!(api, %error, "platform acquisition failed");
            let listeners = {
                let mut meta = bridge.meta_mut();
                meta.error = Some(error);
                meta.handle = None;
                std::mem::take(&mut meta.listeners)
            };
            drop(listeners);
        }
    }
    bridge.report_changed();
}
