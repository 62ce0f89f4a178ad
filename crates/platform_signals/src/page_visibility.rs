//! Page Visibility API adapter.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{DocumentApi, EventTarget, PlatformEnv},
    reactive::Runtime,
    types::VisibilityState,
};

/// Reactive `document.visibilityState`.
#[derive(Clone)]
pub struct PageVisibility {
    bridge: ObservableBridge<ListenerSet>,
    document: Option<Rc<dyn DocumentApi>>,
}

impl PageVisibility {
    /// Creates the adapter without touching the document.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let target = env.document.clone();
        let bridge = ObservableBridge::listening(runtime, "page-visibility", move |notify| {
            target
                .iter()
                .map(|document| document.add_listener("visibilitychange", notify.clone()))
                .collect()
        });
        Self {
            bridge,
            document: env.document.clone(),
        }
    }

    /// Current state; `visible` without a document.
    pub fn visibility_state(&self) -> VisibilityState {
        self.bridge.report_observed();
        self.document
            .as_ref()
            .map_or(VisibilityState::Visible, |document| {
                document.visibility_state()
            })
    }

    /// `visibility_state() == Visible`
    pub fn is_visible(&self) -> bool {
        self.visibility_state() == VisibilityState::Visible
    }

    /// `visibility_state() == Hidden`
    pub fn is_hidden(&self) -> bool {
        !self.is_visible()
    }
}
