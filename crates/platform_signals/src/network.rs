//! Online/offline status.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{EventTarget, NavigatorApi, PlatformEnv},
    reactive::Runtime,
};

/// Reactive `navigator.onLine`, refreshed by the window `online`/`offline` events.
#[derive(Clone)]
pub struct NetworkStatus {
    bridge: ObservableBridge<ListenerSet>,
    navigator: Option<Rc<dyn NavigatorApi>>,
}

impl NetworkStatus {
    /// Creates the adapter without touching the window.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let window = env.window.clone();
        let bridge = ObservableBridge::listening(runtime, "network-status", move |notify| {
            window
                .iter()
                .flat_map(|window| {
                    ["online", "offline"].map(|event| window.add_listener(event, notify.clone()))
                })
                .collect()
        });
        Self {
            bridge,
            navigator: env.navigator.clone(),
        }
    }

    /// `true` unless the navigator reports offline.
    pub fn is_online(&self) -> bool {
        self.bridge.report_observed();
        self.navigator
            .as_ref()
            .map_or(true, |navigator| navigator.is_online())
    }

    /// Negation of [`NetworkStatus::is_online`].
    pub fn is_offline(&self) -> bool {
        !self.is_online()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{native::memory::MemoryPlatform, reactive::LocalPoolScheduler};

    #[test]
    fn defaults_to_online_without_a_navigator() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let network = NetworkStatus::new(&runtime, &PlatformEnv::detached());
        assert!(network.is_online());
        assert!(!network.is_offline());
    }

    #[test]
    fn window_events_drive_one_rerun_each() {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let network = NetworkStatus::new(&runtime, &platform.env());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = network.clone();
        let reaction = runtime.autorun("network", move || {
            sink.borrow_mut().push(reader.is_online());
        });
        assert_eq!(platform.window.events().listener_count("online"), 1);
        assert_eq!(platform.window.events().listener_count("offline"), 1);

        platform.set_online(false);
        scheduler.run_until_stalled();
        platform.set_online(true);
        scheduler.run_until_stalled();
        assert_eq!(*seen.borrow(), vec![true, false, true]);

        drop(reaction);
        assert_eq!(platform.window.events().total_listener_count(), 0);
    }
}
