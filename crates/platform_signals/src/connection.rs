//! Network Information API adapter.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{EventTarget, NetworkConnection, PlatformEnv},
    reactive::Runtime,
    types::EffectiveConnectionType,
};

/// Reactive view of `navigator.connection`.
#[derive(Clone)]
pub struct ConnectionInfo {
    bridge: ObservableBridge<ListenerSet>,
    connection: Option<Rc<dyn NetworkConnection>>,
}

impl ConnectionInfo {
    /// Captures the connection object, if the navigator exposes one.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let connection = env
            .navigator
            .as_ref()
            .and_then(|navigator| navigator.connection());
        let target = connection.clone();
        let bridge = ObservableBridge::listening(runtime, "connection-info", move |notify| {
            target
                .iter()
                .map(|connection| connection.add_listener("change", notify.clone()))
                .collect()
        });
        Self { bridge, connection }
    }

    fn read<T>(&self, default: T, read: impl FnOnce(&dyn NetworkConnection) -> T) -> T {
        self.bridge.report_observed();
        match &self.connection {
            Some(connection) => read(connection.as_ref()),
            None => default,
        }
    }

    /// `effectiveType`; `unknown` when unsupported.
    pub fn effective_type(&self) -> EffectiveConnectionType {
        self.read(EffectiveConnectionType::Unknown, |c| c.effective_type())
    }

    /// Estimated bandwidth in Mbit/s.
    pub fn downlink(&self) -> f64 {
        self.read(0.0, |c| c.downlink())
    }

    /// Estimated round-trip time in milliseconds.
    pub fn rtt(&self) -> f64 {
        self.read(0.0, |c| c.rtt())
    }

    /// Whether the user asked for reduced data usage.
    pub fn save_data(&self) -> bool {
        self.read(false, |c| c.save_data())
    }

    /// Data saver on, or a `slow-2g`/`2g` connection.
    pub fn is_slow(&self) -> bool {
        self.save_data() || self.effective_type().is_slow()
    }

    /// Whether `navigator.connection` exists.
    pub fn is_supported(&self) -> bool {
        self.connection.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        native::memory::{MemoryNavigator, MemoryPlatform},
        reactive::LocalPoolScheduler,
    };

    #[test]
    fn unsupported_connection_reports_unknown_defaults() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let mut platform = MemoryPlatform::new();
        platform.navigator = Rc::new(MemoryNavigator::bare());
        let info = ConnectionInfo::new(&runtime, &platform.env());
        assert!(!info.is_supported());
        assert_eq!(info.effective_type(), EffectiveConnectionType::Unknown);
        assert_eq!(info.downlink(), 0.0);
        assert_eq!(info.rtt(), 0.0);
        assert!(!info.save_data());
        assert!(!info.is_slow());
    }

    #[test]
    fn change_events_update_derived_slowness() {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let connection = platform.navigator.connection_info().expect("connection");
        let info = ConnectionInfo::new(&runtime, &platform.env());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = info.clone();
        let _reaction = runtime.autorun("connection", move || {
            sink.borrow_mut().push((reader.effective_type(), reader.is_slow()));
        });
        assert_eq!(connection.events().listener_count("change"), 1);

        connection.set_effective_type(EffectiveConnectionType::TwoG);
        scheduler.run_until_stalled();
        connection.set_effective_type(EffectiveConnectionType::FourG);
        connection.set_save_data(true);
        scheduler.run_until_stalled();

        assert_eq!(
            *seen.borrow(),
            vec![
                (EffectiveConnectionType::FourG, false),
                (EffectiveConnectionType::TwoG, true),
                (EffectiveConnectionType::FourG, true),
            ]
        );
    }
}
