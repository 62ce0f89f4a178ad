//! Battery Status API adapter.

use std::rc::Rc;

use crate::{
    acquire::{Acquisition, AsyncBridge, SubscriptionState},
    error::PlatformError,
    native::{BatteryManager, EventTarget, NavigatorApi, PlatformEnv},
    reactive::Runtime,
};

/// Events fired by `BatteryManager`.
pub const BATTERY_EVENTS: [&str; 4] = [
    "chargingchange",
    "chargingtimechange",
    "dischargingtimechange",
    "levelchange",
];

/// Level at or below which a discharging battery counts as low.
pub const LOW_BATTERY_LEVEL: f64 = 0.2;

/// `chargingTime`/`dischargingTime` when the manager cannot tell.
pub const UNKNOWN_BATTERY_SECONDS: f64 = f64::INFINITY;

/// Reactive view of `navigator.getBattery()`.
///
/// The manager is requested on first observation and released when the last observer leaves.
/// Until it arrives every getter returns the value of a full, charging battery.
#[derive(Clone)]
pub struct BatteryStatus {
    source: AsyncBridge<dyn BatteryManager>,
    navigator: Option<Rc<dyn NavigatorApi>>,
}

impl BatteryStatus {
    /// Creates the adapter without touching the navigator.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let navigator = env.navigator.clone();
        let request_navigator = navigator.clone();
        let source = AsyncBridge::<dyn BatteryManager>::new(
            runtime,
            "battery-status",
            "battery",
            move || request_navigator.as_ref()?.battery(),
            |manager, notify| {
                BATTERY_EVENTS
                    .iter()
                    .map(|event| manager.add_listener(event, Rc::clone(notify)))
                    .collect()
            },
        );
        Self { source, navigator }
    }

    /// Charge level in `0.0..=1.0`.
    pub fn level(&self) -> f64 {
        self.source.observe().map_or(1.0, |manager| manager.level())
    }

    /// Charge level as a rounded percentage.
    pub fn level_percent(&self) -> u8 {
        (self.level() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Whether the battery is charging.
    pub fn charging(&self) -> bool {
        self.source.observe().map_or(true, |manager| manager.charging())
    }

    /// Seconds until fully charged; `+∞` when unknown or discharging.
    pub fn charging_time(&self) -> f64 {
        self.source
            .observe()
            .map_or(UNKNOWN_BATTERY_SECONDS, |manager| manager.charging_time())
    }

    /// Seconds until empty; `+∞` when unknown or charging.
    pub fn discharging_time(&self) -> f64 {
        self.source
            .observe()
            .map_or(UNKNOWN_BATTERY_SECONDS, |manager| manager.discharging_time())
    }

    /// Discharging with a level at or below [`LOW_BATTERY_LEVEL`].
    pub fn is_low(&self) -> bool {
        !self.charging() && self.level() <= LOW_BATTERY_LEVEL
    }

    /// Whether `getBattery` exists.
    pub fn is_supported(&self) -> bool {
        self.navigator
            .as_ref()
            .is_some_and(|navigator| navigator.supports_battery())
    }

    /// Last `getBattery()` rejection.
    pub fn error(&self) -> Option<PlatformError> {
        self.source.error()
    }

    /// Clears the error and requests the manager again.
    pub fn retry(&self) -> Acquisition {
        self.source.retry()
    }

    /// Lifecycle of the manager subscription.
    pub fn subscription_state(&self) -> SubscriptionState {
        self.source.state()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        native::memory::{MemoryBatteryManager, MemoryPlatform},
        reactive::LocalPoolScheduler,
    };

    fn setup() -> (Rc<LocalPoolScheduler>, Runtime, MemoryPlatform, BatteryStatus) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let battery = BatteryStatus::new(&runtime, &platform.env());
        (scheduler, runtime, platform, battery)
    }

    fn manager(platform: &MemoryPlatform) -> Rc<MemoryBatteryManager> {
        platform.navigator.battery_manager().expect("battery manager")
    }

    #[test]
    fn unobserved_reads_return_full_battery_defaults() {
        let (_scheduler, _runtime, platform, battery) = setup();
        assert_eq!(battery.level(), 1.0);
        assert_eq!(battery.level_percent(), 100);
        assert!(battery.charging());
        assert_eq!(battery.charging_time(), UNKNOWN_BATTERY_SECONDS);
        assert!(battery.discharging_time().is_infinite());
        assert!(!battery.is_low());
        assert!(battery.is_supported());
        assert_eq!(platform.navigator.battery_calls(), 0);
    }

    #[test]
    fn observed_battery_tracks_native_events() {
        let (scheduler, runtime, platform, battery) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = battery.clone();
        let _reaction = runtime.autorun("battery", move || {
            sink.borrow_mut().push((reader.level_percent(), reader.is_low()));
        });
        scheduler.run_until_stalled();

        let manager = manager(&platform);
        for event in BATTERY_EVENTS {
            assert_eq!(manager.events().listener_count(event), 1);
        }

        manager.set_charging(false);
        manager.set_level(0.2);
        scheduler.run_until_stalled();
        assert_eq!(seen.borrow().last(), Some(&(20, true)));

        let runs = seen.borrow().len();
        manager.set_level(0.1);
        scheduler.run_until_stalled();
        assert_eq!(seen.borrow().len(), runs + 1);
        assert_eq!(seen.borrow().last(), Some(&(10, true)));
        assert_eq!(platform.navigator.battery_calls(), 1);
    }

    #[test]
    fn low_threshold_depends_on_charging() {
        let (scheduler, runtime, platform, battery) = setup();
        let reader = battery.clone();
        let _reaction = runtime.autorun("battery", move || {
            reader.level();
        });
        scheduler.run_until_stalled();
        let manager = manager(&platform);

        manager.set_level(0.2);
        manager.set_charging(true);
        assert!(!battery.is_low());
        manager.set_charging(false);
        assert!(battery.is_low());
        manager.set_level(0.53);
        assert_eq!(battery.level_percent(), 53);
        assert!(!battery.is_low());
    }

    #[test]
    fn rejection_is_exposed_and_retry_recovers() {
        let (scheduler, runtime, platform, battery) = setup();
        platform
            .navigator
            .fail_battery(PlatformError::rejected("battery", "SecurityError"));
        let reader = battery.clone();
        let _reaction = runtime.autorun("battery", move || {
            reader.level();
        });
        scheduler.run_until_stalled();
        assert_eq!(
            battery.error(),
            Some(PlatformError::rejected("battery", "SecurityError"))
        );
        assert_eq!(battery.subscription_state(), SubscriptionState::Unsubscribed);
        assert_eq!(battery.level(), 1.0);

        let recovered = Rc::new(MemoryBatteryManager::default());
        recovered.set_level(0.4);
        platform.navigator.set_battery(recovered.clone());
        let _ = battery.retry();
        scheduler.run_until_stalled();
        assert_eq!(battery.error(), None);
        assert_eq!(battery.level(), 0.4);
        assert_eq!(battery.subscription_state(), SubscriptionState::Subscribed);
        assert_eq!(recovered.events().listener_count("levelchange"), 1);
    }

    #[test]
    fn concurrent_retries_issue_a_single_request() {
        let (scheduler, _runtime, platform, battery) = setup();
        let acquisitions: Vec<Acquisition> = (0..3).map(|_| battery.retry()).collect();
        scheduler.run_until_stalled();
        futures::executor::block_on(futures::future::join_all(acquisitions));
        assert_eq!(platform.navigator.battery_calls(), 1);
    }

    #[test]
    fn absent_navigator_is_unsupported() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let battery = BatteryStatus::new(&runtime, &PlatformEnv::detached());
        let reader = battery.clone();
        let _reaction = runtime.autorun("battery", move || {
            reader.level();
        });
        assert!(!battery.is_supported());
        assert_eq!(battery.level(), 1.0);
        assert_eq!(battery.subscription_state(), SubscriptionState::Unsubscribed);
    }
}
