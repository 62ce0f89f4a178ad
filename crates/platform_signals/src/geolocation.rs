//! Geolocation API adapter.

use std::rc::Rc;

use crate::{
    acquire::SubscriptionState,
    bridge::{ObservableBridge, WeakBridge},
    config::PositionOptions,
    error::PlatformError,
    native::{GeolocationApi, PlatformEnv, PositionCallback, PositionErrorCallback, WatchId},
    permissions::{PermissionInfo, Permissions},
    reactive::Runtime,
    types::{GeoPosition, PermissionName},
};

#[derive(Default)]
struct GeolocationMeta {
    position: GeoPosition,
    error: Option<PlatformError>,
    watch: Option<WatchId>,
    fixes: u64,
}

/// Reactive device position.
///
/// The first observer issues `getCurrentPosition` followed by `watchPosition`; the watch is
/// cleared once nothing observes the position any more. Fixes are cached, so the last known
/// position stays readable after unsubscribing.
#[derive(Clone)]
pub struct Geolocation {
    bridge: ObservableBridge<GeolocationMeta>,
    api: Option<Rc<dyn GeolocationApi>>,
    permission: PermissionInfo,
}

impl Geolocation {
    /// Creates the adapter; `permissions` supplies the `geolocation` permission entry.
    pub fn new(
        runtime: &Runtime,
        env: &PlatformEnv,
        permissions: &Permissions,
        options: PositionOptions,
    ) -> Self {
        let api = env
            .navigator
            .as_ref()
            .and_then(|navigator| navigator.geolocation());
        let activate_api = api.clone();
        let deactivate_api = api.clone();
        let bridge = ObservableBridge::new(
            runtime,
            "geolocation",
            move |bridge: &ObservableBridge<GeolocationMeta>| {
                if let Some(api) = &activate_api {
                    start(bridge, api.as_ref(), &options);
                }
            },
            move |bridge: &ObservableBridge<GeolocationMeta>| {
                let watch = bridge.meta_mut().watch.take();
                if let (Some(api), Some(id)) = (&deactivate_api, watch) {
                    tracing::trace!(watch = id.0, "clearing geolocation watch");
                    api.clear_watch(id);
                }
            },
            GeolocationMeta::default(),
        );
        Self {
            bridge,
            api,
            permission: permissions.get(PermissionName::Geolocation),
        }
    }

    /// Last known position; zeroed coordinates and timestamp before the first fix.
    pub fn position(&self) -> GeoPosition {
        self.bridge.report_observed();
        self.bridge.meta().position
    }

    /// Last error callback payload; cleared by the next fix.
    pub fn error(&self) -> Option<PlatformError> {
        self.bridge.report_observed();
        self.bridge.meta().error.clone()
    }

    /// Whether `navigator.geolocation` exists.
    pub fn is_supported(&self) -> bool {
        self.api.is_some()
    }

    /// The `geolocation` permission entry.
    pub fn permission(&self) -> PermissionInfo {
        self.permission.clone()
    }

    /// `Subscribing` while the watch waits for its first fix or error.
    pub fn subscription_state(&self) -> SubscriptionState {
        self.bridge.report_observed();
        let meta = self.bridge.meta();
        match meta.watch {
            None => SubscriptionState::Unsubscribed,
            Some(_) if meta.fixes == 0 && meta.error.is_none() => SubscriptionState::Subscribing,
            Some(_) => SubscriptionState::Subscribed,
        }
    }
}

fn start(
    bridge: &ObservableBridge<GeolocationMeta>,
    api: &dyn GeolocationApi,
    options: &PositionOptions,
) {
    let weak = bridge.downgrade();
    api.get_current_position(on_position(&weak), on_error(&weak), options);
    let id = api.watch_position(on_position(&weak), on_error(&weak), options);
    tracing::trace!(watch = id.0, "geolocation watch started");
    bridge.meta_mut().watch = Some(id);
}

fn on_position(weak: &WeakBridge<GeolocationMeta>) -> PositionCallback {
    let weak = weak.clone();
    Rc::new(move |position: GeoPosition| {
        let Some(bridge) = weak.upgrade() else {
            return;
        };
        {
            let mut meta = bridge.meta_mut();
            meta.position = position;
            meta.error = None;
            meta.fixes += 1;
        }
        bridge.report_changed();
    })
}

fn on_error(weak: &WeakBridge<GeolocationMeta>) -> PositionErrorCallback {
    let weak = weak.clone();
    Rc::new(move |error: PlatformError| {
        let Some(bridge) = weak.upgrade() else {
            return;
        };
        tracing::warn!(%error, "geolocation request failed");
        bridge.meta_mut().error = Some(error);
        bridge.report_changed();
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        error::GeolocationErrorCode,
        native::memory::{MemoryGeolocation, MemoryPlatform},
        reactive::LocalPoolScheduler,
        types::{GeoCoordinates, PermissionState},
    };

    fn setup(
        options: PositionOptions,
    ) -> (
        Rc<LocalPoolScheduler>,
        Runtime,
        MemoryPlatform,
        Rc<MemoryGeolocation>,
        Geolocation,
    ) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let service = platform
            .navigator
            .geolocation_service()
            .expect("geolocation");
        let env = platform.env();
        let permissions = Permissions::new(&runtime, &env);
        let geolocation = Geolocation::new(&runtime, &env, &permissions, options);
        (scheduler, runtime, platform, service, geolocation)
    }

    fn fix(latitude: f64, longitude: f64, timestamp: f64) -> GeoPosition {
        GeoPosition {
            coords: GeoCoordinates {
                accuracy: 5.0,
                latitude,
                longitude,
                ..GeoCoordinates::default()
            },
            timestamp,
        }
    }

    #[test]
    fn defaults_before_first_fix() {
        let (_scheduler, _runtime, _platform, service, geolocation) =
            setup(PositionOptions::default());
        assert_eq!(geolocation.position(), GeoPosition::default());
        assert_eq!(geolocation.error(), None);
        assert!(geolocation.is_supported());
        assert_eq!(service.current_request_count(), 0);
        assert_eq!(service.active_watch_count(), 0);
    }

    #[test]
    fn observing_starts_one_request_and_one_watch() {
        let options = PositionOptions {
            enable_high_accuracy: true,
            timeout_ms: Some(10_000),
            maximum_age_ms: None,
        };
        let (scheduler, runtime, _platform, service, geolocation) = setup(options.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = geolocation.clone();
        let reaction = runtime.autorun("position", move || {
            let position = reader.position();
            sink.borrow_mut().push(position.coords.latitude);
        });
        assert_eq!(service.current_request_count(), 1);
        assert_eq!(service.active_watch_count(), 1);
        assert_eq!(service.last_options(), Some(options));
        assert_eq!(
            runtime.untracked(|| geolocation.subscription_state()),
            SubscriptionState::Subscribing
        );

        service.push_position(fix(48.85, 2.35, 1_700_000_000_000.0));
        scheduler.run_until_stalled();
        assert_eq!(*seen.borrow(), vec![0.0, 48.85]);
        assert_eq!(
            runtime.untracked(|| geolocation.subscription_state()),
            SubscriptionState::Subscribed
        );

        drop(reaction);
        assert_eq!(service.active_watch_count(), 0);
        assert_eq!(geolocation.position().timestamp, 1_700_000_000_000.0);
    }

    #[test]
    fn errors_are_stored_and_cleared_by_next_fix() {
        let (scheduler, runtime, _platform, service, geolocation) =
            setup(PositionOptions::default());
        let reader = geolocation.clone();
        let _reaction = runtime.autorun("position", move || {
            reader.position();
        });
        let denied = PlatformError::Geolocation {
            code: GeolocationErrorCode::PermissionDenied,
            message: "User denied Geolocation".to_string(),
        };
        service.push_error(denied.clone());
        scheduler.run_until_stalled();
        assert_eq!(geolocation.error(), Some(denied));

        service.push_position(fix(1.0, 2.0, 3.0));
        assert_eq!(geolocation.error(), None);
    }

    #[test]
    fn permission_entry_is_shared_with_registry() {
        let (scheduler, runtime, platform, _service, geolocation) =
            setup(PositionOptions::default());
        let registry = platform
            .navigator
            .permission_registry()
            .expect("permissions");
        registry.set_state(PermissionName::Geolocation, PermissionState::Granted);
        let permission = geolocation.permission();
        let reader = permission.clone();
        let _reaction = runtime.autorun("permission", move || {
            reader.state();
        });
        scheduler.run_until_stalled();
        assert!(geolocation.permission().is_granted());
        assert_eq!(permission.name(), PermissionName::Geolocation);
    }

    #[test]
    fn unsupported_without_navigator() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let env = PlatformEnv::detached();
        let permissions = Permissions::new(&runtime, &env);
        let geolocation = Geolocation::new(&runtime, &env, &permissions, PositionOptions::default());
        let reader = geolocation.clone();
        let _reaction = runtime.autorun("position", move || {
            reader.position();
        });
        assert!(!geolocation.is_supported());
        assert_eq!(geolocation.position(), GeoPosition::default());
        assert_eq!(
            runtime.untracked(|| geolocation.subscription_state()),
            SubscriptionState::Unsubscribed
        );
    }
}
