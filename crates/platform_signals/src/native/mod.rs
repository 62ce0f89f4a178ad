//! Object-safe contracts for the browser APIs the adapters read from.
//!
//! Every handle in [`PlatformEnv`] is optional; a missing handle is the "API absent" state and
//! adapters fall back to their defaults. Host crates implement these traits over real browser
//! objects, [`memory`] implements them in-process for tests and headless hosts.

pub mod memory;

use std::{fmt, rc::Rc};

use futures::future::LocalBoxFuture;

use crate::{
    config::PositionOptions,
    error::PlatformError,
    types::{
        EffectiveConnectionType, GeoPosition, OrientationType, PermissionName, PermissionState,
        StorageEvent, VisibilityState,
    },
};

/// Native event callback.
pub type Listener = Rc<dyn Fn()>;

/// Callback receiving cross-document storage events.
pub type StorageListener = Rc<dyn Fn(&StorageEvent)>;

/// Callback receiving a geolocation fix.
pub type PositionCallback = Rc<dyn Fn(GeoPosition)>;

/// Callback receiving a geolocation failure.
pub type PositionErrorCallback = Rc<dyn Fn(PlatformError)>;

/// Boxed local future returned by asynchronous native calls.
pub type NativeFuture<T> = LocalBoxFuture<'static, T>;

/// Registration handle; dropping it detaches the listener.
#[must_use = "dropping the guard detaches the listener immediately"]
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    /// Wraps the detach action of a registration.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard for a registration that never happened.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detaches now instead of on drop.
    pub fn detach(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Anything that dispatches named events.
pub trait EventTarget {
    /// Registers `listener` for `event` until the returned guard drops.
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard;
}

/// `window`.
pub trait WindowApi: EventTarget {
    /// `innerWidth`
    fn inner_width(&self) -> f64;
    /// `innerHeight`
    fn inner_height(&self) -> f64;
    /// `outerWidth`
    fn outer_width(&self) -> f64;
    /// `outerHeight`
    fn outer_height(&self) -> f64;
    /// `matchMedia(query)`; `None` when media queries are unavailable.
    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>>;
    /// `localStorage`; `None` when access is denied or unsupported.
    fn local_storage(&self) -> Option<Rc<dyn StorageArea>>;
    /// `sessionStorage`; `None` when access is denied or unsupported.
    fn session_storage(&self) -> Option<Rc<dyn StorageArea>>;
    /// Registers a typed `storage` event listener.
    fn add_storage_listener(&self, listener: StorageListener) -> ListenerGuard;
}

/// `navigator`.
pub trait NavigatorApi {
    /// `onLine`
    fn is_online(&self) -> bool;
    /// `language`
    fn language(&self) -> Option<String>;
    /// `languages`
    fn languages(&self) -> Vec<String>;
    /// Returns whether `getBattery` exists, without calling it.
    fn supports_battery(&self) -> bool;
    /// `getBattery()`; `None` when the method does not exist.
    fn battery(&self) -> Option<NativeFuture<Result<Rc<dyn BatteryManager>, PlatformError>>>;
    /// `connection`
    fn connection(&self) -> Option<Rc<dyn NetworkConnection>>;
    /// `permissions`
    fn permissions(&self) -> Option<Rc<dyn PermissionsApi>>;
    /// `geolocation`
    fn geolocation(&self) -> Option<Rc<dyn GeolocationApi>>;
}

/// `document`, including the layout metrics of `document.documentElement`.
pub trait DocumentApi: EventTarget {
    /// `visibilityState`
    fn visibility_state(&self) -> VisibilityState;
    /// `documentElement.clientWidth`
    fn client_width(&self) -> f64;
    /// `documentElement.clientHeight`
    fn client_height(&self) -> f64;
    /// `documentElement.offsetWidth`
    fn offset_width(&self) -> f64;
    /// `documentElement.offsetHeight`
    fn offset_height(&self) -> f64;
    /// `scrollingElement`
    fn scrolling_element(&self) -> Option<Rc<dyn ScrollElement>>;
}

/// `screen`.
pub trait ScreenApi: EventTarget {
    /// `width`
    fn width(&self) -> f64;
    /// `height`
    fn height(&self) -> f64;
    /// `availWidth`
    fn avail_width(&self) -> f64;
    /// `availHeight`
    fn avail_height(&self) -> f64;
    /// `colorDepth`
    fn color_depth(&self) -> f64;
    /// `pixelDepth`
    fn pixel_depth(&self) -> f64;
    /// `orientation`
    fn orientation(&self) -> Option<Rc<dyn ScreenOrientationApi>>;
}

/// `screen.orientation`.
pub trait ScreenOrientationApi: EventTarget {
    /// `angle`
    fn angle(&self) -> f64;
    /// `type`
    fn orientation_type(&self) -> OrientationType;
}

/// `window.visualViewport`.
pub trait VisualViewportApi: EventTarget {
    /// `width`
    fn width(&self) -> f64;
    /// `height`
    fn height(&self) -> f64;
    /// `offsetLeft`
    fn offset_left(&self) -> f64;
    /// `offsetTop`
    fn offset_top(&self) -> f64;
    /// `pageLeft`
    fn page_left(&self) -> f64;
    /// `pageTop`
    fn page_top(&self) -> f64;
    /// `scale`
    fn scale(&self) -> f64;
}

/// Result of `matchMedia`.
pub trait MediaQueryList: EventTarget {
    /// `matches`
    fn matches(&self) -> bool;
    /// `media`
    fn media(&self) -> String;
}

/// `Storage`.
pub trait StorageArea {
    /// `getItem`
    fn get_item(&self, key: &str) -> Option<String>;
    /// `setItem`
    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError>;
    /// `removeItem`
    fn remove_item(&self, key: &str) -> Result<(), PlatformError>;
}

/// `BatteryManager`.
pub trait BatteryManager: EventTarget {
    /// `charging`
    fn charging(&self) -> bool;
    /// `chargingTime` in seconds.
    fn charging_time(&self) -> f64;
    /// `dischargingTime` in seconds.
    fn discharging_time(&self) -> f64;
    /// `level` in `0.0..=1.0`.
    fn level(&self) -> f64;
}

/// `NetworkInformation`.
pub trait NetworkConnection: EventTarget {
    /// `effectiveType`
    fn effective_type(&self) -> EffectiveConnectionType;
    /// `downlink` in Mbit/s.
    fn downlink(&self) -> f64;
    /// `rtt` in milliseconds.
    fn rtt(&self) -> f64;
    /// `saveData`
    fn save_data(&self) -> bool;
}

/// `navigator.permissions`.
pub trait PermissionsApi {
    /// `query({ name })`
    fn query(&self, name: PermissionName)
        -> NativeFuture<Result<Rc<dyn PermissionStatus>, PlatformError>>;
}

/// `PermissionStatus`.
pub trait PermissionStatus: EventTarget {
    /// `state`
    fn state(&self) -> PermissionState;
}

/// Identifier returned by `watchPosition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub i32);

/// `navigator.geolocation`.
pub trait GeolocationApi {
    /// `getCurrentPosition`
    fn get_current_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    );
    /// `watchPosition`
    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> WatchId;
    /// `clearWatch`
    fn clear_watch(&self, id: WatchId);
}

/// Element exposing a vertical scroll offset.
pub trait ScrollElement {
    /// `scrollTop`
    fn scroll_top(&self) -> f64;
}

/// [`EventTarget`] view of a window handle.
#[derive(Clone)]
pub struct WindowTarget(pub Rc<dyn WindowApi>);

impl EventTarget for WindowTarget {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        self.0.add_listener(event, listener)
    }
}

/// Optional handles to the native globals.
#[derive(Clone, Default)]
pub struct PlatformEnv {
    /// `window`
    pub window: Option<Rc<dyn WindowApi>>,
    /// `navigator`
    pub navigator: Option<Rc<dyn NavigatorApi>>,
    /// `document`
    pub document: Option<Rc<dyn DocumentApi>>,
    /// `screen`
    pub screen: Option<Rc<dyn ScreenApi>>,
    /// `window.visualViewport`
    pub visual_viewport: Option<Rc<dyn VisualViewportApi>>,
}

impl PlatformEnv {
    /// Environment with no native globals, as seen during server-side rendering.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns whether no native global is available at all.
    pub fn is_detached(&self) -> bool {
        self.window.is_none()
            && self.navigator.is_none()
            && self.document.is_none()
            && self.screen.is_none()
            && self.visual_viewport.is_none()
    }
}

impl fmt::Debug for PlatformEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformEnv")
            .field("window", &self.window.is_some())
            .field("navigator", &self.navigator.is_some())
            .field("document", &self.document.is_some())
            .field("screen", &self.screen.is_some())
            .field("visual_viewport", &self.visual_viewport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn guard_detaches_once_on_drop_or_explicit_detach() {
        let detached = Rc::new(Cell::new(0));
        let counter = detached.clone();
        let guard = ListenerGuard::new(move || counter.set(counter.get() + 1));
        drop(guard);
        assert_eq!(detached.get(), 1);

        let counter = detached.clone();
        ListenerGuard::new(move || counter.set(counter.get() + 1)).detach();
        assert_eq!(detached.get(), 2);

        drop(ListenerGuard::noop());
        assert_eq!(detached.get(), 2);
    }

    #[test]
    fn detached_env_has_no_globals() {
        let env = PlatformEnv::detached();
        assert!(env.is_detached());
        assert_eq!(
            format!("{env:?}"),
            "PlatformEnv { window: false, navigator: false, document: false, screen: false, visual_viewport: false }"
        );
    }
}
