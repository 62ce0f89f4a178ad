//! `navigator` and the objects reached through it.
//!
//! Battery, connection, permissions and geolocation are read through `Reflect` so missing or
//! vendor-specific APIs degrade to `None` instead of failing to bind.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use futures::FutureExt;
use js_sys::{Function, Promise};
use platform_signals::{
    native::{
        BatteryManager, GeolocationApi, NativeFuture, NavigatorApi, NetworkConnection,
        PermissionStatus, PermissionsApi, PositionCallback, PositionErrorCallback,
    },
    EffectiveConnectionType, EventTarget, GeoCoordinates, GeoPosition, GeolocationErrorCode,
    Listener, ListenerGuard, PermissionName, PermissionState, PlatformError, PositionOptions,
    WatchId, UNKNOWN_BATTERY_SECONDS,
};
use serde::Serialize;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::js::{self, JsHandle};

/// `navigator`.
pub struct WebNavigator {
    navigator: web_sys::Navigator,
}

impl WebNavigator {
    /// Wraps `window.navigator`.
    pub fn new(navigator: web_sys::Navigator) -> Self {
        Self { navigator }
    }

    fn object(&self, key: &str) -> Option<JsHandle> {
        js::get_object(&self.navigator, key).map(JsHandle::new)
    }
}

/// Awaits a promise-returning call, mapping every failure to a rejection of `api`.
async fn settle(api: &'static str, call: Result<JsValue, JsValue>) -> Result<JsValue, PlatformError> {
    let returned = call.map_err(|err| PlatformError::rejected(api, js::error_message(&err)))?;
    let promise = returned
        .dyn_into::<Promise>()
        .map_err(|_| PlatformError::rejected(api, "call did not return a promise"))?;
    JsFuture::from(promise)
        .await
        .map_err(|err| PlatformError::rejected(api, js::error_message(&err)))
}

impl NavigatorApi for WebNavigator {
    fn is_online(&self) -> bool {
        self.navigator.on_line()
    }

    fn language(&self) -> Option<String> {
        self.navigator.language()
    }

    fn languages(&self) -> Vec<String> {
        self.navigator
            .languages()
            .iter()
            .filter_map(|language| language.as_string())
            .collect()
    }

    fn supports_battery(&self) -> bool {
        js::method(&self.navigator, "getBattery").is_some()
    }

    fn battery(&self) -> Option<NativeFuture<Result<Rc<dyn BatteryManager>, PlatformError>>> {
        let get_battery = js::method(&self.navigator, "getBattery")?;
        let call = get_battery.call0(&self.navigator);
        Some(
            async move {
                let manager = settle("battery", call).await?;
                Ok(Rc::new(WebBatteryManager(JsHandle::new(manager))) as Rc<dyn BatteryManager>)
            }
            .boxed_local(),
        )
    }

    fn connection(&self) -> Option<Rc<dyn NetworkConnection>> {
        self.object("connection")
            .map(|handle| Rc::new(WebNetworkConnection(handle)) as Rc<dyn NetworkConnection>)
    }

    fn permissions(&self) -> Option<Rc<dyn PermissionsApi>> {
        self.object("permissions")
            .map(|handle| Rc::new(WebPermissions(handle)) as Rc<dyn PermissionsApi>)
    }

    fn geolocation(&self) -> Option<Rc<dyn GeolocationApi>> {
        self.object("geolocation").map(|handle| {
            Rc::new(WebGeolocation {
                handle,
                watches: RefCell::new(HashMap::new()),
            }) as Rc<dyn GeolocationApi>
        })
    }
}

/// `BatteryManager`.
pub struct WebBatteryManager(JsHandle);

impl EventTarget for WebBatteryManager {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        self.0.add_listener(event, listener)
    }
}

impl BatteryManager for WebBatteryManager {
    fn charging(&self) -> bool {
        self.0.bool_or("charging", true)
    }

    fn charging_time(&self) -> f64 {
        self.0.f64_or("chargingTime", UNKNOWN_BATTERY_SECONDS)
    }

    fn discharging_time(&self) -> f64 {
        self.0.f64_or("dischargingTime", UNKNOWN_BATTERY_SECONDS)
    }

    fn level(&self) -> f64 {
        self.0.f64_or("level", 1.0)
    }
}

/// `navigator.connection`.
pub struct WebNetworkConnection(JsHandle);

impl EventTarget for WebNetworkConnection {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        self.0.add_listener(event, listener)
    }
}

impl NetworkConnection for WebNetworkConnection {
    fn effective_type(&self) -> EffectiveConnectionType {
        self.0
            .string("effectiveType")
            .map_or(EffectiveConnectionType::Unknown, |token| {
                EffectiveConnectionType::from_token(&token)
            })
    }

    fn downlink(&self) -> f64 {
        self.0.f64_or("downlink", 0.0)
    }

    fn rtt(&self) -> f64 {
        self.0.f64_or("rtt", 0.0)
    }

    fn save_data(&self) -> bool {
        self.0.bool_or("saveData", false)
    }
}

#[derive(Serialize)]
struct PermissionDescriptor {
    name: &'static str,
}

/// `navigator.permissions`.
pub struct WebPermissions(JsHandle);

impl PermissionsApi for WebPermissions {
    fn query(&self, name: PermissionName) -> NativeFuture<Result<Rc<dyn PermissionStatus>, PlatformError>> {
        let permissions = self.0.value.clone();
        async move {
            let query = js::method(&permissions, "query")
                .ok_or(PlatformError::Unsupported { api: "permissions" })?;
            let descriptor = serde_wasm_bindgen::to_value(&PermissionDescriptor {
                name: name.as_str(),
            })
            .map_err(|err| PlatformError::rejected("permissions", err))?;
            let status = settle("permissions", query.call1(&permissions, &descriptor)).await?;
            Ok(Rc::new(WebPermissionStatus(JsHandle::new(status))) as Rc<dyn PermissionStatus>)
        }
        .boxed_local()
    }
}

/// `PermissionStatus`.
pub struct WebPermissionStatus(JsHandle);

impl EventTarget for WebPermissionStatus {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        self.0.add_listener(event, listener)
    }
}

impl PermissionStatus for WebPermissionStatus {
    fn state(&self) -> PermissionState {
        self.0
            .string("state")
            .map_or(PermissionState::Prompt, |token| PermissionState::from_token(&token))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NativePositionOptions {
    enable_high_accuracy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_age: Option<u32>,
}

fn native_options(options: &PositionOptions) -> JsValue {
    let native = NativePositionOptions {
        enable_high_accuracy: options.enable_high_accuracy,
        timeout: options.timeout_ms,
        maximum_age: options.maximum_age_ms,
    };
    serde_wasm_bindgen::to_value(&native).unwrap_or(JsValue::UNDEFINED)
}

fn read_position(position: &JsValue) -> GeoPosition {
    let coords = js::get(position, "coords");
    GeoPosition {
        coords: GeoCoordinates {
            accuracy: js::get_f64(&coords, "accuracy").unwrap_or(0.0),
            altitude: js::get_f64(&coords, "altitude"),
            altitude_accuracy: js::get_f64(&coords, "altitudeAccuracy"),
            heading: js::get_f64(&coords, "heading"),
            latitude: js::get_f64(&coords, "latitude").unwrap_or(0.0),
            longitude: js::get_f64(&coords, "longitude").unwrap_or(0.0),
            speed: js::get_f64(&coords, "speed"),
        },
        timestamp: js::get_f64(position, "timestamp").unwrap_or(0.0),
    }
}

fn read_error(error: &JsValue) -> PlatformError {
    let code = js::get_f64(error, "code").unwrap_or(0.0) as u16;
    PlatformError::Geolocation {
        code: GeolocationErrorCode::from_native(code),
        message: js::get_string(error, "message").unwrap_or_default(),
    }
}

type WatchClosures = (Closure<dyn FnMut(JsValue)>, Closure<dyn FnMut(JsValue)>);

/// `navigator.geolocation`.
///
/// Watch callbacks stay alive until `clear_watch`; one-shot callbacks are handed to JS.
pub struct WebGeolocation {
    handle: JsHandle,
    watches: RefCell<HashMap<i32, WatchClosures>>,
}

impl WebGeolocation {
    fn method(&self, name: &str) -> Option<Function> {
        js::method(&self.handle.value, name)
    }
}

impl GeolocationApi for WebGeolocation {
    fn get_current_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        let Some(get_current_position) = self.method("getCurrentPosition") else {
            on_error(PlatformError::Unsupported { api: "geolocation" });
            return;
        };
        let success = Closure::once_into_js(move |position: JsValue| {
            on_position(read_position(&position));
        });
        let failure = Closure::once_into_js(move |error: JsValue| on_error(read_error(&error)));
        if let Err(err) = get_current_position.call3(
            &self.handle.value,
            &success,
            &failure,
            &native_options(options),
        ) {
            tracing::warn!(error = ?err, "getCurrentPosition threw");
        }
    }

    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> WatchId {
        let Some(watch_position) = self.method("watchPosition") else {
            on_error(PlatformError::Unsupported { api: "geolocation" });
            return WatchId(-1);
        };
        let success = Closure::<dyn FnMut(JsValue)>::new(move |position: JsValue| {
            on_position(read_position(&position));
        });
        let failure =
            Closure::<dyn FnMut(JsValue)>::new(move |error: JsValue| on_error(read_error(&error)));
        let id = match watch_position.call3(
            &self.handle.value,
            success.as_ref(),
            failure.as_ref(),
            &native_options(options),
        ) {
            Ok(id) => id.as_f64().map_or(-1, |id| id as i32),
            Err(err) => {
                tracing::warn!(error = ?err, "watchPosition threw");
                -1
            }
        };
        self.watches.borrow_mut().insert(id, (success, failure));
        WatchId(id)
    }

    fn clear_watch(&self, id: WatchId) {
        if let Some(clear_watch) = self.method("clearWatch") {
            if let Err(err) = clear_watch.call1(&self.handle.value, &JsValue::from(id.0)) {
                tracing::debug!(watch = id.0, error = ?err, "clearWatch threw");
            }
        }
        self.watches.borrow_mut().remove(&id.0);
    }
}
