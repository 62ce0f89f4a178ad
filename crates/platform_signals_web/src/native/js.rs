//! `Reflect`-based property access and listener registration shared by the browser objects.

use js_sys::{Function, Reflect};
use platform_signals::{EventTarget, Listener, ListenerGuard};
use wasm_bindgen::{closure::Closure, convert::FromWasmAbi, JsCast, JsValue};

pub(crate) fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

pub(crate) fn get_f64(target: &JsValue, key: &str) -> Option<f64> {
    get(target, key).as_f64()
}

pub(crate) fn get_bool(target: &JsValue, key: &str) -> Option<bool> {
    get(target, key).as_bool()
}

pub(crate) fn get_string(target: &JsValue, key: &str) -> Option<String> {
    get(target, key).as_string()
}

/// Property value when it is a non-null object.
pub(crate) fn get_object(target: &JsValue, key: &str) -> Option<JsValue> {
    let value = get(target, key);
    value.is_object().then_some(value)
}

pub(crate) fn method(target: &JsValue, key: &str) -> Option<Function> {
    get(target, key).dyn_into::<Function>().ok()
}

/// `error.message`, the string itself, or its debug form.
pub(crate) fn error_message(error: &JsValue) -> String {
    get_string(error, "message")
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"))
}

/// Registers `handler` for `event` until the guard drops.
pub(crate) fn listen_with<E>(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) -> ListenerGuard
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    if let Err(err) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        tracing::debug!(event, error = ?err, "addEventListener failed");
        return ListenerGuard::noop();
    }
    let target = target.clone();
    let event = event.to_string();
    ListenerGuard::new(move || {
        if let Err(err) =
            target.remove_event_listener_with_callback(&event, closure.as_ref().unchecked_ref())
        {
            tracing::debug!(event = %event, error = ?err, "removeEventListener failed");
        }
    })
}

pub(crate) fn listen(target: &web_sys::EventTarget, event: &str, listener: Listener) -> ListenerGuard {
    listen_with(target, event, move |_: web_sys::Event| listener())
}

/// Untyped native object (battery manager, connection, permission status, orientation).
#[derive(Clone)]
pub(crate) struct JsHandle {
    pub(crate) value: JsValue,
}

impl JsHandle {
    pub(crate) fn new(value: JsValue) -> Self {
        Self { value }
    }

    pub(crate) fn f64_or(&self, key: &str, default: f64) -> f64 {
        get_f64(&self.value, key).unwrap_or(default)
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> bool {
        get_bool(&self.value, key).unwrap_or(default)
    }

    pub(crate) fn string(&self, key: &str) -> Option<String> {
        get_string(&self.value, key)
    }
}

impl EventTarget for JsHandle {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        listen(self.value.unchecked_ref::<web_sys::EventTarget>(), event, listener)
    }
}
