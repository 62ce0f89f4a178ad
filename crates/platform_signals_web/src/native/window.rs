use std::rc::Rc;

use platform_signals::{
    native::{MediaQueryList, StorageArea, StorageListener, WindowApi},
    EventTarget, Listener, ListenerGuard, PlatformError, StorageEvent, StorageKind,
};
use wasm_bindgen::JsValue;

use super::js;

/// `window`.
pub struct WebWindow {
    window: web_sys::Window,
}

impl WebWindow {
    /// Wraps the global window.
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }

    fn storage(&self, kind: StorageKind) -> Option<web_sys::Storage> {
        let storage = match kind {
            StorageKind::Local => self.window.local_storage(),
            StorageKind::Session => self.window.session_storage(),
        };
        storage.ok().flatten()
    }
}

fn dimension(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
}

/// Identifies the area of a `storage` event by comparing it with the window's own areas.
fn area_kind(window: &WebWindow, area: Option<web_sys::Storage>) -> Option<StorageKind> {
    let area = area?;
    [StorageKind::Local, StorageKind::Session]
        .into_iter()
        .find(|kind| window.storage(*kind).is_some_and(|candidate| candidate == area))
}

impl EventTarget for WebWindow {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.window, event, listener)
    }
}

impl WindowApi for WebWindow {
    fn inner_width(&self) -> f64 {
        dimension(self.window.inner_width())
    }

    fn inner_height(&self) -> f64 {
        dimension(self.window.inner_height())
    }

    fn outer_width(&self) -> f64 {
        dimension(self.window.outer_width())
    }

    fn outer_height(&self) -> f64 {
        dimension(self.window.outer_height())
    }

    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>> {
        match self.window.match_media(query) {
            Ok(list) => list.map(|list| Rc::new(WebMediaQueryList { list }) as Rc<dyn MediaQueryList>),
            Err(err) => {
                tracing::debug!(query, error = ?err, "matchMedia failed");
                None
            }
        }
    }

    fn local_storage(&self) -> Option<Rc<dyn StorageArea>> {
        self.storage(StorageKind::Local)
            .map(|storage| Rc::new(WebStorageArea { storage }) as Rc<dyn StorageArea>)
    }

    fn session_storage(&self) -> Option<Rc<dyn StorageArea>> {
        self.storage(StorageKind::Session)
            .map(|storage| Rc::new(WebStorageArea { storage }) as Rc<dyn StorageArea>)
    }

    fn add_storage_listener(&self, listener: StorageListener) -> ListenerGuard {
        let window = WebWindow::new(self.window.clone());
        js::listen_with(&self.window, "storage", move |event: web_sys::StorageEvent| {
            listener(&StorageEvent {
                key: event.key(),
                area: area_kind(&window, event.storage_area()),
                old_value: event.old_value(),
                new_value: event.new_value(),
            });
        })
    }
}

/// `MediaQueryList`.
pub struct WebMediaQueryList {
    list: web_sys::MediaQueryList,
}

impl EventTarget for WebMediaQueryList {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.list, event, listener)
    }
}

impl MediaQueryList for WebMediaQueryList {
    fn matches(&self) -> bool {
        self.list.matches()
    }

    fn media(&self) -> String {
        self.list.media()
    }
}

/// `Storage`.
pub struct WebStorageArea {
    storage: web_sys::Storage,
}

impl StorageArea for WebStorageArea {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| PlatformError::Storage(js::error_message(&err)))
    }

    fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
        self.storage
            .remove_item(key)
            .map_err(|err| PlatformError::Storage(js::error_message(&err)))
    }
}
