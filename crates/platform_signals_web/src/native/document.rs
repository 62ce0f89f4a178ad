use std::rc::Rc;

use platform_signals::{
    native::{DocumentApi, ScrollElement},
    EventTarget, Listener, ListenerGuard, VisibilityState,
};
use wasm_bindgen::JsCast;

use super::js;

/// `document`.
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    /// Wraps `window.document`.
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    fn root(&self) -> Option<web_sys::Element> {
        self.document.document_element()
    }

    fn root_html(&self) -> Option<web_sys::HtmlElement> {
        self.root()?.dyn_into::<web_sys::HtmlElement>().ok()
    }
}

impl EventTarget for WebDocument {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.document, event, listener)
    }
}

impl DocumentApi for WebDocument {
    fn visibility_state(&self) -> VisibilityState {
        match self.document.visibility_state() {
            web_sys::VisibilityState::Hidden => VisibilityState::Hidden,
            _ => VisibilityState::Visible,
        }
    }

    fn client_width(&self) -> f64 {
        self.root().map_or(0.0, |root| f64::from(root.client_width()))
    }

    fn client_height(&self) -> f64 {
        self.root().map_or(0.0, |root| f64::from(root.client_height()))
    }

    fn offset_width(&self) -> f64 {
        self.root_html().map_or(0.0, |root| f64::from(root.offset_width()))
    }

    fn offset_height(&self) -> f64 {
        self.root_html()
            .map_or(0.0, |root| f64::from(root.offset_height()))
    }

    fn scrolling_element(&self) -> Option<Rc<dyn ScrollElement>> {
        self.document
            .scrolling_element()
            .map(|element| Rc::new(WebScrollElement::new(element)) as Rc<dyn ScrollElement>)
    }
}

/// Scrollable element; also usable as a `scroll` event target.
#[derive(Clone)]
pub struct WebScrollElement {
    element: web_sys::Element,
}

impl WebScrollElement {
    /// Wraps any element.
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }
}

impl ScrollElement for WebScrollElement {
    fn scroll_top(&self) -> f64 {
        f64::from(self.element.scroll_top())
    }
}

impl EventTarget for WebScrollElement {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.element, event, listener)
    }
}
