use std::rc::Rc;

use platform_signals::{
    native::{ScreenApi, ScreenOrientationApi, VisualViewportApi},
    EventTarget, Listener, ListenerGuard, OrientationType,
};
use wasm_bindgen::JsValue;

use super::js::{self, JsHandle};

/// `screen`.
pub struct WebScreen {
    screen: web_sys::Screen,
}

impl WebScreen {
    /// Wraps `window.screen`.
    pub fn new(screen: web_sys::Screen) -> Self {
        Self { screen }
    }
}

fn metric(value: Result<i32, JsValue>) -> f64 {
    value.map_or(0.0, f64::from)
}

impl EventTarget for WebScreen {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.screen, event, listener)
    }
}

impl ScreenApi for WebScreen {
    fn width(&self) -> f64 {
        metric(self.screen.width())
    }

    fn height(&self) -> f64 {
        metric(self.screen.height())
    }

    fn avail_width(&self) -> f64 {
        metric(self.screen.avail_width())
    }

    fn avail_height(&self) -> f64 {
        metric(self.screen.avail_height())
    }

    fn color_depth(&self) -> f64 {
        metric(self.screen.color_depth())
    }

    fn pixel_depth(&self) -> f64 {
        metric(self.screen.pixel_depth())
    }

    fn orientation(&self) -> Option<Rc<dyn ScreenOrientationApi>> {
        js::get_object(&self.screen, "orientation").map(|orientation| {
            Rc::new(WebScreenOrientation(JsHandle::new(orientation))) as Rc<dyn ScreenOrientationApi>
        })
    }
}

/// `screen.orientation`.
pub struct WebScreenOrientation(JsHandle);

impl EventTarget for WebScreenOrientation {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        self.0.add_listener(event, listener)
    }
}

impl ScreenOrientationApi for WebScreenOrientation {
    fn angle(&self) -> f64 {
        self.0.f64_or("angle", 0.0)
    }

    fn orientation_type(&self) -> OrientationType {
        self.0
            .string("type")
            .map_or(OrientationType::default(), |token| {
                OrientationType::from_token(&token)
            })
    }
}

/// `window.visualViewport`.
pub struct WebVisualViewport {
    viewport: web_sys::VisualViewport,
}

impl WebVisualViewport {
    /// Wraps `window.visualViewport`.
    pub fn new(viewport: web_sys::VisualViewport) -> Self {
        Self { viewport }
    }
}

impl EventTarget for WebVisualViewport {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        js::listen(&self.viewport, event, listener)
    }
}

impl VisualViewportApi for WebVisualViewport {
    fn width(&self) -> f64 {
        self.viewport.width()
    }

    fn height(&self) -> f64 {
        self.viewport.height()
    }

    fn offset_left(&self) -> f64 {
        self.viewport.offset_left()
    }

    fn offset_top(&self) -> f64 {
        self.viewport.offset_top()
    }

    fn page_left(&self) -> f64 {
        self.viewport.page_left()
    }

    fn page_top(&self) -> f64 {
        self.viewport.page_top()
    }

    fn scale(&self) -> f64 {
        self.viewport.scale()
    }
}
