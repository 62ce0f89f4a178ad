//! `web-sys` implementations of the native contracts.

mod document;
mod js;
mod navigator;
mod screen;
mod window;

use std::rc::Rc;

use platform_signals::{
    native::{DocumentApi, NavigatorApi, ScreenApi, VisualViewportApi, WindowApi},
    PlatformEnv,
};

pub use document::{WebDocument, WebScrollElement};
pub use navigator::{
    WebBatteryManager, WebGeolocation, WebNavigator, WebNetworkConnection, WebPermissionStatus,
    WebPermissions,
};
pub use screen::{WebScreen, WebScreenOrientation, WebVisualViewport};
pub use window::{WebMediaQueryList, WebStorageArea, WebWindow};

/// Handles to the current page's globals; detached when there is no `window`.
pub fn browser_env() -> PlatformEnv {
    let Some(window) = web_sys::window() else {
        tracing::debug!("no window global; using detached environment");
        return PlatformEnv::detached();
    };
    PlatformEnv {
        navigator: Some(Rc::new(WebNavigator::new(window.navigator())) as Rc<dyn NavigatorApi>),
        document: window
            .document()
            .map(|document| Rc::new(WebDocument::new(document)) as Rc<dyn DocumentApi>),
        screen: window
            .screen()
            .ok()
            .map(|screen| Rc::new(WebScreen::new(screen)) as Rc<dyn ScreenApi>),
        visual_viewport: window
            .visual_viewport()
            .map(|viewport| Rc::new(WebVisualViewport::new(viewport)) as Rc<dyn VisualViewportApi>),
        window: Some(Rc::new(WebWindow::new(window)) as Rc<dyn WindowApi>),
    }
}
