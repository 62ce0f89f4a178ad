//! Visual Viewport API adapter.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    config::ViewportOptions,
    native::{EventTarget, PlatformEnv, VisualViewportApi, WindowApi},
    reactive::Runtime,
};

/// Reactive `window.visualViewport`.
///
/// Without a visual viewport, width and height fall back to the window's inner size, scale to
/// `1` and offsets to `0`.
#[derive(Clone)]
pub struct ViewportInfo {
    bridge: ObservableBridge<ListenerSet>,
    viewport: Option<Rc<dyn VisualViewportApi>>,
    window: Option<Rc<dyn WindowApi>>,
    keyboard_threshold_px: f64,
}

impl ViewportInfo {
    /// Creates the adapter without touching the viewport.
    pub fn new(runtime: &Runtime, env: &PlatformEnv, options: &ViewportOptions) -> Self {
        let target = env.visual_viewport.clone();
        let bridge = ObservableBridge::listening(runtime, "viewport-info", move |notify| {
            target
                .iter()
                .flat_map(|viewport| {
                    ["resize", "scroll"].map(|event| viewport.add_listener(event, notify.clone()))
                })
                .collect()
        });
        Self {
            bridge,
            viewport: env.visual_viewport.clone(),
            window: env.window.clone(),
            keyboard_threshold_px: options.keyboard_overlay_threshold_px,
        }
    }

    fn read(&self, fallback: f64, read: impl FnOnce(&dyn VisualViewportApi) -> f64) -> f64 {
        match &self.viewport {
            Some(viewport) => {
                self.bridge.report_observed();
                read(viewport.as_ref())
            }
            None => fallback,
        }
    }

    fn window_inner_height(&self) -> Option<f64> {
        self.window.as_ref().map(|window| window.inner_height())
    }

    /// Visual viewport width.
    pub fn width(&self) -> f64 {
        let fallback = self.window.as_ref().map_or(0.0, |window| window.inner_width());
        self.read(fallback, |viewport| viewport.width())
    }

    /// Visual viewport height.
    pub fn height(&self) -> f64 {
        let fallback = self.window_inner_height().unwrap_or(0.0);
        self.read(fallback, |viewport| viewport.height())
    }

    /// `offsetLeft`
    pub fn offset_left(&self) -> f64 {
        self.read(0.0, |viewport| viewport.offset_left())
    }

    /// `offsetTop`
    pub fn offset_top(&self) -> f64 {
        self.read(0.0, |viewport| viewport.offset_top())
    }

    /// `pageLeft`
    pub fn page_left(&self) -> f64 {
        self.read(0.0, |viewport| viewport.page_left())
    }

    /// `pageTop`
    pub fn page_top(&self) -> f64 {
        self.read(0.0, |viewport| viewport.page_top())
    }

    /// Pinch-zoom scale factor.
    pub fn scale(&self) -> f64 {
        self.read(1.0, |viewport| viewport.scale())
    }

    /// Whether `window.visualViewport` exists.
    pub fn is_supported(&self) -> bool {
        self.viewport.is_some()
    }

    /// Whether something (typically an on-screen keyboard) covers more than the configured
    /// threshold of the layout viewport.
    pub fn is_keyboard_like_overlay(&self) -> bool {
        let viewport_height = self.height();
        let layout_height = self.window_inner_height().unwrap_or(viewport_height);
        layout_height - viewport_height > self.keyboard_threshold_px
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::KEYBOARD_OVERLAY_THRESHOLD_PX, native::memory::MemoryPlatform,
        reactive::LocalPoolScheduler,
    };

    fn runtime() -> (Rc<LocalPoolScheduler>, Runtime) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        (scheduler, runtime)
    }

    #[test]
    fn falls_back_to_window_then_zero() {
        let (_scheduler, runtime) = runtime();
        let platform = MemoryPlatform::new();
        platform.window.set_inner_size(390.0, 844.0);
        let mut env = platform.env();
        env.visual_viewport = None;
        let viewport = ViewportInfo::new(&runtime, &env, &ViewportOptions::default());
        assert!(!viewport.is_supported());
        assert_eq!((viewport.width(), viewport.height()), (390.0, 844.0));
        assert_eq!(viewport.scale(), 1.0);
        assert_eq!(viewport.offset_top(), 0.0);
        assert!(!viewport.is_keyboard_like_overlay());

        let detached =
            ViewportInfo::new(&runtime, &PlatformEnv::detached(), &ViewportOptions::default());
        assert_eq!((detached.width(), detached.height()), (0.0, 0.0));
    }

    #[test]
    fn keyboard_overlay_uses_threshold() {
        let (scheduler, runtime) = runtime();
        let platform = MemoryPlatform::new();
        platform.window.set_inner_size(390.0, 844.0);
        platform.visual_viewport.set_size(390.0, 844.0);
        let viewport = ViewportInfo::new(&runtime, &platform.env(), &ViewportOptions::default());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = viewport.clone();
        let _reaction = runtime.autorun("keyboard", move || {
            let overlay = reader.is_keyboard_like_overlay();
            sink.borrow_mut().push(overlay);
        });
        assert_eq!(platform.visual_viewport.events().listener_count("resize"), 1);
        assert_eq!(platform.visual_viewport.events().listener_count("scroll"), 1);

        platform
            .visual_viewport
            .set_size(390.0, 844.0 - KEYBOARD_OVERLAY_THRESHOLD_PX);
        scheduler.run_until_stalled();
        platform.visual_viewport.set_size(390.0, 500.0);
        scheduler.run_until_stalled();
        assert_eq!(*seen.borrow(), vec![false, false, true]);

        let strict = ViewportInfo::new(
            &runtime,
            &platform.env(),
            &ViewportOptions {
                keyboard_overlay_threshold_px: 400.0,
            },
        );
        assert!(!strict.is_keyboard_like_overlay());
    }

    #[test]
    fn pan_and_zoom_are_reported() {
        let (scheduler, runtime) = runtime();
        let platform = MemoryPlatform::new();
        let viewport = ViewportInfo::new(&runtime, &platform.env(), &ViewportOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = viewport.clone();
        let _reaction = runtime.autorun("pan", move || {
            let sample = (reader.offset_top(), reader.page_top(), reader.scale());
            sink.borrow_mut().push(sample);
        });
        platform.visual_viewport.pan(0.0, 30.0, 0.0, 530.0);
        platform.visual_viewport.set_scale(2.0);
        scheduler.run_until_stalled();
        assert_eq!(*seen.borrow(), vec![(0.0, 0.0, 1.0), (30.0, 530.0, 2.0)]);
    }
}
