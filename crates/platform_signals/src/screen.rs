//! `screen` and `screen.orientation` adapters.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{EventTarget, PlatformEnv, ScreenApi, ScreenOrientationApi},
    reactive::Runtime,
    types::OrientationType,
};

/// Reactive `screen.orientation`.
#[derive(Clone)]
pub struct ScreenOrientationInfo {
    bridge: ObservableBridge<ListenerSet>,
    orientation: Option<Rc<dyn ScreenOrientationApi>>,
}

impl ScreenOrientationInfo {
    fn new(runtime: &Runtime, orientation: Option<Rc<dyn ScreenOrientationApi>>) -> Self {
        let target = orientation.clone();
        let bridge = ObservableBridge::listening(runtime, "screen-orientation", move |notify| {
            target
                .iter()
                .map(|orientation| orientation.add_listener("change", notify.clone()))
                .collect()
        });
        Self {
            bridge,
            orientation,
        }
    }

    /// Rotation in degrees.
    pub fn angle(&self) -> f64 {
        self.bridge.report_observed();
        self.orientation
            .as_ref()
            .map_or(0.0, |orientation| orientation.angle())
    }

    /// Orientation type; `portrait-primary` when unknown.
    pub fn orientation_type(&self) -> OrientationType {
        self.bridge.report_observed();
        self.orientation
            .as_ref()
            .map_or(OrientationType::PortraitPrimary, |orientation| {
                orientation.orientation_type()
            })
    }
}

/// Reactive `screen` metrics.
#[derive(Clone)]
pub struct ScreenInfo {
    bridge: ObservableBridge<ListenerSet>,
    screen: Option<Rc<dyn ScreenApi>>,
    orientation: ScreenOrientationInfo,
}

impl ScreenInfo {
    /// Creates the adapter; the orientation object is captured once.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let screen = env.screen.clone();
        let target = screen.clone();
        let bridge = ObservableBridge::listening(runtime, "screen", move |notify| {
            target
                .iter()
                .map(|screen| screen.add_listener("change", notify.clone()))
                .collect()
        });
        let orientation = ScreenOrientationInfo::new(
            runtime,
            screen.as_ref().and_then(|screen| screen.orientation()),
        );
        Self {
            bridge,
            screen,
            orientation,
        }
    }

    fn read(&self, read: impl FnOnce(&dyn ScreenApi) -> f64) -> f64 {
        self.bridge.report_observed();
        match &self.screen {
            Some(screen) => read(screen.as_ref()),
            None => 0.0,
        }
    }

    /// `width`
    pub fn width(&self) -> f64 {
        self.read(|screen| screen.width())
    }

    /// `height`
    pub fn height(&self) -> f64 {
        self.read(|screen| screen.height())
    }

    /// `availWidth`
    pub fn avail_width(&self) -> f64 {
        self.read(|screen| screen.avail_width())
    }

    /// `availHeight`
    pub fn avail_height(&self) -> f64 {
        self.read(|screen| screen.avail_height())
    }

    /// `colorDepth`
    pub fn color_depth(&self) -> f64 {
        self.read(|screen| screen.color_depth())
    }

    /// `pixelDepth`
    pub fn pixel_depth(&self) -> f64 {
        self.read(|screen| screen.pixel_depth())
    }

    /// Orientation adapter. Reading it also observes the screen itself.
    pub fn orientation(&self) -> ScreenOrientationInfo {
        self.bridge.report_observed();
        self.orientation.clone()
    }

    /// Whether `window.screen` exists.
    pub fn is_supported(&self) -> bool {
        self.screen.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{native::memory::MemoryPlatform, reactive::LocalPoolScheduler};

    #[test]
    fn detached_screen_is_zeroed_portrait() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let screen = ScreenInfo::new(&runtime, &PlatformEnv::detached());
        assert_eq!(screen.width(), 0.0);
        assert_eq!(screen.avail_height(), 0.0);
        assert_eq!(screen.color_depth(), 0.0);
        assert_eq!(screen.orientation().angle(), 0.0);
        assert_eq!(
            screen.orientation().orientation_type(),
            OrientationType::PortraitPrimary
        );
        assert!(!screen.is_supported());
    }

    #[test]
    fn screen_and_orientation_subscribe_independently() {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let screen = ScreenInfo::new(&runtime, &platform.env());
        let native_orientation = platform
            .screen
            .orientation_info()
            .expect("orientation")
            .clone();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = screen.orientation();
        let reaction = runtime.autorun("orientation", move || {
            let value = (reader.angle(), reader.orientation_type());
            sink.borrow_mut().push(value);
        });
        assert_eq!(native_orientation.events().listener_count("change"), 1);
        assert_eq!(platform.screen.events().listener_count("change"), 0);

        native_orientation.rotate(90.0, OrientationType::PortraitPrimary);
        scheduler.run_until_stalled();
        assert_eq!(
            *seen.borrow(),
            vec![
                (0.0, OrientationType::LandscapePrimary),
                (90.0, OrientationType::PortraitPrimary),
            ]
        );
        drop(reaction);
        assert_eq!(native_orientation.events().listener_count("change"), 0);

        let widths = Rc::new(RefCell::new(Vec::new()));
        let sink = widths.clone();
        let reader = screen.clone();
        let _reaction = runtime.autorun("screen", move || {
            let width = reader.width();
            sink.borrow_mut().push(width);
        });
        platform.screen.set_size(2560.0, 1440.0, 2560.0, 1400.0);
        scheduler.run_until_stalled();
        assert_eq!(*widths.borrow(), vec![1920.0, 2560.0]);
        assert_eq!(screen.avail_height(), 1400.0);
    }
}
