//! Scroll offset of an element.

use std::{cell::Cell, rc::Rc};

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{EventTarget, Listener, PlatformEnv, ScrollElement, WindowTarget},
    reactive::Runtime,
};

/// Options for [`ScrollData::new`].
#[derive(Clone, Default)]
pub struct ScrollOptions {
    /// Object whose `scroll` events are followed; the window when `None`.
    pub scrolling_target: Option<Rc<dyn EventTarget>>,
}

/// Reactive `scrollTop` of one element.
///
/// The offset is cached: it is recorded at creation and refreshed by `scroll` events on the
/// scrolling target, and only a different value notifies observers.
#[derive(Clone)]
pub struct ScrollData {
    bridge: ObservableBridge<ListenerSet>,
    last_scroll_top: Rc<Cell<f64>>,
}

impl ScrollData {
    /// Follows `element`, listening on `options.scrolling_target` or the window of `env`.
    ///
    /// Without either target the offset stays at its initial value.
    pub fn new(
        runtime: &Runtime,
        env: &PlatformEnv,
        element: Rc<dyn ScrollElement>,
        options: ScrollOptions,
    ) -> Self {
        let target = options.scrolling_target.or_else(|| {
            env.window
                .clone()
                .map(|window| Rc::new(WindowTarget(window)) as Rc<dyn EventTarget>)
        });
        let last_scroll_top = Rc::new(Cell::new(element.scroll_top()));
        let last = last_scroll_top.clone();
        let bridge = ObservableBridge::listening(runtime, "scroll-data", move |notify| {
            let Some(target) = &target else {
                return Vec::new();
            };
            let element = element.clone();
            let last = last.clone();
            let notify = notify.clone();
            let handler: Listener = Rc::new(move || {
                let current = element.scroll_top();
                if last.get() != current {
                    last.set(current);
                    notify();
                }
            });
            vec![target.add_listener("scroll", handler)]
        });
        Self {
            bridge,
            last_scroll_top,
        }
    }

    /// Last recorded `scrollTop`.
    pub fn scroll_top(&self) -> f64 {
        self.bridge.report_observed();
        self.last_scroll_top.get()
    }

    /// Projects the scroll offset, e.g. into a "scrolled past header" flag.
    pub fn map<T>(&self, f: impl FnOnce(f64) -> T) -> T {
        f(self.scroll_top())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        native::memory::{MemoryPlatform, MemoryScrollElement},
        reactive::LocalPoolScheduler,
    };

    fn runtime() -> (Rc<LocalPoolScheduler>, Runtime) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        (scheduler, runtime)
    }

    #[test]
    fn window_scroll_updates_only_on_new_offset() {
        let (scheduler, runtime) = runtime();
        let platform = MemoryPlatform::new();
        let scroller = platform.document.scroller().expect("scroller").clone();
        scroller.set_scroll_top(40.0);
        let data = ScrollData::new(
            &runtime,
            &platform.env(),
            scroller.clone(),
            ScrollOptions::default(),
        );

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = data.clone();
        let reaction = runtime.autorun("scroll", move || {
            let header_hidden = reader.map(|top| top > 100.0);
            sink.borrow_mut().push((reader.scroll_top(), header_hidden));
        });
        assert_eq!(platform.window.events().listener_count("scroll"), 1);

        platform.scroll_to(40.0);
        scheduler.run_until_stalled();
        platform.scroll_to(250.0);
        scheduler.run_until_stalled();
        assert_eq!(*seen.borrow(), vec![(40.0, false), (250.0, true)]);

        drop(reaction);
        assert_eq!(platform.window.events().listener_count("scroll"), 0);
    }

    #[test]
    fn custom_target_replaces_window() {
        let (scheduler, runtime) = runtime();
        let platform = MemoryPlatform::new();
        let panel = Rc::new(MemoryScrollElement::default());
        let data = ScrollData::new(
            &runtime,
            &platform.env(),
            panel.clone(),
            ScrollOptions {
                scrolling_target: Some(panel.clone()),
            },
        );
        let reader = data.clone();
        let _reaction = runtime.autorun("panel", move || {
            reader.scroll_top();
        });
        assert_eq!(panel.events().listener_count("scroll"), 1);
        assert_eq!(platform.window.events().listener_count("scroll"), 0);

        panel.scroll_to(12.5);
        scheduler.run_until_stalled();
        assert_eq!(data.scroll_top(), 12.5);
    }

    #[test]
    fn offset_is_captured_at_creation_without_window() {
        let (_scheduler, runtime) = runtime();
        let element = Rc::new(MemoryScrollElement::default());
        element.set_scroll_top(7.0);
        let data = ScrollData::new(
            &runtime,
            &PlatformEnv::detached(),
            element.clone(),
            ScrollOptions::default(),
        );
        let reader = data.clone();
        let _reaction = runtime.autorun("detached", move || {
            reader.scroll_top();
        });
        element.set_scroll_top(90.0);
        assert_eq!(data.scroll_top(), 7.0);
    }
}
