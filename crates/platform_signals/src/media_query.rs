//! Window/document sizes and memoized `matchMedia` trackers.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{DocumentApi, EventTarget, MediaQueryList, PlatformEnv, WindowApi},
    reactive::Runtime,
};

/// Width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Snapshot of the four size families exposed by window and root element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSizes {
    /// `innerWidth`/`innerHeight`
    pub inner: Size,
    /// `outerWidth`/`outerHeight`
    pub outer: Size,
    /// `documentElement.clientWidth/Height`
    pub client: Size,
    /// `documentElement.offsetWidth/Height`
    pub offset: Size,
}

/// Reactive match state of a single media query.
///
/// Obtained from [`MediaQuery::track`]; clones share one subscription.
#[derive(Clone)]
pub struct MatchMediaTracker {
    bridge: ObservableBridge<ListenerSet>,
    query: Rc<str>,
    list: Option<Rc<dyn MediaQueryList>>,
}

impl MatchMediaTracker {
    fn new(runtime: &Runtime, window: Option<&Rc<dyn WindowApi>>, query: &str) -> Self {
        let list = window.and_then(|window| window.match_media(query));
        let target = list.clone();
        let bridge = ObservableBridge::listening(
            runtime,
            &format!("match-media-tracker:{query}"),
            move |notify| {
                target
                    .iter()
                    .map(|list| list.add_listener("change", notify.clone()))
                    .collect()
            },
        );
        Self {
            bridge,
            query: Rc::from(query),
            list,
        }
    }

    /// Whether the query currently matches; `false` without `matchMedia`.
    pub fn matches(&self) -> bool {
        self.bridge.report_observed();
        self.list.as_ref().is_some_and(|list| list.matches())
    }

    /// Query string this tracker was created for.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Window sizes plus a registry of media-query trackers.
#[derive(Clone)]
pub struct MediaQuery {
    runtime: Runtime,
    window: Option<Rc<dyn WindowApi>>,
    document: Option<Rc<dyn DocumentApi>>,
    sizes: ObservableBridge<ListenerSet>,
    trackers: Rc<RefCell<HashMap<String, MatchMediaTracker>>>,
}

impl MediaQuery {
    /// Creates the adapter; trackers are created on demand.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let target = env.window.clone();
        let sizes = ObservableBridge::listening(runtime, "media-query-sizes", move |notify| {
            target
                .iter()
                .map(|window| window.add_listener("resize", notify.clone()))
                .collect()
        });
        Self {
            runtime: runtime.clone(),
            window: env.window.clone(),
            document: env.document.clone(),
            sizes,
            trackers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Current sizes, refreshed on window `resize`; zeros for absent globals.
    pub fn sizes(&self) -> WindowSizes {
        self.sizes.report_observed();
        let mut sizes = WindowSizes::default();
        if let Some(window) = &self.window {
            sizes.inner = Size {
                width: window.inner_width(),
                height: window.inner_height(),
            };
            sizes.outer = Size {
                width: window.outer_width(),
                height: window.outer_height(),
            };
        }
        if let Some(document) = &self.document {
            sizes.client = Size {
                width: document.client_width(),
                height: document.client_height(),
            };
            sizes.offset = Size {
                width: document.offset_width(),
                height: document.offset_height(),
            };
        }
        sizes
    }

    /// Returns the tracker for `query`, creating it once per query string.
    pub fn track(&self, query: &str) -> MatchMediaTracker {
        if let Some(tracker) = self.trackers.borrow().get(query) {
            return tracker.clone();
        }
        let tracker = MatchMediaTracker::new(&self.runtime, self.window.as_ref(), query);
        self.trackers
            .borrow_mut()
            .insert(query.to_string(), tracker.clone());
        tracker
    }

    /// Shorthand for `track(query).matches()`.
    pub fn matches(&self, query: &str) -> bool {
        self.track(query).matches()
    }

    /// Number of distinct queries tracked so far.
    pub fn tracked_query_count(&self) -> usize {
        self.trackers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{native::memory::MemoryPlatform, reactive::LocalPoolScheduler};

    fn setup() -> (Rc<LocalPoolScheduler>, Runtime, MemoryPlatform, MediaQuery) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let media = MediaQuery::new(&runtime, &platform.env());
        (scheduler, runtime, platform, media)
    }

    #[test]
    fn detached_sizes_are_zero() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let media = MediaQuery::new(&runtime, &PlatformEnv::detached());
        assert_eq!(media.sizes(), WindowSizes::default());
        assert!(!media.matches("(min-width: 1px)"));
    }

    #[test]
    fn sizes_follow_resize_events() {
        let (scheduler, runtime, platform, media) = setup();
        let widths = Rc::new(RefCell::new(Vec::new()));
        let sink = widths.clone();
        let reader = media.clone();
        let _reaction = runtime.autorun("sizes", move || {
            let sizes = reader.sizes();
            sink.borrow_mut().push(sizes.inner.width);
        });
        assert_eq!(platform.window.events().listener_count("resize"), 1);

        platform.window.set_inner_size(800.0, 600.0);
        scheduler.run_until_stalled();
        assert_eq!(*widths.borrow(), vec![1280.0, 800.0]);
        assert_eq!(
            media.sizes().client,
            Size {
                width: 1265.0,
                height: 720.0
            }
        );
    }

    #[test]
    fn trackers_are_memoized_per_query() {
        let (scheduler, runtime, platform, media) = setup();
        let first = media.track("(max-width: 600px)");
        let second = media.track("(max-width: 600px)");
        media.track("(orientation: portrait)");
        assert_eq!(media.tracked_query_count(), 2);

        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let _a = runtime.autorun("a", move || {
            first.matches();
            counter.set(counter.get() + 1);
        });
        let _b = runtime.autorun("b", move || {
            second.matches();
        });
        let list = platform.window.media_query("(max-width: 600px)");
        assert_eq!(list.events().listener_count("change"), 1);

        platform.window.set_media_matches("(max-width: 600px)", true);
        scheduler.run_until_stalled();
        assert_eq!(runs.get(), 2);
        assert!(media.matches("(max-width: 600px)"));
    }
}
