//! `prefers-color-scheme` adapter.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    native::{EventTarget, MediaQueryList, PlatformEnv},
    reactive::Runtime,
};

/// Media query matched for a dark preference.
pub const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";
/// Media query matched for a light preference.
pub const LIGHT_SCHEME_QUERY: &str = "(prefers-color-scheme: light)";

/// Preferred color scheme of the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorSchemeType {
    /// `dark`
    Dark,
    /// `light`
    Light,
    /// Neither query matches, or media queries are unavailable.
    #[default]
    NoPreference,
}

/// Reactive preferred color scheme.
#[derive(Clone)]
pub struct ColorScheme {
    bridge: ObservableBridge<ListenerSet>,
    dark: Option<Rc<dyn MediaQueryList>>,
    light: Option<Rc<dyn MediaQueryList>>,
}

impl ColorScheme {
    /// Resolves both media lists; nothing is subscribed until the first read.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        let resolve = |query: &str| {
            env.window
                .as_ref()
                .and_then(|window| window.match_media(query))
        };
        let dark = resolve(DARK_SCHEME_QUERY);
        let light = resolve(LIGHT_SCHEME_QUERY);
        let lists: Vec<Rc<dyn MediaQueryList>> =
            dark.iter().chain(light.iter()).cloned().collect();
        let bridge = ObservableBridge::listening(runtime, "color-scheme", move |notify| {
            lists
                .iter()
                .map(|list| list.add_listener("change", notify.clone()))
                .collect()
        });
        Self {
            bridge,
            dark,
            light,
        }
    }

    /// Current scheme; dark wins when both queries match.
    pub fn scheme(&self) -> ColorSchemeType {
        self.bridge.report_observed();
        let matches =
            |list: &Option<Rc<dyn MediaQueryList>>| list.as_ref().is_some_and(|l| l.matches());
        if matches(&self.dark) {
            ColorSchemeType::Dark
        } else if matches(&self.light) {
            ColorSchemeType::Light
        } else {
            ColorSchemeType::NoPreference
        }
    }

    /// `scheme() == Dark`
    pub fn is_dark(&self) -> bool {
        self.scheme() == ColorSchemeType::Dark
    }

    /// `scheme() == Light`
    pub fn is_light(&self) -> bool {
        self.scheme() == ColorSchemeType::Light
    }

    /// `scheme() == NoPreference`
    pub fn is_no_preference(&self) -> bool {
        self.scheme() == ColorSchemeType::NoPreference
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{native::memory::MemoryPlatform, reactive::LocalPoolScheduler};

    #[test]
    fn no_media_support_means_no_preference() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let scheme = ColorScheme::new(&runtime, &PlatformEnv::detached());
        assert_eq!(scheme.scheme(), ColorSchemeType::NoPreference);
        assert!(scheme.is_no_preference());
    }

    #[test]
    fn follows_both_media_lists() {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let scheme = ColorScheme::new(&runtime, &platform.env());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = scheme.clone();
        let reaction = runtime.autorun("scheme", move || {
            let scheme = reader.scheme();
            sink.borrow_mut().push(scheme);
        });
        let dark = platform.window.media_query(DARK_SCHEME_QUERY);
        let light = platform.window.media_query(LIGHT_SCHEME_QUERY);
        assert_eq!(dark.events().listener_count("change"), 1);
        assert_eq!(light.events().listener_count("change"), 1);

        platform.window.set_media_matches(LIGHT_SCHEME_QUERY, true);
        scheduler.run_until_stalled();
        platform.window.set_media_matches(DARK_SCHEME_QUERY, true);
        scheduler.run_until_stalled();
        assert_eq!(
            *seen.borrow(),
            vec![
                ColorSchemeType::NoPreference,
                ColorSchemeType::Light,
                ColorSchemeType::Dark,
            ]
        );
        assert!(scheme.is_dark());

        drop(reaction);
        assert_eq!(dark.events().listener_count("change"), 0);
        assert_eq!(light.events().listener_count("change"), 0);
    }
}
