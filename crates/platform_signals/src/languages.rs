//! Preferred languages from an `Accept-Language` header or the navigator.

use std::rc::Rc;

use crate::{
    bridge::{ListenerSet, ObservableBridge},
    config::LanguageOptions,
    native::{EventTarget, NavigatorApi, PlatformEnv},
    reactive::Runtime,
};

/// Splits an `Accept-Language` header into language tags, dropping weights, blanks and `*`.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && *lang != "*")
        .map(str::to_string)
        .collect()
}

/// Reactive `navigator.language`/`navigator.languages`.
///
/// During server-side rendering there is no navigator; hosts pass the request's
/// `Accept-Language` header instead, which takes precedence whenever it yields a language.
#[derive(Clone)]
pub struct PreferredLanguages {
    bridge: ObservableBridge<ListenerSet>,
    header: ObservableBridge<Option<String>>,
    navigator: Option<Rc<dyn NavigatorApi>>,
    fallback: Rc<str>,
}

impl PreferredLanguages {
    /// Creates the adapter without touching the window.
    pub fn new(runtime: &Runtime, env: &PlatformEnv, options: &LanguageOptions) -> Self {
        let window = env.window.clone();
        let bridge = ObservableBridge::listening(runtime, "languages", move |notify| {
            window
                .iter()
                .map(|window| window.add_listener("languagechange", notify.clone()))
                .collect()
        });
        Self {
            bridge,
            header: ObservableBridge::passive(runtime, "accept-language-header", None),
            navigator: env.navigator.clone(),
            fallback: Rc::from(options.fallback_language.as_str()),
        }
    }

    /// Sets (or clears) the `Accept-Language` header used in place of the navigator.
    pub fn set_accept_language_header(&self, header: Option<String>) {
        if *self.header.meta() == header {
            return;
        }
        *self.header.meta_mut() = header;
        self.header.report_changed();
    }

    /// Header set through [`PreferredLanguages::set_accept_language_header`].
    pub fn accept_language_header(&self) -> Option<String> {
        self.header.report_observed();
        self.header.meta().clone()
    }

    fn header_languages(&self) -> Option<Vec<String>> {
        let header = self.accept_language_header()?;
        let languages = parse_accept_language(&header);
        (!languages.is_empty()).then_some(languages)
    }

    /// Most preferred language.
    pub fn current(&self) -> String {
        self.bridge.report_observed();
        if let Some(first) = self
            .header_languages()
            .and_then(|languages| languages.into_iter().next())
        {
            return first;
        }
        self.navigator
            .as_ref()
            .and_then(|navigator| navigator.language())
            .unwrap_or_else(|| self.fallback.to_string())
    }

    /// Every preferred language, most preferred first.
    pub fn all(&self) -> Vec<String> {
        self.bridge.report_observed();
        if let Some(languages) = self.header_languages() {
            return languages;
        }
        match &self.navigator {
            Some(navigator) => navigator.languages(),
            None => vec![self.fallback.to_string()],
        }
    }
}
