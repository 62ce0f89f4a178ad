//! Lazily-built bundle of every adapter for one environment.

use std::{cell::OnceCell, fmt, rc::Rc};

use crate::{
    battery::BatteryStatus,
    color_scheme::ColorScheme,
    config::PlatformConfig,
    connection::ConnectionInfo,
    geolocation::Geolocation,
    languages::PreferredLanguages,
    media_query::MediaQuery,
    native::{PlatformEnv, ScrollElement},
    network::NetworkStatus,
    page_visibility::PageVisibility,
    permissions::Permissions,
    reactive::Runtime,
    screen::ScreenInfo,
    scroll::{ScrollData, ScrollOptions},
    storage::StorageData,
    viewport::ViewportInfo,
};

struct PlatformInner {
    runtime: Runtime,
    env: PlatformEnv,
    config: PlatformConfig,
    battery: OnceCell<BatteryStatus>,
    network: OnceCell<NetworkStatus>,
    connection: OnceCell<ConnectionInfo>,
    color_scheme: OnceCell<ColorScheme>,
    media_query: OnceCell<MediaQuery>,
    page_visibility: OnceCell<PageVisibility>,
    permissions: OnceCell<Permissions>,
    geolocation: OnceCell<Geolocation>,
    languages: OnceCell<PreferredLanguages>,
    screen: OnceCell<ScreenInfo>,
    viewport: OnceCell<ViewportInfo>,
    storage: OnceCell<StorageData>,
}

/// Environment, runtime and config shared by every adapter, with one adapter instance each.
///
/// Adapters are created on first access. Creation may look up native handles such as
/// `navigator.connection` or `matchMedia` lists, but it never attaches listeners or starts
/// acquisitions; that waits for the first observer. Cloning yields another handle to the same
/// instances.
#[derive(Clone)]
pub struct Platform {
    inner: Rc<PlatformInner>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("env", &self.inner.env)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Platform {
    /// Bundles `env` with `runtime` and `config`.
    pub fn new(runtime: Runtime, env: PlatformEnv, config: PlatformConfig) -> Self {
        tracing::debug!(detached = env.is_detached(), "platform created");
        Self {
            inner: Rc::new(PlatformInner {
                runtime,
                env,
                config,
                battery: OnceCell::new(),
                network: OnceCell::new(),
                connection: OnceCell::new(),
                color_scheme: OnceCell::new(),
                media_query: OnceCell::new(),
                page_visibility: OnceCell::new(),
                permissions: OnceCell::new(),
                geolocation: OnceCell::new(),
                languages: OnceCell::new(),
                screen: OnceCell::new(),
                viewport: OnceCell::new(),
                storage: OnceCell::new(),
            }),
        }
    }

    /// Reactive graph the adapters report to.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Native handles.
    pub fn env(&self) -> &PlatformEnv {
        &self.inner.env
    }

    /// Adapter configuration.
    pub fn config(&self) -> &PlatformConfig {
        &self.inner.config
    }

    /// Battery Status API.
    pub fn battery(&self) -> BatteryStatus {
        let inner = &self.inner;
        inner
            .battery
            .get_or_init(|| BatteryStatus::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Online/offline state.
    pub fn network(&self) -> NetworkStatus {
        let inner = &self.inner;
        inner
            .network
            .get_or_init(|| NetworkStatus::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Network Information API.
    pub fn connection(&self) -> ConnectionInfo {
        let inner = &self.inner;
        inner
            .connection
            .get_or_init(|| ConnectionInfo::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// `prefers-color-scheme`.
    pub fn color_scheme(&self) -> ColorScheme {
        let inner = &self.inner;
        inner
            .color_scheme
            .get_or_init(|| ColorScheme::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Window sizes and `matchMedia` trackers.
    pub fn media_query(&self) -> MediaQuery {
        let inner = &self.inner;
        inner
            .media_query
            .get_or_init(|| MediaQuery::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Page Visibility API.
    pub fn page_visibility(&self) -> PageVisibility {
        let inner = &self.inner;
        inner
            .page_visibility
            .get_or_init(|| PageVisibility::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Permission registry.
    pub fn permissions(&self) -> Permissions {
        let inner = &self.inner;
        inner
            .permissions
            .get_or_init(|| Permissions::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Geolocation API; its permission entry comes from [`Platform::permissions`].
    pub fn geolocation(&self) -> Geolocation {
        if let Some(geolocation) = self.inner.geolocation.get() {
            return geolocation.clone();
        }
        let permissions = self.permissions();
        let inner = &self.inner;
        inner
            .geolocation
            .get_or_init(|| {
                Geolocation::new(
                    &inner.runtime,
                    &inner.env,
                    &permissions,
                    inner.config.geolocation.clone(),
                )
            })
            .clone()
    }

    /// Preferred languages.
    pub fn languages(&self) -> PreferredLanguages {
        let inner = &self.inner;
        inner
            .languages
            .get_or_init(|| {
                PreferredLanguages::new(&inner.runtime, &inner.env, &inner.config.languages)
            })
            .clone()
    }

    /// `screen` and `screen.orientation`.
    pub fn screen(&self) -> ScreenInfo {
        let inner = &self.inner;
        inner
            .screen
            .get_or_init(|| ScreenInfo::new(&inner.runtime, &inner.env))
            .clone()
    }

    /// Visual Viewport API.
    pub fn viewport(&self) -> ViewportInfo {
        let inner = &self.inner;
        inner
            .viewport
            .get_or_init(|| ViewportInfo::new(&inner.runtime, &inner.env, &inner.config.viewport))
            .clone()
    }

    /// Web Storage.
    pub fn storage(&self) -> StorageData {
        let inner = &self.inner;
        inner
            .storage
            .get_or_init(|| StorageData::new(&inner.runtime, &inner.env, &inner.config.storage))
            .clone()
    }

    /// New scroll tracker for `element`. Unlike the other adapters this is not memoized.
    pub fn scroll_data(&self, element: Rc<dyn ScrollElement>, options: ScrollOptions) -> ScrollData {
        ScrollData::new(&self.inner.runtime, &self.inner.env, element, options)
    }

    /// Scroll tracker for `document.scrollingElement`, or `None` without a document.
    pub fn document_scroll(&self) -> Option<ScrollData> {
        let element = self.inner.env.document.as_ref()?.scrolling_element()?;
        Some(self.scroll_data(element, ScrollOptions::default()))
    }
}
