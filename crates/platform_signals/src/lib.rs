//! Browser platform state as lazily-subscribed reactive properties.
//!
//! Every adapter wraps one native API behind getters that register a read with the reactive
//! [`Runtime`]. The first observer attaches the native listeners (or starts the async
//! acquisition); the last observer leaving detaches them again. Without the native API every
//! getter returns a documented default, which keeps server-side rendering safe.
//!
//! Native objects are reached through the traits in [`native`]; browser implementations live in
//! `platform_signals_web` and in-memory ones in [`native::memory`].

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod acquire;
pub mod battery;
pub mod bridge;
pub mod color_scheme;
pub mod config;
pub mod connection;
pub mod error;
pub mod geolocation;
pub mod languages;
pub mod media_query;
pub mod native;
pub mod network;
pub mod page_visibility;
pub mod permissions;
pub mod platform;
pub mod reactive;
pub mod screen;
pub mod scroll;
pub mod storage;
pub mod types;
pub mod viewport;

pub use acquire::{Acquisition, SubscriptionState};
pub use battery::{
    BatteryStatus, BATTERY_EVENTS, LOW_BATTERY_LEVEL, UNKNOWN_BATTERY_SECONDS,
};
pub use bridge::{ListenerSet, ObservableBridge, WeakBridge};
pub use color_scheme::{ColorScheme, ColorSchemeType, DARK_SCHEME_QUERY, LIGHT_SCHEME_QUERY};
pub use config::{
    LanguageOptions, PlatformConfig, PositionOptions, StorageOptions, ViewportOptions,
    KEYBOARD_OVERLAY_THRESHOLD_PX,
};
pub use connection::ConnectionInfo;
pub use error::{GeolocationErrorCode, PlatformError};
pub use geolocation::Geolocation;
pub use languages::{parse_accept_language, PreferredLanguages};
pub use media_query::{MatchMediaTracker, MediaQuery, Size, WindowSizes};
pub use native::{
    memory::MemoryPlatform, EventTarget, Listener, ListenerGuard, PlatformEnv, WatchId,
    WindowTarget,
};
pub use network::NetworkStatus;
pub use page_visibility::PageVisibility;
pub use permissions::{PermissionInfo, Permissions};
pub use platform::Platform;
pub use reactive::{Atom, LocalPoolScheduler, Reaction, Runtime, Scheduler, MAX_FLUSH_ROUNDS};
pub use screen::{ScreenInfo, ScreenOrientationInfo};
pub use scroll::{ScrollData, ScrollOptions};
pub use storage::{StorageData, StorageKey, StorageScope};
pub use types::{
    EffectiveConnectionType, GeoCoordinates, GeoPosition, OrientationType, PermissionName,
    PermissionState, StorageEvent, StorageKind, VisibilityState,
};
pub use viewport::ViewportInfo;
