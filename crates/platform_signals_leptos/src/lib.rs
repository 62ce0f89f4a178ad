//! Leptos integration for [`platform_signals`].
//!
//! Adapter properties live in the platform's own reactive [`Runtime`]. This crate mirrors them
//! into Leptos signals: a platform reaction reads the property (which subscribes to the native
//! source) and writes every new value into a [`ReadSignal`]. The reaction is disposed with the
//! Leptos owner that created the signal, which in turn detaches the native listeners.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use leptos::{
    create_signal, logging, on_cleanup, provide_context, use_context, Owner, ReadSignal,
    SignalSet, SignalWithUntracked,
};
use platform_signals::{Platform, PlatformConfig, Reaction, Runtime};

/// Mirrors `read` into a signal and returns the reaction that keeps it updated.
///
/// Dropping the reaction freezes the signal at its last value and releases the native
/// subscription.
pub fn bind_platform_signal<T>(
    runtime: &Runtime,
    read: impl Fn() -> T + 'static,
) -> (ReadSignal<T>, Reaction)
where
    T: Clone + PartialEq + 'static,
{
    let (value, set_value) = create_signal(runtime.untracked(&read));
    let reaction = runtime.autorun("leptos-signal", move || {
        let next = read();
        if value.with_untracked(|current| *current != next) {
            set_value.set(next);
        }
    });
    (value, reaction)
}

/// Like [`bind_platform_signal`], with the reaction disposed on cleanup of the current owner.
///
/// Outside an owner the reaction is dropped immediately and the signal keeps its first value.
pub fn create_platform_signal<T>(runtime: &Runtime, read: impl Fn() -> T + 'static) -> ReadSignal<T>
where
    T: Clone + PartialEq + 'static,
{
    let (value, reaction) = bind_platform_signal(runtime, read);
    if Owner::current().is_none() {
        logging::warn!(
            "create_platform_signal called outside a reactive owner; value will not update"
        );
    }
    on_cleanup(move || drop(reaction));
    value
}

/// Makes `platform` available to descendants through context.
pub fn provide_platform(platform: Platform) {
    provide_context(platform);
}

/// Builds the host's platform (see [`platform_signals_web::browser_platform`]) and provides it.
pub fn provide_browser_platform(config: PlatformConfig) -> Platform {
    let platform = platform_signals_web::browser_platform(config);
    provide_platform(platform.clone());
    platform
}

/// Platform provided by an ancestor, if any.
pub fn use_platform() -> Option<Platform> {
    let platform = use_context::<Platform>();
    if platform.is_none() {
        logging::warn!("use_platform called without a provided Platform");
    }
    platform
}

/// Signal of one platform property, e.g. `use_platform_signal(|p| p.network().is_online())`.
///
/// Returns `None` when no platform was provided.
pub fn use_platform_signal<T>(read: impl Fn(&Platform) -> T + 'static) -> Option<ReadSignal<T>>
where
    T: Clone + PartialEq + 'static,
{
    let platform = use_platform()?;
    let runtime = platform.runtime().clone();
    Some(create_platform_signal(&runtime, move || read(&platform)))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use leptos::SignalGetUntracked;
    use platform_signals::{
        ColorSchemeType, LocalPoolScheduler, MemoryPlatform, PlatformEnv, DARK_SCHEME_QUERY,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn memory_platform() -> (Rc<LocalPoolScheduler>, MemoryPlatform, Platform) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let native = MemoryPlatform::new();
        let platform = Platform::new(
            Runtime::new(scheduler.clone()),
            native.env(),
            PlatformConfig::default(),
        );
        (scheduler, native, platform)
    }

    #[test]
    fn signal_follows_native_events_until_reaction_drops() {
        let leptos_runtime = leptos::create_runtime();
        let (scheduler, native, platform) = memory_platform();
        let network = platform.network();
        let (online, reaction) =
            bind_platform_signal(platform.runtime(), move || network.is_online());
        assert!(online.get_untracked());
        assert_eq!(native.window.events().listener_count("offline"), 1);

        native.set_online(false);
        scheduler.run_until_stalled();
        assert!(!online.get_untracked());

        drop(reaction);
        assert_eq!(native.window.events().listener_count("offline"), 0);
        native.set_online(true);
        scheduler.run_until_stalled();
        assert!(!online.get_untracked());
        leptos_runtime.dispose();
    }

    #[test]
    fn derived_values_are_mirrored() {
        let leptos_runtime = leptos::create_runtime();
        let (scheduler, native, platform) = memory_platform();
        let scheme = platform.color_scheme();
        let (value, _reaction) = bind_platform_signal(platform.runtime(), move || scheme.scheme());
        assert_eq!(value.get_untracked(), ColorSchemeType::NoPreference);

        native.window.set_media_matches(DARK_SCHEME_QUERY, true);
        scheduler.run_until_stalled();
        assert_eq!(value.get_untracked(), ColorSchemeType::Dark);
        leptos_runtime.dispose();
    }

    #[test]
    fn detached_platform_yields_default_signal() {
        let leptos_runtime = leptos::create_runtime();
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let platform = Platform::new(runtime, PlatformEnv::detached(), PlatformConfig::default());
        let languages = platform.languages();
        let (current, _reaction) =
            bind_platform_signal(platform.runtime(), move || languages.current());
        assert_eq!(current.get_untracked(), "en");
        leptos_runtime.dispose();
    }
}
