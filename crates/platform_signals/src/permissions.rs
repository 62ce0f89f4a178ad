//! Permissions API adapter.
//!
//! One [`PermissionInfo`] per permission name, created on first request and kept for the
//! lifetime of the registry. Each entry queries its status object on first observation and
//! follows its `change` events afterwards.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    acquire::{Acquisition, AsyncBridge, SubscriptionState},
    error::PlatformError,
    native::{EventTarget, PermissionStatus, PermissionsApi, PlatformEnv},
    reactive::Runtime,
    types::{PermissionName, PermissionState},
};

/// Reactive state of one permission.
#[derive(Clone)]
pub struct PermissionInfo {
    name: PermissionName,
    source: AsyncBridge<dyn PermissionStatus>,
    supported: bool,
}

impl PermissionInfo {
    fn new(runtime: &Runtime, api: Option<Rc<dyn PermissionsApi>>, name: PermissionName) -> Self {
        let supported = api.is_some();
        let source = AsyncBridge::<dyn PermissionStatus>::new(
            runtime,
            &format!("permission:{name}"),
            "permissions",
            move || api.as_ref().map(|api| api.query(name)),
            |status, notify| vec![status.add_listener("change", Rc::clone(notify))],
        );
        Self {
            name,
            source,
            supported,
        }
    }

    /// Permission this entry tracks.
    pub fn name(&self) -> PermissionName {
        self.name
    }

    /// Current decision; `prompt` until the status object arrives.
    pub fn state(&self) -> PermissionState {
        self.source
            .observe()
            .map_or(PermissionState::Prompt, |status| status.state())
    }

    /// `state() == Granted`
    pub fn is_granted(&self) -> bool {
        self.state() == PermissionState::Granted
    }

    /// `state() == Denied`
    pub fn is_denied(&self) -> bool {
        self.state() == PermissionState::Denied
    }

    /// `state() == Prompt`
    pub fn is_prompt(&self) -> bool {
        self.state() == PermissionState::Prompt
    }

    /// Whether `navigator.permissions` exists.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Last query rejection, e.g. for names the user agent does not know.
    pub fn error(&self) -> Option<PlatformError> {
        self.source.error()
    }

    /// Clears the error and queries again.
    pub fn retry(&self) -> Acquisition {
        self.source.retry()
    }

    /// Lifecycle of the status subscription.
    pub fn subscription_state(&self) -> SubscriptionState {
        self.source.state()
    }
}

/// Registry of [`PermissionInfo`] entries keyed by name.
#[derive(Clone)]
pub struct Permissions {
    runtime: Runtime,
    api: Option<Rc<dyn PermissionsApi>>,
    entries: Rc<RefCell<HashMap<PermissionName, PermissionInfo>>>,
}

impl Permissions {
    /// Creates an empty registry.
    pub fn new(runtime: &Runtime, env: &PlatformEnv) -> Self {
        Self {
            runtime: runtime.clone(),
            api: env
                .navigator
                .as_ref()
                .and_then(|navigator| navigator.permissions()),
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Entry for `name`, created at most once.
    pub fn get(&self, name: PermissionName) -> PermissionInfo {
        if let Some(entry) = self.entries.borrow().get(&name) {
            return entry.clone();
        }
        let entry = PermissionInfo::new(&self.runtime, self.api.clone(), name);
        self.entries.borrow_mut().insert(name, entry.clone());
        entry
    }

    /// Whether `navigator.permissions` exists.
    pub fn is_supported(&self) -> bool {
        self.api.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        native::memory::{MemoryPermissions, MemoryPlatform},
        reactive::LocalPoolScheduler,
    };

    fn setup() -> (
        Rc<LocalPoolScheduler>,
        Runtime,
        Rc<MemoryPermissions>,
        Permissions,
    ) {
        let scheduler = Rc::new(LocalPoolScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        let platform = MemoryPlatform::new();
        let registry = platform
            .navigator
            .permission_registry()
            .expect("permissions");
        let permissions = Permissions::new(&runtime, &platform.env());
        (scheduler, runtime, registry, permissions)
    }

    #[test]
    fn entries_are_created_once_per_name() {
        let (_scheduler, _runtime, registry, permissions) = setup();
        let camera = permissions.get(PermissionName::Camera);
        assert_eq!(camera.state(), PermissionState::Prompt);
        assert_eq!(permissions.get(PermissionName::Camera).name(), PermissionName::Camera);
        assert_eq!(registry.query_calls(), 0);
    }

    #[test]
    fn status_changes_propagate_after_query() {
        let (scheduler, runtime, registry, permissions) = setup();
        registry.set_state(PermissionName::Notifications, PermissionState::Granted);
        let entry = permissions.get(PermissionName::Notifications);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = entry.clone();
        let reaction = runtime.autorun("notifications", move || {
            let state = reader.state();
            sink.borrow_mut().push(state);
        });
        scheduler.run_until_stalled();
        let status = registry.status(PermissionName::Notifications);
        assert_eq!(status.events().listener_count("change"), 1);

        registry.set_state(PermissionName::Notifications, PermissionState::Denied);
        scheduler.run_until_stalled();
        assert_eq!(seen.borrow().last(), Some(&PermissionState::Denied));
        assert!(entry.is_denied());

        drop(reaction);
        assert_eq!(status.events().listener_count("change"), 0);
        assert_eq!(entry.subscription_state(), SubscriptionState::Unsubscribed);
    }

    #[test]
    fn rejected_query_is_reported_and_retryable() {
        let (scheduler, runtime, registry, permissions) = setup();
        registry.fail(
            PermissionName::Midi,
            PlatformError::rejected("permissions", "TypeError: unknown name"),
        );
        let entry = permissions.get(PermissionName::Midi);
        let reader = entry.clone();
        let _reaction = runtime.autorun("midi", move || {
            reader.state();
        });
        scheduler.run_until_stalled();
        assert!(entry.error().is_some());
        assert!(entry.is_prompt());

        registry.clear_failure(PermissionName::Midi);
        registry.set_state(PermissionName::Midi, PermissionState::Granted);
        let pending = [entry.retry(), entry.retry()];
        scheduler.run_until_stalled();
        futures::executor::block_on(futures::future::join_all(pending));
        assert_eq!(registry.query_calls(), 2);
        assert_eq!(entry.error(), None);
        assert!(entry.is_granted());
    }

    #[test]
    fn missing_api_keeps_prompt() {
        let runtime = Runtime::new(Rc::new(LocalPoolScheduler::new()));
        let permissions = Permissions::new(&runtime, &PlatformEnv::detached());
        let entry = permissions.get(PermissionName::Geolocation);
        let reader = entry.clone();
        let _reaction = runtime.autorun("geo", move || {
            reader.state();
        });
        assert!(!permissions.is_supported());
        assert!(!entry.is_supported());
        assert!(entry.is_prompt());
    }
}
