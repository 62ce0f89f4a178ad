//! Web Storage adapter.
//!
//! [`StorageData`] hands out one [`StorageScope`] per storage area. Every key read through a
//! scope gets its own bridge, so observers only rerun for the keys they read. Writes made
//! through the scope notify that key directly; writes made by other documents arrive as
//! `storage` events, which a single listener per [`StorageData`] fans out to the matching keys.

use std::{
    cell::{Cell, OnceCell, RefCell},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    rc::{Rc, Weak},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    bridge::ObservableBridge,
    config::StorageOptions,
    error::PlatformError,
    native::{ListenerGuard, PlatformEnv, StorageArea, StorageListener, WindowApi},
    reactive::Runtime,
    types::{StorageEvent, StorageKind},
};

type KeyId = (StorageKind, String);

/// Key bridges plus the shared `storage` listener.
struct StorageHub {
    window: Option<Rc<dyn WindowApi>>,
    keys: RefCell<HashMap<KeyId, ObservableBridge>>,
    observed_keys: Cell<usize>,
    listener: RefCell<Option<ListenerGuard>>,
}

impl StorageHub {
    fn retain(self: &Rc<Self>) {
        let count = self.observed_keys.get();
        self.observed_keys.set(count + 1);
        if count > 0 {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        let weak = Rc::downgrade(self);
        let listener: StorageListener = Rc::new(move |event: &StorageEvent| {
            if let Some(hub) = weak.upgrade() {
                hub.dispatch(event);
            }
        });
        tracing::trace!("attaching shared storage listener");
        *self.listener.borrow_mut() = Some(window.add_storage_listener(listener));
    }

    fn release(&self) {
        let count = self.observed_keys.get().saturating_sub(1);
        self.observed_keys.set(count);
        if count == 0 {
            let guard = self.listener.borrow_mut().take();
            if guard.is_some() {
                tracing::trace!("detaching shared storage listener");
            }
            drop(guard);
        }
    }

    fn dispatch(&self, event: &StorageEvent) {
        let Some(area) = event.area else {
            return;
        };
        let matching: Vec<ObservableBridge> = self
            .keys
            .borrow()
            .iter()
            .filter(|((kind, key), bridge)| {
                *kind == area
                    && bridge.is_observed()
                    && event.key.as_deref().map_or(true, |changed| changed == key)
            })
            .map(|(_, bridge)| bridge.clone())
            .collect();
        for bridge in matching {
            bridge.report_changed();
        }
    }
}

/// One storage area with prefixed keys.
#[derive(Clone)]
pub struct StorageScope {
    runtime: Runtime,
    hub: Rc<StorageHub>,
    kind: StorageKind,
    prefix: Rc<str>,
}

impl fmt::Debug for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageScope")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl StorageScope {
    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn area(&self) -> Option<Rc<dyn StorageArea>> {
        let window = self.hub.window.as_ref()?;
        match self.kind {
            StorageKind::Local => window.local_storage(),
            StorageKind::Session => window.session_storage(),
        }
    }

    fn bridge(&self, storage_key: &str) -> ObservableBridge {
        let id = (self.kind, storage_key.to_string());
        if let Some(bridge) = self.hub.keys.borrow().get(&id) {
            return bridge.clone();
        }
        let activate_hub = Rc::downgrade(&self.hub);
        let deactivate_hub: Weak<StorageHub> = Rc::downgrade(&self.hub);
        let bridge = ObservableBridge::new(
            &self.runtime,
            &format!("storage-data:{}:{storage_key}", self.kind.as_str()),
            move |_: &ObservableBridge| {
                if let Some(hub) = activate_hub.upgrade() {
                    hub.retain();
                }
            },
            move |_: &ObservableBridge| {
                if let Some(hub) = deactivate_hub.upgrade() {
                    hub.release();
                }
            },
            (),
        );
        self.hub.keys.borrow_mut().insert(id, bridge.clone());
        bridge
    }

    /// Area this scope writes to.
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Whether the storage area is reachable.
    pub fn is_supported(&self) -> bool {
        self.area().is_some()
    }

    /// Stored value of `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        let storage_key = self.storage_key(key);
        self.bridge(&storage_key).report_observed();
        self.area()?.get_item(&storage_key)
    }

    /// Stores `value` under `key`; `None` removes the entry.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Storage`] when the storage area rejects the write.
    pub fn set(&self, key: &str, value: Option<&str>) -> Result<(), PlatformError> {
        let storage_key = self.storage_key(key);
        let Some(area) = self.area() else {
            tracing::debug!(key = %storage_key, "storage unavailable; write skipped");
            return Ok(());
        };
        match value {
            Some(value) => area.set_item(&storage_key, value)?,
            None => area.remove_item(&storage_key)?,
        }
        self.bridge(&storage_key).report_changed();
        Ok(())
    }

    /// Stores the display form of `value` under `key`.
    ///
    /// # Errors
    ///
    /// See [`StorageScope::set`].
    pub fn set_display(&self, key: &str, value: &impl fmt::Display) -> Result<(), PlatformError> {
        self.set(key, Some(&value.to_string()))
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// See [`StorageScope::set`].
    pub fn delete(&self, key: &str) -> Result<(), PlatformError> {
        self.set(key, None)
    }

    /// Number of keys with a bridge in this scope.
    pub fn tracked_key_count(&self) -> usize {
        self.hub
            .keys
            .borrow()
            .keys()
            .filter(|(kind, _)| *kind == self.kind)
            .count()
    }
}

/// Reactive `localStorage` and `sessionStorage`.
#[derive(Clone)]
pub struct StorageData {
    runtime: Runtime,
    hub: Rc<StorageHub>,
    prefix: Rc<str>,
    local: Rc<OnceCell<StorageScope>>,
    session: Rc<OnceCell<StorageScope>>,
}

impl StorageData {
    /// Creates the adapter; scopes are built on first access.
    pub fn new(runtime: &Runtime, env: &PlatformEnv, options: &StorageOptions) -> Self {
        Self {
            runtime: runtime.clone(),
            hub: Rc::new(StorageHub {
                window: env.window.clone(),
                keys: RefCell::new(HashMap::new()),
                observed_keys: Cell::new(0),
                listener: RefCell::new(None),
            }),
            prefix: Rc::from(options.prefix.as_str()),
            local: Rc::new(OnceCell::new()),
            session: Rc::new(OnceCell::new()),
        }
    }

    /// `localStorage` scope.
    pub fn local(&self) -> StorageScope {
        self.scope(StorageKind::Local)
    }

    /// `sessionStorage` scope.
    pub fn session(&self) -> StorageScope {
        self.scope(StorageKind::Session)
    }

    /// Scope for `kind`.
    pub fn scope(&self, kind: StorageKind) -> StorageScope {
        let cell = match kind {
            StorageKind::Local => &self.local,
            StorageKind::Session => &self.session,
        };
        cell.get_or_init(|| StorageScope {
            runtime: self.runtime.clone(),
            hub: Rc::clone(&self.hub),
            kind,
            prefix: Rc::clone(&self.prefix),
        })
        .clone()
    }

    /// Typed `localStorage` key.
    pub fn key<T>(&self, name: &str, default: T) -> StorageKey<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        self.key_in(name, default, StorageKind::Local)
    }

    /// Typed key in the `kind` area.
    pub fn key_in<T>(&self, name: &str, default: T, kind: StorageKind) -> StorageKey<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        StorageKey {
            scope: self.scope(kind),
            name: name.to_string(),
            default,
            _value: PhantomData,
        }
    }

    /// Returns whether the shared `storage` listener is attached.
    pub fn is_listening(&self) -> bool {
        self.hub.listener.borrow().is_some()
    }
}

/// JSON-encoded value stored under one key.
///
/// Strings are stored as-is so they stay readable by code that uses the raw scope.
#[derive(Clone)]
pub struct StorageKey<T> {
    scope: StorageScope,
    name: String,
    default: T,
    _value: PhantomData<fn() -> T>,
}

impl<T> StorageKey<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Key name without the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value, or the default when absent or unreadable.
    ///
    /// The stored text is first taken as a plain string, mirroring [`StorageKey::set`], and only
    /// then parsed as JSON.
    pub fn get(&self) -> T {
        let Some(raw) = self.scope.get(&self.name) else {
            return self.default.clone();
        };
        serde_json::from_value(Value::String(raw.clone()))
            .or_else(|_| serde_json::from_str(&raw))
            .unwrap_or_else(|err| {
                tracing::debug!(key = %self.name, %err, "unreadable stored value; using default");
                self.default.clone()
            })
    }

    /// Stores `value`; a value serializing to `null` removes the entry.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Storage`] when `value` cannot be serialized or the write fails.
    pub fn set(&self, value: &T) -> Result<(), PlatformError> {
        let encoded =
            serde_json::to_value(value).map_err(|err| PlatformError::Storage(err.to_string()))?;
        match encoded {
            Value::Null => self.scope.delete(&self.name),
            Value::String(text) => self.scope.set(&self.name, Some(&text)),
            other => self.scope.set(&self.name, Some(&other.to_string())),
        }
    }

    /// Removes the entry.
    ///
    /// # Errors
    ///
    /// See [`StorageScope::set`].
    pub fn remove(&self) -> Result<(), PlatformError> {
        self.scope.delete(&self.name)
    }
}
