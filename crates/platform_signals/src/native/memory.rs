//! In-process implementations of the native contracts.
//!
//! Each type keeps its state in cells so tests and headless hosts can mutate it through a
//! shared `Rc` while adapters hold the same object as a trait handle. Setters dispatch the
//! event the browser would fire for the same change.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    rc::{Rc, Weak},
};

use futures::{future, FutureExt};

use super::{
    BatteryManager, DocumentApi, EventTarget, GeolocationApi, Listener, ListenerGuard,
    MediaQueryList, NativeFuture, NavigatorApi, NetworkConnection, PermissionStatus,
    PermissionsApi, PlatformEnv, PositionCallback, PositionErrorCallback, ScreenApi,
    ScreenOrientationApi, ScrollElement, StorageArea, StorageListener, VisualViewportApi,
    WatchId, WindowApi,
};
use crate::{
    config::PositionOptions,
    error::PlatformError,
    types::{
        EffectiveConnectionType, GeoPosition, OrientationType, PermissionName, PermissionState,
        StorageEvent, VisibilityState,
    },
};

type ListenerTable = RefCell<Vec<(u64, String, Listener)>>;

/// Listener registry shared by every memory type.
#[derive(Default)]
pub struct MemoryEventTarget {
    listeners: Rc<ListenerTable>,
    next_id: Cell<u64>,
}

impl MemoryEventTarget {
    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .count()
    }

    /// Number of listeners registered for any event.
    pub fn total_listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Invokes every listener registered for `event`.
    pub fn dispatch(&self, event: &str) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

impl EventTarget for MemoryEventTarget {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners
            .borrow_mut()
            .push((id, event.to_string(), listener));
        let table: Weak<ListenerTable> = Rc::downgrade(&self.listeners);
        ListenerGuard::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().retain(|(entry, _, _)| *entry != id);
            }
        })
    }
}

macro_rules! delegate_event_target {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl EventTarget for $ty {
                fn add_listener(&self, event: &str, listener: Listener) -> ListenerGuard {
                    self.events.add_listener(event, listener)
                }
            }

            impl $ty {
                /// Listener registry of this object.
                pub fn events(&self) -> &MemoryEventTarget {
                    &self.events
                }
            }
        )+
    };
}

delegate_event_target!(
    MemoryWindow,
    MemoryDocument,
    MemoryScreen,
    MemoryScreenOrientation,
    MemoryVisualViewport,
    MemoryMediaQueryList,
    MemoryBatteryManager,
    MemoryNetworkConnection,
    MemoryPermissionStatus,
    MemoryScrollElement,
);

fn size_cell(width: f64, height: f64) -> Cell<(f64, f64)> {
    Cell::new((width, height))
}

/// `window` with media-query lists, storage areas and typed storage listeners.
pub struct MemoryWindow {
    events: MemoryEventTarget,
    inner_size: Cell<(f64, f64)>,
    outer_size: Cell<(f64, f64)>,
    media: RefCell<HashMap<String, Rc<MemoryMediaQueryList>>>,
    match_media_supported: Cell<bool>,
    local: Option<Rc<MemoryStorageArea>>,
    session: Option<Rc<MemoryStorageArea>>,
    storage_listeners: Rc<RefCell<Vec<(u64, StorageListener)>>>,
    next_storage_listener: Cell<u64>,
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::with_storage(
            Some(Rc::new(MemoryStorageArea::default())),
            Some(Rc::new(MemoryStorageArea::default())),
        )
    }
}

impl MemoryWindow {
    /// Window with the given storage areas (`None` models blocked storage).
    pub fn with_storage(
        local: Option<Rc<MemoryStorageArea>>,
        session: Option<Rc<MemoryStorageArea>>,
    ) -> Self {
        Self {
            events: MemoryEventTarget::default(),
            inner_size: size_cell(1280.0, 720.0),
            outer_size: size_cell(1280.0, 800.0),
            media: RefCell::new(HashMap::new()),
            match_media_supported: Cell::new(true),
            local,
            session,
            storage_listeners: Rc::new(RefCell::new(Vec::new())),
            next_storage_listener: Cell::new(0),
        }
    }

    /// Resizes the layout viewport and fires `resize`.
    pub fn set_inner_size(&self, width: f64, height: f64) {
        self.inner_size.set((width, height));
        self.events.dispatch("resize");
    }

    /// Resizes the browser window and fires `resize`.
    pub fn set_outer_size(&self, width: f64, height: f64) {
        self.outer_size.set((width, height));
        self.events.dispatch("resize");
    }

    /// Returns (creating on first use) the list for `query`.
    pub fn media_query(&self, query: &str) -> Rc<MemoryMediaQueryList> {
        Rc::clone(
            self.media
                .borrow_mut()
                .entry(query.to_string())
                .or_insert_with(|| Rc::new(MemoryMediaQueryList::new(query))),
        )
    }

    /// Updates whether `query` matches, firing `change` on its list.
    pub fn set_media_matches(&self, query: &str, matches: bool) {
        self.media_query(query).set_matches(matches);
    }

    /// Toggles `matchMedia` availability.
    pub fn set_match_media_supported(&self, supported: bool) {
        self.match_media_supported.set(supported);
    }

    /// `localStorage` backing area.
    pub fn local(&self) -> Option<&Rc<MemoryStorageArea>> {
        self.local.as_ref()
    }

    /// `sessionStorage` backing area.
    pub fn session(&self) -> Option<&Rc<MemoryStorageArea>> {
        self.session.as_ref()
    }

    /// Number of registered `storage` listeners.
    pub fn storage_listener_count(&self) -> usize {
        self.storage_listeners.borrow().len()
    }

    /// Delivers a `storage` event as if another document wrote to storage.
    pub fn dispatch_storage(&self, event: &StorageEvent) {
        let snapshot: Vec<StorageListener> = self
            .storage_listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl WindowApi for MemoryWindow {
    fn inner_width(&self) -> f64 {
        self.inner_size.get().0
    }

    fn inner_height(&self) -> f64 {
        self.inner_size.get().1
    }

    fn outer_width(&self) -> f64 {
        self.outer_size.get().0
    }

    fn outer_height(&self) -> f64 {
        self.outer_size.get().1
    }

    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>> {
        if !self.match_media_supported.get() {
            return None;
        }
        Some(self.media_query(query) as Rc<dyn MediaQueryList>)
    }

    fn local_storage(&self) -> Option<Rc<dyn StorageArea>> {
        self.local
            .as_ref()
            .map(|area| Rc::clone(area) as Rc<dyn StorageArea>)
    }

    fn session_storage(&self) -> Option<Rc<dyn StorageArea>> {
        self.session
            .as_ref()
            .map(|area| Rc::clone(area) as Rc<dyn StorageArea>)
    }

    fn add_storage_listener(&self, listener: StorageListener) -> ListenerGuard {
        let id = self.next_storage_listener.get();
        self.next_storage_listener.set(id + 1);
        self.storage_listeners.borrow_mut().push((id, listener));
        let table = Rc::downgrade(&self.storage_listeners);
        ListenerGuard::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }
}

/// `MediaQueryList` whose match state is set by hand.
pub struct MemoryMediaQueryList {
    events: MemoryEventTarget,
    media: String,
    matches: Cell<bool>,
}

impl MemoryMediaQueryList {
    /// Non-matching list for `media`.
    pub fn new(media: &str) -> Self {
        Self {
            events: MemoryEventTarget::default(),
            media: media.to_string(),
            matches: Cell::new(false),
        }
    }

    /// Updates the match state; fires `change` only when it flips.
    pub fn set_matches(&self, matches: bool) {
        if self.matches.replace(matches) != matches {
            self.events.dispatch("change");
        }
    }
}

impl MediaQueryList for MemoryMediaQueryList {
    fn matches(&self) -> bool {
        self.matches.get()
    }

    fn media(&self) -> String {
        self.media.clone()
    }
}

/// `Storage` over a sorted map.
#[derive(Default)]
pub struct MemoryStorageArea {
    items: RefCell<BTreeMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStorageArea {
    /// Raw stored value.
    pub fn item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    /// Writes a value without going through the adapter, as another document would.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Removes every entry without notification.
    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Makes subsequent writes fail like an exceeded quota.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writable(&self) -> Result<(), PlatformError> {
        if self.fail_writes.get() {
            return Err(PlatformError::Storage("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl StorageArea for MemoryStorageArea {
    fn get_item(&self, key: &str) -> Option<String> {
        self.item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.check_writable()?;
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
        self.check_writable()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// `navigator` with switchable sub-APIs.
pub struct MemoryNavigator {
    online: Cell<bool>,
    language: RefCell<Option<String>>,
    languages: RefCell<Vec<String>>,
    battery: RefCell<Option<Result<Rc<MemoryBatteryManager>, PlatformError>>>,
    battery_calls: Cell<usize>,
    connection: RefCell<Option<Rc<MemoryNetworkConnection>>>,
    permissions: RefCell<Option<Rc<MemoryPermissions>>>,
    geolocation: RefCell<Option<Rc<MemoryGeolocation>>>,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self {
            online: Cell::new(true),
            language: RefCell::new(Some("en-US".to_string())),
            languages: RefCell::new(vec!["en-US".to_string(), "en".to_string()]),
            battery: RefCell::new(Some(Ok(Rc::new(MemoryBatteryManager::default())))),
            battery_calls: Cell::new(0),
            connection: RefCell::new(Some(Rc::new(MemoryNetworkConnection::default()))),
            permissions: RefCell::new(Some(Rc::new(MemoryPermissions::default()))),
            geolocation: RefCell::new(Some(Rc::new(MemoryGeolocation::default()))),
        }
    }
}

impl MemoryNavigator {
    /// Navigator exposing none of the optional sub-APIs.
    pub fn bare() -> Self {
        Self {
            battery: RefCell::new(None),
            connection: RefCell::new(None),
            permissions: RefCell::new(None),
            geolocation: RefCell::new(None),
            ..Self::default()
        }
    }

    /// Sets `onLine` without firing window events.
    pub fn set_online_flag(&self, online: bool) {
        self.online.set(online);
    }

    /// Replaces `language` and `languages`; the first entry becomes `language`.
    pub fn set_language_list(&self, languages: Vec<String>) {
        *self.language.borrow_mut() = languages.first().cloned();
        *self.languages.borrow_mut() = languages;
    }

    /// Battery manager handed out by `getBattery()`, if one is configured.
    pub fn battery_manager(&self) -> Option<Rc<MemoryBatteryManager>> {
        match &*self.battery.borrow() {
            Some(Ok(manager)) => Some(Rc::clone(manager)),
            _ => None,
        }
    }

    /// Makes `getBattery()` resolve with `manager`.
    pub fn set_battery(&self, manager: Rc<MemoryBatteryManager>) {
        *self.battery.borrow_mut() = Some(Ok(manager));
    }

    /// Makes `getBattery()` reject with `error`.
    pub fn fail_battery(&self, error: PlatformError) {
        *self.battery.borrow_mut() = Some(Err(error));
    }

    /// Number of `getBattery()` calls so far.
    pub fn battery_calls(&self) -> usize {
        self.battery_calls.get()
    }

    /// Network information object, if present.
    pub fn connection_info(&self) -> Option<Rc<MemoryNetworkConnection>> {
        self.connection.borrow().clone()
    }

    /// Permissions registry, if present.
    pub fn permission_registry(&self) -> Option<Rc<MemoryPermissions>> {
        self.permissions.borrow().clone()
    }

    /// Geolocation service, if present.
    pub fn geolocation_service(&self) -> Option<Rc<MemoryGeolocation>> {
        self.geolocation.borrow().clone()
    }
}

impl NavigatorApi for MemoryNavigator {
    fn is_online(&self) -> bool {
        self.online.get()
    }

    fn language(&self) -> Option<String> {
        self.language.borrow().clone()
    }

    fn languages(&self) -> Vec<String> {
        self.languages.borrow().clone()
    }

    fn supports_battery(&self) -> bool {
        self.battery.borrow().is_some()
    }

    fn battery(&self) -> Option<NativeFuture<Result<Rc<dyn BatteryManager>, PlatformError>>> {
        let outcome = self.battery.borrow().clone()?;
        self.battery_calls.set(self.battery_calls.get() + 1);
        let outcome = outcome.map(|manager| manager as Rc<dyn BatteryManager>);
        Some(future::ready(outcome).boxed_local())
    }

    fn connection(&self) -> Option<Rc<dyn NetworkConnection>> {
        self.connection_info()
            .map(|connection| connection as Rc<dyn NetworkConnection>)
    }

    fn permissions(&self) -> Option<Rc<dyn PermissionsApi>> {
        self.permission_registry()
            .map(|permissions| permissions as Rc<dyn PermissionsApi>)
    }

    fn geolocation(&self) -> Option<Rc<dyn GeolocationApi>> {
        self.geolocation_service()
            .map(|geolocation| geolocation as Rc<dyn GeolocationApi>)
    }
}

/// `BatteryManager` with per-field setters firing the matching change event.
pub struct MemoryBatteryManager {
    events: MemoryEventTarget,
    charging: Cell<bool>,
    charging_time: Cell<f64>,
    discharging_time: Cell<f64>,
    level: Cell<f64>,
}

impl Default for MemoryBatteryManager {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            charging: Cell::new(true),
            charging_time: Cell::new(0.0),
            discharging_time: Cell::new(f64::INFINITY),
            level: Cell::new(1.0),
        }
    }
}

impl MemoryBatteryManager {
    /// Fires `levelchange`.
    pub fn set_level(&self, level: f64) {
        self.level.set(level);
        self.events.dispatch("levelchange");
    }

    /// Fires `chargingchange`.
    pub fn set_charging(&self, charging: bool) {
        self.charging.set(charging);
        self.events.dispatch("chargingchange");
    }

    /// Fires `chargingtimechange`.
    pub fn set_charging_time(&self, seconds: f64) {
        self.charging_time.set(seconds);
        self.events.dispatch("chargingtimechange");
    }

    /// Fires `dischargingtimechange`.
    pub fn set_discharging_time(&self, seconds: f64) {
        self.discharging_time.set(seconds);
        self.events.dispatch("dischargingtimechange");
    }
}

impl BatteryManager for MemoryBatteryManager {
    fn charging(&self) -> bool {
        self.charging.get()
    }

    fn charging_time(&self) -> f64 {
        self.charging_time.get()
    }

    fn discharging_time(&self) -> f64 {
        self.discharging_time.get()
    }

    fn level(&self) -> f64 {
        self.level.get()
    }
}

/// `NetworkInformation`; every setter fires `change`.
pub struct MemoryNetworkConnection {
    events: MemoryEventTarget,
    effective_type: Cell<EffectiveConnectionType>,
    downlink: Cell<f64>,
    rtt: Cell<f64>,
    save_data: Cell<bool>,
}

impl Default for MemoryNetworkConnection {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            effective_type: Cell::new(EffectiveConnectionType::FourG),
            downlink: Cell::new(10.0),
            rtt: Cell::new(50.0),
            save_data: Cell::new(false),
        }
    }
}

impl MemoryNetworkConnection {
    /// Updates `effectiveType`.
    pub fn set_effective_type(&self, effective_type: EffectiveConnectionType) {
        self.effective_type.set(effective_type);
        self.events.dispatch("change");
    }

    /// Updates `downlink` and `rtt` together.
    pub fn set_throughput(&self, downlink: f64, rtt: f64) {
        self.downlink.set(downlink);
        self.rtt.set(rtt);
        self.events.dispatch("change");
    }

    /// Updates `saveData`.
    pub fn set_save_data(&self, save_data: bool) {
        self.save_data.set(save_data);
        self.events.dispatch("change");
    }
}

impl NetworkConnection for MemoryNetworkConnection {
    fn effective_type(&self) -> EffectiveConnectionType {
        self.effective_type.get()
    }

    fn downlink(&self) -> f64 {
        self.downlink.get()
    }

    fn rtt(&self) -> f64 {
        self.rtt.get()
    }

    fn save_data(&self) -> bool {
        self.save_data.get()
    }
}

/// `navigator.permissions` keeping one status object per name.
#[derive(Default)]
pub struct MemoryPermissions {
    statuses: RefCell<HashMap<PermissionName, Rc<MemoryPermissionStatus>>>,
    failures: RefCell<HashMap<PermissionName, PlatformError>>,
    query_calls: Cell<usize>,
}

impl MemoryPermissions {
    /// Returns (creating on first use) the status object for `name`.
    pub fn status(&self, name: PermissionName) -> Rc<MemoryPermissionStatus> {
        Rc::clone(
            self.statuses
                .borrow_mut()
                .entry(name)
                .or_insert_with(|| Rc::new(MemoryPermissionStatus::default())),
        )
    }

    /// Changes the decision for `name`, firing `change` on its status.
    pub fn set_state(&self, name: PermissionName, state: PermissionState) {
        self.status(name).set_state(state);
    }

    /// Makes queries for `name` reject with `error` until cleared.
    pub fn fail(&self, name: PermissionName, error: PlatformError) {
        self.failures.borrow_mut().insert(name, error);
    }

    /// Lets queries for `name` succeed again.
    pub fn clear_failure(&self, name: PermissionName) {
        self.failures.borrow_mut().remove(&name);
    }

    /// Number of `query()` calls so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.get()
    }
}

impl PermissionsApi for MemoryPermissions {
    fn query(
        &self,
        name: PermissionName,
    ) -> NativeFuture<Result<Rc<dyn PermissionStatus>, PlatformError>> {
        self.query_calls.set(self.query_calls.get() + 1);
        let failure = self.failures.borrow().get(&name).cloned();
        let outcome = match failure {
            Some(error) => Err(error),
            None => Ok(self.status(name) as Rc<dyn PermissionStatus>),
        };
        future::ready(outcome).boxed_local()
    }
}

/// `PermissionStatus`; starts at `prompt`.
#[derive(Default)]
pub struct MemoryPermissionStatus {
    events: MemoryEventTarget,
    state: Cell<PermissionState>,
}

impl MemoryPermissionStatus {
    /// Updates the state; fires `change` only when it differs.
    pub fn set_state(&self, state: PermissionState) {
        if self.state.replace(state) != state {
            self.events.dispatch("change");
        }
    }
}

impl PermissionStatus for MemoryPermissionStatus {
    fn state(&self) -> PermissionState {
        self.state.get()
    }
}

type PendingRequest = (PositionCallback, PositionErrorCallback);

/// `navigator.geolocation` delivering fixes pushed by hand.
#[derive(Default)]
pub struct MemoryGeolocation {
    pending: RefCell<Vec<PendingRequest>>,
    watches: RefCell<Vec<(WatchId, PositionCallback, PositionErrorCallback)>>,
    next_watch: Cell<i32>,
    current_requests: Cell<usize>,
    last_options: RefCell<Option<PositionOptions>>,
}

impl MemoryGeolocation {
    /// Resolves every pending one-shot request and notifies every watch.
    pub fn push_position(&self, position: GeoPosition) {
        let (one_shot, watches) = self.targets();
        for (on_position, _) in one_shot {
            on_position(position);
        }
        for (on_position, _) in watches {
            on_position(position);
        }
    }

    /// Fails every pending one-shot request and notifies every watch.
    pub fn push_error(&self, error: PlatformError) {
        let (one_shot, watches) = self.targets();
        for (_, on_error) in one_shot {
            on_error(error.clone());
        }
        for (_, on_error) in watches {
            on_error(error.clone());
        }
    }

    /// Number of watches not yet cleared.
    pub fn active_watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    /// Number of `getCurrentPosition` calls so far.
    pub fn current_request_count(&self) -> usize {
        self.current_requests.get()
    }

    /// Options passed to the most recent request.
    pub fn last_options(&self) -> Option<PositionOptions> {
        self.last_options.borrow().clone()
    }

    fn targets(&self) -> (Vec<PendingRequest>, Vec<PendingRequest>) {
        let one_shot = std::mem::take(&mut *self.pending.borrow_mut());
        let watches = self
            .watches
            .borrow()
            .iter()
            .map(|(_, on_position, on_error)| (Rc::clone(on_position), Rc::clone(on_error)))
            .collect();
        (one_shot, watches)
    }
}

impl GeolocationApi for MemoryGeolocation {
    fn get_current_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        self.current_requests.set(self.current_requests.get() + 1);
        *self.last_options.borrow_mut() = Some(options.clone());
        self.pending.borrow_mut().push((on_position, on_error));
    }

    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> WatchId {
        let id = WatchId(self.next_watch.get() + 1);
        self.next_watch.set(id.0);
        *self.last_options.borrow_mut() = Some(options.clone());
        self.watches.borrow_mut().push((id, on_position, on_error));
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.watches.borrow_mut().retain(|(watch, _, _)| *watch != id);
    }
}

/// `document` with a fixed root element size.
pub struct MemoryDocument {
    events: MemoryEventTarget,
    visibility: Cell<VisibilityState>,
    client_size: Cell<(f64, f64)>,
    offset_size: Cell<(f64, f64)>,
    scrolling_element: Option<Rc<MemoryScrollElement>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            visibility: Cell::new(VisibilityState::Visible),
            client_size: size_cell(1265.0, 720.0),
            offset_size: size_cell(1265.0, 2400.0),
            scrolling_element: Some(Rc::new(MemoryScrollElement::default())),
        }
    }
}

impl MemoryDocument {
    /// Fires `visibilitychange`.
    pub fn set_visibility(&self, visibility: VisibilityState) {
        self.visibility.set(visibility);
        self.events.dispatch("visibilitychange");
    }

    /// Sets `documentElement.clientWidth/Height`.
    pub fn set_client_size(&self, width: f64, height: f64) {
        self.client_size.set((width, height));
    }

    /// Sets `documentElement.offsetWidth/Height`.
    pub fn set_offset_size(&self, width: f64, height: f64) {
        self.offset_size.set((width, height));
    }

    /// The scrolling element, if any.
    pub fn scroller(&self) -> Option<&Rc<MemoryScrollElement>> {
        self.scrolling_element.as_ref()
    }
}

impl DocumentApi for MemoryDocument {
    fn visibility_state(&self) -> VisibilityState {
        self.visibility.get()
    }

    fn client_width(&self) -> f64 {
        self.client_size.get().0
    }

    fn client_height(&self) -> f64 {
        self.client_size.get().1
    }

    fn offset_width(&self) -> f64 {
        self.offset_size.get().0
    }

    fn offset_height(&self) -> f64 {
        self.offset_size.get().1
    }

    fn scrolling_element(&self) -> Option<Rc<dyn ScrollElement>> {
        self.scrolling_element
            .as_ref()
            .map(|element| Rc::clone(element) as Rc<dyn ScrollElement>)
    }
}

/// `screen` of a 1080p display.
pub struct MemoryScreen {
    events: MemoryEventTarget,
    size: Cell<(f64, f64)>,
    avail_size: Cell<(f64, f64)>,
    color_depth: Cell<f64>,
    pixel_depth: Cell<f64>,
    orientation: Option<Rc<MemoryScreenOrientation>>,
}

impl Default for MemoryScreen {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            size: size_cell(1920.0, 1080.0),
            avail_size: size_cell(1920.0, 1040.0),
            color_depth: Cell::new(24.0),
            pixel_depth: Cell::new(24.0),
            orientation: Some(Rc::new(MemoryScreenOrientation::default())),
        }
    }
}

impl MemoryScreen {
    /// Moves the window to a screen of another size, firing `change`.
    pub fn set_size(&self, width: f64, height: f64, avail_width: f64, avail_height: f64) {
        self.size.set((width, height));
        self.avail_size.set((avail_width, avail_height));
        self.events.dispatch("change");
    }

    /// Updates color and pixel depth, firing `change`.
    pub fn set_depth(&self, color_depth: f64, pixel_depth: f64) {
        self.color_depth.set(color_depth);
        self.pixel_depth.set(pixel_depth);
        self.events.dispatch("change");
    }

    /// Orientation object, if any.
    pub fn orientation_info(&self) -> Option<&Rc<MemoryScreenOrientation>> {
        self.orientation.as_ref()
    }
}

impl ScreenApi for MemoryScreen {
    fn width(&self) -> f64 {
        self.size.get().0
    }

    fn height(&self) -> f64 {
        self.size.get().1
    }

    fn avail_width(&self) -> f64 {
        self.avail_size.get().0
    }

    fn avail_height(&self) -> f64 {
        self.avail_size.get().1
    }

    fn color_depth(&self) -> f64 {
        self.color_depth.get()
    }

    fn pixel_depth(&self) -> f64 {
        self.pixel_depth.get()
    }

    fn orientation(&self) -> Option<Rc<dyn ScreenOrientationApi>> {
        self.orientation
            .as_ref()
            .map(|orientation| Rc::clone(orientation) as Rc<dyn ScreenOrientationApi>)
    }
}

/// `screen.orientation`.
pub struct MemoryScreenOrientation {
    events: MemoryEventTarget,
    angle: Cell<f64>,
    orientation_type: Cell<OrientationType>,
}

impl Default for MemoryScreenOrientation {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            angle: Cell::new(0.0),
            orientation_type: Cell::new(OrientationType::LandscapePrimary),
        }
    }
}

impl MemoryScreenOrientation {
    /// Rotates the device, firing `change`.
    pub fn rotate(&self, angle: f64, orientation_type: OrientationType) {
        self.angle.set(angle);
        self.orientation_type.set(orientation_type);
        self.events.dispatch("change");
    }
}

impl ScreenOrientationApi for MemoryScreenOrientation {
    fn angle(&self) -> f64 {
        self.angle.get()
    }

    fn orientation_type(&self) -> OrientationType {
        self.orientation_type.get()
    }
}

/// `window.visualViewport`.
pub struct MemoryVisualViewport {
    events: MemoryEventTarget,
    size: Cell<(f64, f64)>,
    offset: Cell<(f64, f64)>,
    page: Cell<(f64, f64)>,
    scale: Cell<f64>,
}

impl Default for MemoryVisualViewport {
    fn default() -> Self {
        Self {
            events: MemoryEventTarget::default(),
            size: size_cell(1280.0, 720.0),
            offset: size_cell(0.0, 0.0),
            page: size_cell(0.0, 0.0),
            scale: Cell::new(1.0),
        }
    }
}

impl MemoryVisualViewport {
    /// Fires `resize`.
    pub fn set_size(&self, width: f64, height: f64) {
        self.size.set((width, height));
        self.events.dispatch("resize");
    }

    /// Fires `resize`.
    pub fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
        self.events.dispatch("resize");
    }

    /// Pans the viewport, firing `scroll`.
    pub fn pan(&self, offset_left: f64, offset_top: f64, page_left: f64, page_top: f64) {
        self.offset.set((offset_left, offset_top));
        self.page.set((page_left, page_top));
        self.events.dispatch("scroll");
    }
}

impl VisualViewportApi for MemoryVisualViewport {
    fn width(&self) -> f64 {
        self.size.get().0
    }

    fn height(&self) -> f64 {
        self.size.get().1
    }

    fn offset_left(&self) -> f64 {
        self.offset.get().0
    }

    fn offset_top(&self) -> f64 {
        self.offset.get().1
    }

    fn page_left(&self) -> f64 {
        self.page.get().0
    }

    fn page_top(&self) -> f64 {
        self.page.get().1
    }

    fn scale(&self) -> f64 {
        self.scale.get()
    }
}

/// Scrollable element; also an event target for `scroll`.
#[derive(Default)]
pub struct MemoryScrollElement {
    events: MemoryEventTarget,
    scroll_top: Cell<f64>,
}

impl MemoryScrollElement {
    /// Sets `scrollTop` and fires `scroll` on the element itself.
    pub fn scroll_to(&self, top: f64) {
        self.scroll_top.set(top);
        self.events.dispatch("scroll");
    }

    /// Sets `scrollTop` silently.
    pub fn set_scroll_top(&self, top: f64) {
        self.scroll_top.set(top);
    }
}

impl ScrollElement for MemoryScrollElement {
    fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }
}

/// Complete in-memory browser.
#[derive(Clone)]
pub struct MemoryPlatform {
    /// `window`
    pub window: Rc<MemoryWindow>,
    /// `navigator`
    pub navigator: Rc<MemoryNavigator>,
    /// `document`
    pub document: Rc<MemoryDocument>,
    /// `screen`
    pub screen: Rc<MemoryScreen>,
    /// `window.visualViewport`
    pub visual_viewport: Rc<MemoryVisualViewport>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Browser with every API present and default values.
    pub fn new() -> Self {
        Self {
            window: Rc::new(MemoryWindow::default()),
            navigator: Rc::new(MemoryNavigator::default()),
            document: Rc::new(MemoryDocument::default()),
            screen: Rc::new(MemoryScreen::default()),
            visual_viewport: Rc::new(MemoryVisualViewport::default()),
        }
    }

    /// Trait handles to every object.
    pub fn env(&self) -> PlatformEnv {
        PlatformEnv {
            window: Some(Rc::clone(&self.window) as Rc<dyn WindowApi>),
            navigator: Some(Rc::clone(&self.navigator) as Rc<dyn NavigatorApi>),
            document: Some(Rc::clone(&self.document) as Rc<dyn DocumentApi>),
            screen: Some(Rc::clone(&self.screen) as Rc<dyn ScreenApi>),
            visual_viewport: Some(Rc::clone(&self.visual_viewport) as Rc<dyn VisualViewportApi>),
        }
    }

    /// Flips `navigator.onLine` and fires `online`/`offline` on the window.
    pub fn set_online(&self, online: bool) {
        self.navigator.set_online_flag(online);
        self.window
            .events()
            .dispatch(if online { "online" } else { "offline" });
    }

    /// Replaces the language list and fires `languagechange` on the window.
    pub fn set_languages(&self, languages: &[&str]) {
        self.navigator
            .set_language_list(languages.iter().map(|lang| lang.to_string()).collect());
        self.window.events().dispatch("languagechange");
    }

    /// Moves the document scroller and fires `scroll` on the window.
    pub fn scroll_to(&self, top: f64) {
        if let Some(scroller) = self.document.scroller() {
            scroller.set_scroll_top(top);
        }
        self.window.events().dispatch("scroll");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_guards_remove_only_their_registration() {
        let target = MemoryEventTarget::default();
        let hits = Rc::new(Cell::new(0));
        let first_hits = hits.clone();
        let first = target.add_listener(
            "resize",
            Rc::new(move || first_hits.set(first_hits.get() + 1)),
        );
        let second_hits = hits.clone();
        let _second = target.add_listener(
            "resize",
            Rc::new(move || second_hits.set(second_hits.get() + 10)),
        );

        target.dispatch("resize");
        assert_eq!(hits.get(), 11);

        drop(first);
        assert_eq!(target.listener_count("resize"), 1);
        target.dispatch("resize");
        assert_eq!(hits.get(), 21);
        target.dispatch("scroll");
        assert_eq!(hits.get(), 21);
    }

    #[test]
    fn media_lists_fire_change_only_when_match_flips() {
        let window = MemoryWindow::default();
        let list = window.media_query("(min-width: 600px)");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _guard = list.add_listener("change", Rc::new(move || counter.set(counter.get() + 1)));

        window.set_media_matches("(min-width: 600px)", true);
        window.set_media_matches("(min-width: 600px)", true);
        assert_eq!(hits.get(), 1);
        assert!(window
            .match_media("(min-width: 600px)")
            .is_some_and(|list| list.matches()));

        window.set_match_media_supported(false);
        assert!(window.match_media("(min-width: 600px)").is_none());
    }

    #[test]
    fn storage_area_rejects_writes_when_failing() {
        let area = MemoryStorageArea::default();
        area.set_item("k", "v").expect("write");
        area.set_fail_writes(true);
        assert_eq!(
            area.set_item("k", "w"),
            Err(PlatformError::Storage("quota exceeded".to_string()))
        );
        assert_eq!(area.item("k").as_deref(), Some("v"));
    }

    #[test]
    fn permission_queries_are_counted_and_can_fail() {
        let permissions = MemoryPermissions::default();
        let status = futures::executor::block_on(permissions.query(PermissionName::Camera))
            .expect("query");
        assert_eq!(status.state(), PermissionState::Prompt);

        permissions.fail(
            PermissionName::Camera,
            PlatformError::rejected("permissions", "blocked"),
        );
        assert!(futures::executor::block_on(permissions.query(PermissionName::Camera)).is_err());
        assert_eq!(permissions.query_calls(), 2);
    }

    #[test]
    fn geolocation_watches_stop_after_clear() {
        let geolocation = MemoryGeolocation::default();
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        let id = geolocation.watch_position(
            Rc::new(move |position: GeoPosition| sink.set(position.coords.latitude)),
            Rc::new(|_: PlatformError| {}),
            &PositionOptions::default(),
        );
        let mut position = GeoPosition::default();
        position.coords.latitude = 51.5;
        geolocation.push_position(position);
        assert_eq!(seen.get(), 51.5);

        geolocation.clear_watch(id);
        position.coords.latitude = 40.7;
        geolocation.push_position(position);
        assert_eq!(seen.get(), 51.5);
        assert_eq!(geolocation.active_watch_count(), 0);
    }
}
