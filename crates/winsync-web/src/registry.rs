//! JS-facing registry handle
//!
//! Wires a [`RegistryClient`] to the page: deferred registration once the
//! page is visible, the heartbeat interval, the resize listener, and the
//! callbacks of the rendering layer.
//!
//! Listeners run while the client is borrowed. JavaScript callbacks that
//! call back into `windows()`, `local()` or `isDegraded()` read snapshots
//! kept outside the client, so they never contend for that borrow.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winsync_core::{
    Metadata, RegistryClient, RegistryConfig, Shape, ShapeChangedListener, WindowDescriptor,
    WindowId, WindowsChangedListener,
};

use crate::host::{self, DateClock};
use crate::log;
use crate::storage::LocalStore;

/// Delay between the page becoming visible and registration.
///
/// `screenX`/`screenY` report wrong values for a short while after load.
pub const STARTUP_DELAY_MS: i32 = 500;

type Client = RegistryClient<LocalStore, DateClock>;

struct Shared {
    client: RefCell<Client>,
    snapshot: Rc<RefCell<Vec<WindowDescriptor>>>,
    /// Set just before registration so callbacks can find our entry
    local_id: Cell<Option<WindowId>>,
    degraded: Cell<bool>,
    metadata: RefCell<Option<Metadata>>,
    /// Registration has been scheduled
    scheduled: Cell<bool>,
    interval: Cell<Option<i32>>,
    /// Keeps timer and event closures alive for the page's lifetime
    closures: RefCell<Vec<Closure<dyn FnMut()>>>,
}

impl Shared {
    fn refresh_snapshot(&self, client: &Client) {
        *self.snapshot.borrow_mut() = client.windows().to_vec();
        self.degraded.set(client.is_degraded());
    }

    fn local_from_snapshot(&self) -> Option<WindowDescriptor> {
        let id = self.local_id.get()?;
        self.snapshot.borrow().iter().find(|d| d.id == id).cloned()
    }

    fn tick(&self) {
        let Ok(mut client) = self.client.try_borrow_mut() else {
            log("[winsync] tick skipped: registry busy");
            return;
        };
        client.tick(host::current_shape());
        self.refresh_snapshot(&client);
    }

    fn notify_shape_changed(&self) {
        let Ok(mut client) = self.client.try_borrow_mut() else {
            return;
        };
        client.notify_shape_changed(host::current_shape());
        self.refresh_snapshot(&client);
    }
}

/// Forwards window-set changes to a JavaScript function.
struct JsWindowsListener(js_sys::Function);

impl WindowsChangedListener for JsWindowsListener {
    fn windows_changed(&mut self, windows: &[WindowDescriptor]) {
        if let Err(e) = self.0.call1(&JsValue::NULL, &to_js(windows)) {
            log(&format!("[winsync] windows-changed callback threw: {:?}", e));
        }
    }
}

/// Forwards own-shape changes to a JavaScript function.
struct JsShapeListener(js_sys::Function);

impl ShapeChangedListener for JsShapeListener {
    fn shape_changed(&mut self, shape: Shape) {
        if let Err(e) = self.0.call1(&JsValue::NULL, &to_js(&shape)) {
            log(&format!("[winsync] shape-changed callback threw: {:?}", e));
        }
    }
}

/// Convert any serializable value into a plain JS value.
fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

/// Read application metadata from a JS object. Anything else is empty.
fn metadata_from_js(value: &JsValue) -> Metadata {
    if value.is_undefined() || value.is_null() {
        return Metadata::new();
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// This window's handle onto the shared window registry.
#[wasm_bindgen]
pub struct WindowRegistry {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl WindowRegistry {
    /// Create a registry. `config` is an optional JSON object with
    /// `namespace`, `tickIntervalMs` and `livenessMultiplier`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<WindowRegistry, JsValue> {
        let config = match config {
            Some(json) => RegistryConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("invalid registry config: {}", e)))?,
            None => RegistryConfig::default(),
        };

        let store = LocalStore::open();
        if !store.is_available() {
            log("[winsync] localStorage unavailable - running as a single window");
        }

        let mut client = RegistryClient::new(store, DateClock, config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let snapshot = Rc::new(RefCell::new(Vec::new()));
        let snap = snapshot.clone();
        client.add_windows_listener(move |windows: &[WindowDescriptor]| {
            *snap.borrow_mut() = windows.to_vec();
        });

        Ok(Self {
            shared: Rc::new(Shared {
                client: RefCell::new(client),
                snapshot,
                local_id: Cell::new(None),
                degraded: Cell::new(false),
                metadata: RefCell::new(None),
                scheduled: Cell::new(false),
                interval: Cell::new(None),
                closures: RefCell::new(Vec::new()),
            }),
        })
    }

    /// Start the registry with the given metadata object.
    ///
    /// When the page URL carries the reset flag the shared store is wiped
    /// and nothing is started; returns false in that case. Otherwise the
    /// window registers as soon as the page is visible.
    pub fn start(&self, metadata: JsValue) -> Result<bool, JsValue> {
        self.begin(metadata, host::reset_requested(), host::is_visible())
    }

    /// Known windows in registration order, as of the last tick.
    pub fn windows(&self) -> JsValue {
        to_js(self.shared.snapshot.borrow().as_slice())
    }

    /// This window's descriptor, or `null` before registration.
    pub fn local(&self) -> JsValue {
        let local = match self.shared.client.try_borrow() {
            Ok(client) => client.local().cloned(),
            Err(_) => self.shared.local_from_snapshot(),
        };
        local.as_ref().map(to_js).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = isRegistered)]
    pub fn is_registered(&self) -> bool {
        self.shared.local_id.get().is_some()
    }

    #[wasm_bindgen(js_name = isDegraded)]
    pub fn is_degraded(&self) -> bool {
        self.shared.degraded.get()
    }

    /// Translation `{x, y}` that lines the shared scene up with this window.
    #[wasm_bindgen(js_name = sceneOffset)]
    pub fn scene_offset(&self) -> JsValue {
        to_js(&host::current_shape().scene_offset())
    }

    /// Call `callback(windows)` whenever the set of windows changes.
    #[wasm_bindgen(js_name = onWindowsChanged)]
    pub fn on_windows_changed(&self, callback: js_sys::Function) -> Result<(), JsValue> {
        let mut client = self
            .shared
            .client
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("registry busy"))?;
        client.add_windows_listener(JsWindowsListener(callback));
        Ok(())
    }

    /// Call `callback(shape)` whenever this window moves or resizes.
    #[wasm_bindgen(js_name = onShapeChanged)]
    pub fn on_shape_changed(&self, callback: js_sys::Function) -> Result<(), JsValue> {
        let mut client = self
            .shared
            .client
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("registry busy"))?;
        client.add_shape_listener(JsShapeListener(callback));
        Ok(())
    }

    /// Re-read this window's shape and publish it now.
    #[wasm_bindgen(js_name = notifyShapeChanged)]
    pub fn notify_shape_changed(&self) {
        self.shared.notify_shape_changed();
    }

    /// Run one heartbeat immediately.
    pub fn tick(&self) {
        self.shared.tick();
    }

    /// Stop the heartbeat. The descriptor is left to expire in the others;
    /// later ticks and resizes are no longer published.
    pub fn stop(&self) -> Result<(), JsValue> {
        self.shared
            .client
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("registry busy"))?
            .stop();

        if let (Some(handle), Some(window)) = (self.shared.interval.take(), web_sys::window()) {
            window.clear_interval_with_handle(handle);
            log("[winsync] heartbeat stopped");
        }
        Ok(())
    }
}

impl WindowRegistry {
    /// `start` with the page state passed in.
    fn begin(&self, metadata: JsValue, reset: bool, visible: bool) -> Result<bool, JsValue> {
        if reset {
            let client = self
                .shared
                .client
                .try_borrow()
                .map_err(|_| JsValue::from_str("registry busy"))?;
            client.reset_store().map_err(|e| {
                log(&format!("[winsync] reset failed: {}", e));
                JsValue::from_str(&e.to_string())
            })?;
            log("[winsync] shared store cleared");
            return Ok(false);
        }

        *self.shared.metadata.borrow_mut() = Some(metadata_from_js(&metadata));

        if visible {
            schedule_registration(&self.shared)?;
        } else {
            log("[winsync] page hidden - deferring registration");
            let weak = Rc::downgrade(&self.shared);
            let on_visible = Closure::wrap(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    if host::is_visible() {
                        if let Err(e) = schedule_registration(&shared) {
                            log(&format!("[winsync] could not schedule registration: {:?}", e));
                        }
                    }
                }
            }) as Box<dyn FnMut()>);

            let document = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| JsValue::from_str("no document"))?;
            document.add_event_listener_with_callback(
                "visibilitychange",
                on_visible.as_ref().unchecked_ref(),
            )?;
            self.shared.closures.borrow_mut().push(on_visible);
        }

        Ok(true)
    }
}

/// Register after the start-up delay. Idempotent.
fn schedule_registration(shared: &Rc<Shared>) -> Result<(), JsValue> {
    if shared.scheduled.replace(true) {
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let weak = Rc::downgrade(shared);
    let register_later = Closure::wrap(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            if let Err(e) = register(&shared) {
                log(&format!("[winsync] registration failed: {:?}", e));
            }
        }
    }) as Box<dyn FnMut()>);

    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        register_later.as_ref().unchecked_ref(),
        STARTUP_DELAY_MS,
    )?;
    shared.closures.borrow_mut().push(register_later);
    Ok(())
}

fn register(shared: &Rc<Shared>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let metadata = shared.metadata.borrow_mut().take().unwrap_or_default();

    let interval_ms = {
        let mut client = shared.client.borrow_mut();
        let id = WindowId::generate();
        shared.local_id.set(Some(id));
        let desc = client
            .initialize_with_id(id, metadata, host::current_shape())
            .map_err(|e| {
                shared.local_id.set(client.id());
                JsValue::from_str(&e.to_string())
            })?;
        shared.refresh_snapshot(&client);
        log(&format!(
            "[winsync] registered window {} ({} known)",
            desc.id,
            client.windows().len()
        ));
        client.config().tick_interval_ms
    };

    let heartbeat = on_shared(Rc::downgrade(shared), Shared::tick);
    let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
        heartbeat.as_ref().unchecked_ref(),
        i32::try_from(interval_ms).unwrap_or(i32::MAX),
    )?;
    shared.interval.set(Some(handle));

    let on_resize = on_shared(Rc::downgrade(shared), Shared::notify_shape_changed);
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

    let mut closures = shared.closures.borrow_mut();
    closures.push(heartbeat);
    closures.push(on_resize);
    Ok(())
}

/// Closure that runs `f` on the shared state while it is still alive.
fn on_shared(weak: Weak<Shared>, f: fn(&Shared)) -> Closure<dyn FnMut()> {
    Closure::wrap(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            f(&shared);
        }
    }) as Box<dyn FnMut()>)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use winsync_core::SharedStore;

    wasm_bindgen_test_configure!(run_in_browser);

    fn registry(namespace: &str) -> WindowRegistry {
        let config = format!(r#"{{"namespace": "{}"}}"#, namespace);
        LocalStore::open()
            .remove_item(&format!("{}:windows", namespace))
            .unwrap();
        WindowRegistry::new(Some(config)).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_reset_wipes_store_and_does_not_start() {
        let registry = registry("winsync-test-reset");
        let store = LocalStore::open();
        store.set_item("winsync-test-reset:windows", "{}").unwrap();

        assert!(!registry.begin(JsValue::NULL, true, true).unwrap());
        assert_eq!(store.get_item("winsync-test-reset:windows").unwrap(), None);
        assert!(!registry.shared.scheduled.get());
        assert!(registry.shared.closures.borrow().is_empty());
    }

    #[wasm_bindgen_test]
    fn test_hidden_page_defers_registration() {
        let registry = registry("winsync-test-hidden");

        assert!(registry.begin(JsValue::NULL, false, false).unwrap());
        assert!(!registry.shared.scheduled.get());
        // Only the visibilitychange listener
        assert_eq!(registry.shared.closures.borrow().len(), 1);
        assert!(!registry.is_registered());
    }

    #[wasm_bindgen_test]
    fn test_visible_page_schedules_once() {
        let registry = registry("winsync-test-visible");

        assert!(registry.begin(JsValue::NULL, false, true).unwrap());
        assert!(registry.shared.scheduled.get());
        schedule_registration(&registry.shared).unwrap();
        assert_eq!(registry.shared.closures.borrow().len(), 1);
        // Registration waits for the start-up delay
        assert!(!registry.is_registered());
    }

    #[wasm_bindgen_test]
    fn test_stopped_window_stays_stopped() {
        let registry = registry("winsync-test-stop");
        let metadata = js_sys::JSON::parse(r#"{"color": "tomato"}"#).unwrap();
        registry.begin(metadata, false, true).unwrap();

        register(&registry.shared).unwrap();
        assert!(registry.is_registered());
        assert!(registry.shared.interval.get().is_some());
        assert_eq!(js_sys::Array::from(&registry.windows()).length(), 1);
        let local = registry.shared.local_from_snapshot().unwrap();
        assert_eq!(local.metadata["color"], serde_json::json!("tomato"));

        registry.stop().unwrap();
        assert!(registry.shared.interval.get().is_none());

        let store = LocalStore::open();
        let before = store.get_item("winsync-test-stop:windows").unwrap();
        registry.tick();
        registry.notify_shape_changed();
        assert_eq!(store.get_item("winsync-test-stop:windows").unwrap(), before);
    }
}
