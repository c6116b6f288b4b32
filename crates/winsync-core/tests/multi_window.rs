//! Multi-window integration tests
//!
//! Several registry clients share one `MemoryStore` and one `ManualClock`,
//! each standing in for a separate browser window.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use winsync_core::{
    ManualClock, MemoryStore, Metadata, RegistryClient, RegistryConfig, RegistryState, Shape,
    SharedStore, StoreError, WindowDescriptor, WindowId,
};

const KEY: &str = "winsync:windows";
const INTERVAL: u64 = 250;
const DEADLINE: u64 = 1000;

type Client = RegistryClient<MemoryStore, ManualClock>;

fn window(store: &MemoryStore, clock: &ManualClock) -> Client {
    RegistryClient::new(store.clone(), clock.clone(), RegistryConfig::default()).unwrap()
}

fn shape_at(x: f64) -> Shape {
    Shape::new(x, 0.0, 800.0, 600.0)
}

fn ids<S: SharedStore>(client: &RegistryClient<S, ManualClock>) -> Vec<WindowId> {
    client.windows().iter().map(|d| d.id).collect()
}

fn foo_bar() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("foo".into(), json!("bar"));
    metadata
}

/// Register A, then B: both observe [A, B].
#[test]
fn test_two_windows_agree_on_order() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(10_000);

    let mut a = window(&store, &clock);
    let a_desc = a.initialize(foo_bar(), shape_at(0.0)).unwrap();
    assert_eq!(ids(&a), vec![a_desc.id]);
    assert_eq!(a.windows()[0].metadata["foo"], json!("bar"));

    clock.advance(10);
    let mut b = window(&store, &clock);
    let b_desc = b.initialize(Metadata::new(), shape_at(900.0)).unwrap();
    assert_eq!(ids(&b), vec![a_desc.id, b_desc.id]);

    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));
    assert_eq!(ids(&a), vec![a_desc.id, b_desc.id]);

    // Both keep ticking; the order stays put
    for _ in 0..4 {
        clock.advance(INTERVAL);
        b.tick(shape_at(900.0));
        a.tick(shape_at(0.0));
        assert_eq!(ids(&a), vec![a_desc.id, b_desc.id]);
        assert_eq!(ids(&b), vec![a_desc.id, b_desc.id]);
    }
}

/// The stored blob lists the most recent writer last.
#[test]
fn test_stored_order_is_write_recency() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut b = window(&store, &clock);
    let a_id = a.initialize(Metadata::new(), shape_at(0.0)).unwrap().id;
    let b_id = b.initialize(Metadata::new(), shape_at(900.0)).unwrap().id;

    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));

    let state: RegistryState = serde_json::from_str(&store.peek(KEY).unwrap()).unwrap();
    let stored: Vec<_> = state.windows.iter().map(|d| d.id).collect();
    assert_eq!(stored, vec![b_id, a_id]);
    assert_eq!(state.owner_id, Some(a_id));
}

/// B stops refreshing: A drops it once the deadline has passed.
#[test]
fn test_closed_window_expires() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut b = window(&store, &clock);
    let a_id = a.initialize(Metadata::new(), shape_at(0.0)).unwrap().id;
    b.initialize(Metadata::new(), shape_at(900.0)).unwrap();

    let changes = Rc::new(RefCell::new(Vec::new()));
    let c = changes.clone();
    a.add_windows_listener(move |w: &[WindowDescriptor]| c.borrow_mut().push(w.len()));

    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));
    assert_eq!(a.windows().len(), 2);

    // B is gone; A keeps ticking
    drop(b);
    let mut elapsed = INTERVAL;
    while elapsed <= DEADLINE {
        clock.advance(INTERVAL);
        elapsed += INTERVAL;
        a.tick(shape_at(0.0));
    }
    assert_eq!(ids(&a), vec![a_id]);
    assert_eq!(*changes.borrow(), vec![2, 1]);
}

/// Within one tick after the deadline, every other active window has
/// evicted the dead one.
#[test]
fn test_expiry_visible_within_one_tick() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut b = window(&store, &clock);
    let mut dead = window(&store, &clock);
    a.initialize(Metadata::new(), shape_at(0.0)).unwrap();
    b.initialize(Metadata::new(), shape_at(900.0)).unwrap();
    let dead_id = dead.initialize(Metadata::new(), shape_at(1800.0)).unwrap().id;

    clock.set(DEADLINE / 2);
    a.tick(shape_at(0.0));
    b.tick(shape_at(900.0));

    // Dead window's last refresh is at t=0
    clock.set(DEADLINE + 1);
    a.tick(shape_at(0.0));
    b.tick(shape_at(900.0));

    assert!(!ids(&a).contains(&dead_id));
    assert!(!ids(&b).contains(&dead_id));
    assert_eq!(a.windows().len(), 2);
    assert_eq!(b.windows().len(), 2);
}

/// An external clear leaves each window with only itself on its next tick.
#[test]
fn test_external_clear() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut b = window(&store, &clock);
    let a_id = a.initialize(Metadata::new(), shape_at(0.0)).unwrap().id;
    clock.advance(1);
    let b_id = b.initialize(Metadata::new(), shape_at(900.0)).unwrap().id;

    store.clear().unwrap();
    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));
    assert_eq!(ids(&a), vec![a_id]);
    assert!(!a.is_degraded());

    store.clear().unwrap();
    b.tick(shape_at(900.0));
    assert_eq!(ids(&b), vec![b_id]);

    // And they find each other again
    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));
    assert_eq!(ids(&a), vec![a_id, b_id]);
}

/// A moves: its shape callback fires before any tick, and B sees the new
/// shape on B's next tick.
#[test]
fn test_move_propagates() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut b = window(&store, &clock);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    a.add_shape_listener(move |shape: Shape| s.borrow_mut().push(shape));

    let a_id = a.initialize(Metadata::new(), shape_at(0.0)).unwrap().id;
    b.initialize(Metadata::new(), shape_at(900.0)).unwrap();

    let moved = Shape::new(120.0, 80.0, 640.0, 480.0);
    a.notify_shape_changed(moved);
    assert_eq!(*seen.borrow(), vec![moved]);

    let b_calls = Rc::new(RefCell::new(0));
    let bc = b_calls.clone();
    b.add_windows_listener(move |_: &[WindowDescriptor]| *bc.borrow_mut() += 1);

    clock.advance(INTERVAL);
    b.tick(shape_at(900.0));
    let a_in_b = b.windows().iter().find(|d| d.id == a_id).unwrap();
    assert_eq!(a_in_b.shape, moved);
    // A shape change of another window is not a membership change
    assert_eq!(*b_calls.borrow(), 0);
}

/// A store that serves a fixed snapshot for reads, standing in for a window
/// that read the blob just before another window wrote it.
#[derive(Clone)]
struct StaleReads {
    inner: MemoryStore,
    snapshot: Rc<RefCell<Option<Option<String>>>>,
}

impl StaleReads {
    fn freeze(&self) {
        *self.snapshot.borrow_mut() = Some(self.inner.peek(KEY));
    }

    fn thaw(&self) {
        *self.snapshot.borrow_mut() = None;
    }
}

impl SharedStore for StaleReads {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match &*self.snapshot.borrow() {
            Some(frozen) => Ok(frozen.clone()),
            None => self.inner.get_item(key),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove_item(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear()
    }
}

/// Overlapping read-modify-write cycles lose an update but never corrupt the
/// blob, and the loser reappears after its next tick.
#[test]
fn test_lost_update_heals() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);
    let racy = StaleReads {
        inner: store.clone(),
        snapshot: Rc::new(RefCell::new(None)),
    };

    let mut a = RegistryClient::new(racy.clone(), clock.clone(), RegistryConfig::default()).unwrap();
    let mut b = window(&store, &clock);
    let a_id = a.initialize(Metadata::new(), shape_at(0.0)).unwrap().id;

    // A reads before B registers, writes after
    racy.freeze();
    clock.advance(1);
    let b_id = b.initialize(Metadata::new(), shape_at(900.0)).unwrap().id;
    clock.advance(INTERVAL);
    a.tick(shape_at(0.0));
    racy.thaw();

    let state: RegistryState = serde_json::from_str(&store.peek(KEY).unwrap()).unwrap();
    let stored: Vec<WindowId> = state.windows.iter().map(|d| d.id).collect();
    assert!(!stored.contains(&b_id));
    assert!(stored.contains(&a_id));

    b.tick(shape_at(900.0));
    assert_eq!(ids(&b), vec![a_id, b_id]);
    a.tick(shape_at(0.0));
    assert_eq!(ids(&a), vec![a_id, b_id]);
}

/// Windows in different namespaces never see each other.
#[test]
fn test_namespaces_isolate_applications() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);

    let mut a = window(&store, &clock);
    let mut other = RegistryClient::new(
        store.clone(),
        clock.clone(),
        RegistryConfig::default().with_namespace("other-app"),
    )
    .unwrap();

    a.initialize(Metadata::new(), shape_at(0.0)).unwrap();
    other.initialize(Metadata::new(), shape_at(0.0)).unwrap();
    a.tick(shape_at(0.0));

    assert_eq!(a.windows().len(), 1);
    assert_eq!(other.windows().len(), 1);
}
