//! Change dispatcher
//!
//! Synchronous fan-out to registered observers. There is one cooperative
//! execution context per process, so listeners run inline with no queue
//! and no re-entrancy guard.

use crate::types::{Shape, WindowDescriptor};

/// Observer of window-set changes (membership or order).
pub trait WindowsChangedListener {
    fn windows_changed(&mut self, windows: &[WindowDescriptor]);
}

/// Observer of this window's own shape.
pub trait ShapeChangedListener {
    fn shape_changed(&mut self, shape: Shape);
}

impl<F: FnMut(&[WindowDescriptor])> WindowsChangedListener for F {
    fn windows_changed(&mut self, windows: &[WindowDescriptor]) {
        self(windows)
    }
}

impl<F: FnMut(Shape)> ShapeChangedListener for F {
    fn shape_changed(&mut self, shape: Shape) {
        self(shape)
    }
}

/// Handle returned on subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Holds the listeners of both notification channels.
#[derive(Default)]
pub struct ChangeDispatcher {
    next_id: u64,
    windows: Vec<(ListenerId, Box<dyn WindowsChangedListener>)>,
    shape: Vec<(ListenerId, Box<dyn ShapeChangedListener>)>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_windows_listener(
        &mut self,
        listener: impl WindowsChangedListener + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.windows.push((id, Box::new(listener)));
        id
    }

    pub fn add_shape_listener(&mut self, listener: impl ShapeChangedListener + 'static) -> ListenerId {
        let id = self.allocate_id();
        self.shape.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener from whichever channel holds it.
    ///
    /// Returns false if the id is unknown.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.windows.len() + self.shape.len();
        self.windows.retain(|(l, _)| *l != id);
        self.shape.retain(|(l, _)| *l != id);
        before != self.windows.len() + self.shape.len()
    }

    pub fn listener_count(&self) -> usize {
        self.windows.len() + self.shape.len()
    }

    /// Notify listeners in subscription order.
    pub fn notify_windows(&mut self, windows: &[WindowDescriptor]) {
        for (_, listener) in self.windows.iter_mut() {
            listener.windows_changed(windows);
        }
    }

    pub fn notify_shape(&mut self, shape: Shape) {
        for (_, listener) in self.shape.iter_mut() {
            listener.shape_changed(shape);
        }
    }
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("windows_listeners", &self.windows.len())
            .field("shape_listeners", &self.shape.len())
            .finish()
    }
}
