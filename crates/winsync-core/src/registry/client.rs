//! Process-local registry client.

use super::config::RegistryConfig;
use super::reconcile::{merge, observed_view, same_membership};
use crate::clock::Clock;
use crate::dispatch::{ChangeDispatcher, ListenerId, ShapeChangedListener, WindowsChangedListener};
use crate::error::{RegistryError, RegistryResult, StoreError};
use crate::monitor::LivenessMonitor;
use crate::store::{SharedStore, StorageChannel};
use crate::types::{Metadata, RegistryState, Shape, WindowDescriptor, WindowId};

/// The registry as seen from one window.
///
/// Constructed once per process and handed to the rendering layer by
/// reference. All state other than the shared store lives here.
///
/// ## Tick
///
/// Every tick re-reads the shared blob, drops our previous entry and every
/// expired one, appends our freshly stamped descriptor and writes the blob
/// back. Observers are told when the resulting set of windows (or its
/// order) differs from the previous tick.
///
/// ## Failure
///
/// Store failures never reach the caller. A process that cannot read or
/// write the store runs in degraded mode and observes only itself.
pub struct RegistryClient<S, C> {
    channel: StorageChannel<S>,
    clock: C,
    config: RegistryConfig,
    monitor: LivenessMonitor,
    dispatcher: ChangeDispatcher,
    /// Our own descriptor, set by `initialize`
    local: Option<WindowDescriptor>,
    /// Last reconciled view in registration order
    view: Vec<WindowDescriptor>,
    degraded: bool,
}

impl<S: SharedStore, C: Clock> RegistryClient<S, C> {
    /// Create a client over `store`. Nothing is written until `initialize`.
    pub fn new(store: S, clock: C, config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;

        let monitor = LivenessMonitor::new(config.tick_interval_ms, config.liveness_deadline_ms());
        Ok(Self {
            channel: StorageChannel::new(store, &config.namespace),
            clock,
            config,
            monitor,
            dispatcher: ChangeDispatcher::new(),
            local: None,
            view: Vec::new(),
            degraded: false,
        })
    }

    /// Register this window and start the liveness monitor.
    ///
    /// Calling this twice is a programming error.
    pub fn initialize(&mut self, metadata: Metadata, shape: Shape) -> RegistryResult<WindowDescriptor> {
        self.initialize_with_id(WindowId::generate(), metadata, shape)
    }

    /// Like [`initialize`](Self::initialize) with an id minted by the caller,
    /// for hosts that need to know their id before the first notification.
    pub fn initialize_with_id(
        &mut self,
        id: WindowId,
        metadata: Metadata,
        shape: Shape,
    ) -> RegistryResult<WindowDescriptor> {
        if self.local.is_some() {
            return Err(RegistryError::AlreadyInitialized);
        }

        let now = self.clock.now_ms();
        let desc = WindowDescriptor::new(id, shape, metadata, now);
        tracing::info!(id = %desc.id, "registering window");

        self.local = Some(desc.clone());
        self.reconcile(now);
        self.monitor.arm(now);

        Ok(desc)
    }

    /// Last reconciled view, in registration order.
    ///
    /// Reflects the most recent tick. Always contains this window once
    /// initialized.
    pub fn windows(&self) -> &[WindowDescriptor] {
        &self.view
    }

    /// This window's descriptor.
    pub fn local(&self) -> Option<&WindowDescriptor> {
        self.local.as_ref()
    }

    pub fn id(&self) -> Option<WindowId> {
        self.local.as_ref().map(|d| d.id)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn monitor(&self) -> &LivenessMonitor {
        &self.monitor
    }

    pub fn channel(&self) -> &StorageChannel<S> {
        &self.channel
    }

    /// Registered and not stopped.
    pub fn is_running(&self) -> bool {
        self.local.is_some() && self.monitor.is_armed()
    }

    /// Stop refreshing our descriptor.
    ///
    /// Nothing is removed from the store; the other windows evict this one
    /// once the liveness deadline passes. Later ticks and shape changes are
    /// not published.
    pub fn stop(&mut self) {
        if self.is_running() {
            tracing::info!(id = ?self.id(), "stopping heartbeat");
        }
        self.monitor.disarm();
    }

    /// Wipe the whole shared store, every namespace included.
    pub fn reset_store(&self) -> RegistryResult<()> {
        self.channel.reset()?;
        tracing::info!("shared store cleared");
        Ok(())
    }

    /// Whether the last reconciliation could not use the store.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn add_windows_listener(
        &mut self,
        listener: impl WindowsChangedListener + 'static,
    ) -> ListenerId {
        self.dispatcher.add_windows_listener(listener)
    }

    pub fn add_shape_listener(&mut self, listener: impl ShapeChangedListener + 'static) -> ListenerId {
        self.dispatcher.add_shape_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.remove(id)
    }

    /// The host reports that this window moved or resized.
    ///
    /// Applied immediately: shape listeners fire now and the new shape is
    /// published without waiting for the next tick. After `stop` only the
    /// listeners fire.
    pub fn notify_shape_changed(&mut self, shape: Shape) {
        if !self.apply_shape(shape) || !self.monitor.is_armed() {
            return;
        }
        let now = self.clock.now_ms();
        self.reconcile(now);
    }

    /// Run one liveness tick with the shape currently reported by the host.
    pub fn tick(&mut self, shape: Shape) {
        if !self.is_running() {
            return;
        }
        let now = self.clock.now_ms();
        self.apply_shape(shape);
        self.reconcile(now);
        self.monitor.record_tick(now);
    }

    /// Tick if the monitor says one is due. Returns whether it ticked.
    ///
    /// For hosts driven by a frame loop rather than a timer.
    pub fn poll(&mut self, shape: Shape) -> bool {
        if !self.monitor.is_due(self.clock.now_ms()) {
            return false;
        }
        self.tick(shape);
        true
    }

    /// Store `shape` as ours and notify shape listeners if it changed.
    fn apply_shape(&mut self, shape: Shape) -> bool {
        let Some(local) = self.local.as_mut() else {
            return false;
        };
        if local.shape == shape {
            return false;
        }
        local.shape = shape;
        self.dispatcher.notify_shape(shape);
        true
    }

    fn reconcile(&mut self, now: u64) {
        let Some(local) = self.local.as_mut() else {
            return;
        };
        local.last_seen = now;
        let own = local.clone();

        let stored = match self.channel.read() {
            Ok(previous) => {
                let merged = merge(previous, &own, &self.monitor, now);
                for id in &merged.evicted {
                    tracing::trace!(%id, "evicting expired window");
                }
                let state = RegistryState::new(own.id, merged.stored);
                match self.channel.write(&state) {
                    Ok(()) => {
                        self.set_degraded(false, None);
                        state.windows
                    }
                    Err(e) => {
                        self.set_degraded(true, Some(&e));
                        vec![own]
                    }
                }
            }
            Err(e) => {
                // Writing without having read would wipe every other window
                self.set_degraded(true, Some(&e));
                vec![own]
            }
        };

        let view = observed_view(stored);
        let changed = !same_membership(&self.view, &view);
        tracing::debug!(windows = view.len(), changed, "reconciled");

        self.view = view;
        if changed {
            tracing::info!(windows = self.view.len(), "window set changed");
            self.dispatcher.notify_windows(&self.view);
        }
    }

    fn set_degraded(&mut self, degraded: bool, cause: Option<&StoreError>) {
        if degraded == self.degraded {
            return;
        }
        self.degraded = degraded;
        match cause {
            Some(e) if degraded => {
                tracing::warn!(error = %e, "shared store unusable, running as a single window")
            }
            _ => tracing::info!("shared store reachable again"),
        }
    }
}

impl<S, C> std::fmt::Debug for RegistryClient<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("config", &self.config)
            .field("local", &self.local.as_ref().map(|d| d.id))
            .field("windows", &self.view.len())
            .field("degraded", &self.degraded)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
