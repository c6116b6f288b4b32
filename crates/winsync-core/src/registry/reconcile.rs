//! Pure reconciliation steps.
//!
//! Full state is re-derived from the shared blob every tick rather than
//! patched incrementally. The only lost updates are those of the inherent
//! read-modify-write race, and they heal on the next tick because every
//! window re-asserts its own entry.

use crate::monitor::LivenessMonitor;
use crate::types::{RegistryState, WindowDescriptor, WindowId};

/// Outcome of merging our descriptor into the stored state.
#[derive(Debug)]
pub(crate) struct Merged {
    /// Sequence to write back, own entry last
    pub stored: Vec<WindowDescriptor>,
    /// Descriptors dropped because their owner stopped refreshing
    pub evicted: Vec<WindowId>,
}

/// Drop our previous entry and every expired entry, then append `own`.
///
/// `own.last_seen` must already be stamped with `now`.
pub(crate) fn merge(
    previous: Option<RegistryState>,
    own: &WindowDescriptor,
    monitor: &LivenessMonitor,
    now: u64,
) -> Merged {
    let mut stored = Vec::new();
    let mut evicted = Vec::new();

    for desc in previous.map(|s| s.windows).unwrap_or_default() {
        if desc.id == own.id {
            continue;
        }
        if monitor.is_expired(desc.last_seen, now) {
            evicted.push(desc.id);
            continue;
        }
        // Another writer may have duplicated an entry in a lost-update race
        if stored.iter().any(|d: &WindowDescriptor| d.id == desc.id) {
            continue;
        }
        stored.push(desc);
    }

    stored.push(own.clone());
    Merged { stored, evicted }
}

/// The view handed to observers: registration order, stable across ticks.
pub(crate) fn observed_view(mut stored: Vec<WindowDescriptor>) -> Vec<WindowDescriptor> {
    stored.sort_by_key(WindowDescriptor::registration_key);
    stored
}

/// Whether two views list the same ids in the same order.
pub(crate) fn same_membership(a: &[WindowDescriptor], b: &[WindowDescriptor]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}
