//! Registry data model
//!
//! These are the records every window writes into the shared store. Field
//! names on the wire are camelCase so that the blob stays readable from the
//! page's own JavaScript.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application-supplied payload attached to a window at registration.
///
/// Opaque to the registry; carried through unchanged.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Unique window identifier
///
/// Random (UUID v4) so that independent processes can mint ids without
/// coordinating. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(Uuid);

impl WindowId {
    /// Mint a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 2D point in shared screen space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Window position and size in the shared screen coordinate space
///
/// Not the document's own coordinates: `x`/`y` are where the window sits on
/// the screen, so shapes from different windows are directly comparable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Shape {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Centre of the window in screen space.
    ///
    /// This is where the scene places the object belonging to the window.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Translation that maps screen space into this window's viewport.
    pub fn scene_offset(&self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// One live window as recorded in the shared store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub shape: Shape,
    #[serde(default)]
    pub metadata: Metadata,
    /// Wall-clock ms of the owner's most recent refresh
    pub last_seen: u64,
    /// Wall-clock ms at which the owner registered
    #[serde(default)]
    pub registered_at: u64,
}

impl WindowDescriptor {
    /// Build a descriptor for a window registering at `now`.
    pub fn new(id: WindowId, shape: Shape, metadata: Metadata, now: u64) -> Self {
        Self {
            id,
            shape,
            metadata,
            last_seen: now,
            registered_at: now,
        }
    }

    /// Ordering key of the observed view: registration order, id as tiebreak.
    pub(crate) fn registration_key(&self) -> (u64, WindowId) {
        (self.registered_at, self.id)
    }
}

/// The blob stored under the registry key
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    /// Last writer; advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<WindowId>,
    #[serde(default)]
    pub windows: Vec<WindowDescriptor>,
}

impl RegistryState {
    pub fn new(owner_id: WindowId, windows: Vec<WindowDescriptor>) -> Self {
        Self {
            owner_id: Some(owner_id),
            windows,
        }
    }
}
