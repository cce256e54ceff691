//! Narrow interface to the host AR runtime.
//!
//! The engine never draws, tracks, or hit-tests by itself. Everything it
//! needs from the renderer goes through [`ArHost`]:
//!
//! ```text
//! LocationScene ──create_anchor/detach/attach_child──► ArHost (anchors)
//!               ──node_world_position/apply_node_transform──► ArHost (nodes)
//!               ──hit_test_all/overlaps_other (optional)──► ArHost (queries)
//! ```
//!
//! [`HeadlessHost`] is an in-memory implementation for simulations and tests.

mod headless;
mod pose;

pub use headless::{AnchorRecord, HeadlessAnchor, HeadlessHost};
pub use pose::{Pose, Ray};

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to host-owned visual content.
///
/// The engine only passes this back to the host; it never owns or inspects
/// the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderableId(pub u64);

impl fmt::Display for RenderableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "renderable:{}", self.0)
    }
}

/// Host-reported camera tracking quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    /// Camera pose is well tracked; anchors can be created.
    Tracking,
    /// Tracking is temporarily degraded.
    Paused,
    /// Tracking has stopped.
    Stopped,
}

impl TrackingState {
    /// Whether anchors may be created in this state.
    pub fn is_tracking(&self) -> bool {
        matches!(self, TrackingState::Tracking)
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingState::Tracking => "tracking",
            TrackingState::Paused => "paused",
            TrackingState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Errors reported by the host runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Tracking was lost before the anchor could be created.
    #[error("Camera is not tracking")]
    NotTracking,

    /// The host has no active AR session.
    #[error("No active AR session")]
    SessionUnavailable,

    /// The host refused to create the anchor.
    #[error("Anchor creation failed: {0}")]
    AnchorCreation(String),
}

/// Per-frame transform written to an anchored node.
///
/// `None` fields leave the host's current value untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    /// World-space height the node is pinned to.
    pub height: f32,
    /// Uniform world scale.
    pub scale: Option<f32>,
    /// World rotation.
    pub rotation: Option<Quat>,
}

/// A single result from [`ArHost::hit_test_all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// Renderable hit by the ray, if the hit node carries one.
    pub renderable: Option<RenderableId>,
    /// Whether the hit node is currently enabled.
    pub enabled: bool,
    /// Distance along the ray.
    pub distance: f32,
}

/// Capabilities the engine consumes from the AR runtime.
///
/// Implementations are driven from a single thread (the frame thread); no
/// method may block.
pub trait ArHost {
    /// Host anchor handle. Owned exclusively by the engine once returned.
    type Anchor;

    /// Create an anchor at a world pose.
    fn create_anchor(&mut self, pose: Pose) -> Result<Self::Anchor, HostError>;

    /// Detach and release an anchor together with its node.
    fn detach(&mut self, anchor: Self::Anchor);

    /// Attach renderable content as a child of the anchor's node.
    fn attach_child(&mut self, anchor: &Self::Anchor, renderable: RenderableId);

    /// Current world position of the anchor's node.
    fn node_world_position(&self, anchor: &Self::Anchor) -> Vec3;

    /// Write scale/rotation/height to the anchor's node.
    fn apply_node_transform(&mut self, anchor: &Self::Anchor, transform: NodeTransform);

    /// Show or hide the anchor's node.
    fn set_node_enabled(&mut self, anchor: &Self::Anchor, enabled: bool);

    /// Whether the node currently overlaps any other node.
    fn overlaps_other(&self, _anchor: &Self::Anchor) -> bool {
        false
    }

    /// All nodes hit by a ray, closest first.
    fn hit_test_all(&self, _ray: &Ray) -> Vec<SceneHit> {
        Vec::new()
    }
}
