//! Scene state: sensor snapshots and per-marker anchor slots.

use std::fmt;

use serde::Serialize;

use crate::geodesy::GeoPoint;
use crate::host::TrackingState;
use crate::marker::{Marker, MarkerId, PlacementType};

/// Previous/current pair for one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Snapshot<T> {
    previous: Option<T>,
    current: Option<T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            previous: None,
            current: None,
        }
    }
}

impl<T: Copy> Snapshot<T> {
    /// Record a new reading; returns the one it replaced.
    pub(crate) fn push(&mut self, value: T) -> Option<T> {
        self.previous = self.current;
        self.current = Some(value);
        self.previous
    }

    pub(crate) fn current(&self) -> Option<T> {
        self.current
    }

    pub(crate) fn previous(&self) -> Option<T> {
        self.previous
    }
}

/// Observer state as last seen by the frame thread.
#[derive(Debug, Default)]
pub(crate) struct SceneState {
    pub(crate) location: Snapshot<GeoPoint>,
    pub(crate) bearing: Snapshot<f32>,
    pub(crate) tracking: Snapshot<TrackingState>,
}

impl SceneState {
    /// Whether location, bearing, and a well-tracked camera are all known.
    pub(crate) fn is_ready(&self) -> bool {
        self.location.current().is_some()
            && self.bearing.current().is_some()
            && self.tracking.current() == Some(TrackingState::Tracking)
    }
}

/// Public view of where a marker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStatus {
    /// Registered, not yet evaluated (or its anchor was dropped).
    Pending,
    /// Holds a live anchor.
    Rendered,
    /// Evaluated and found beyond its render range.
    OutOfRange,
}

impl fmt::Display for MarkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarkerStatus::Pending => "pending",
            MarkerStatus::Rendered => "rendered",
            MarkerStatus::OutOfRange => "out of range",
        };
        f.write_str(s)
    }
}

/// An anchor owned by the scene together with the node state it drives.
#[derive(Debug)]
pub(crate) struct AnchorNode<A> {
    pub(crate) anchor: A,
    pub(crate) placement: PlacementType,
    /// World height written to the node every frame.
    pub(crate) pinned_height: f32,
    pub(crate) enabled: bool,
}

#[derive(Debug)]
pub(crate) enum Slot<A> {
    Pending,
    Rendered(AnchorNode<A>),
    OutOfRange,
}

/// A registered marker and its anchor slot.
///
/// A marker is rendered exactly when its slot holds an anchor, so the
/// rendered set can never drift from the anchors actually owned.
#[derive(Debug)]
pub(crate) struct MarkerEntry<A> {
    pub(crate) id: MarkerId,
    pub(crate) marker: Marker,
    pub(crate) slot: Slot<A>,
}

impl<A> MarkerEntry<A> {
    pub(crate) fn new(id: MarkerId, marker: Marker) -> Self {
        Self {
            id,
            marker,
            slot: Slot::Pending,
        }
    }

    pub(crate) fn status(&self) -> MarkerStatus {
        match self.slot {
            Slot::Pending => MarkerStatus::Pending,
            Slot::Rendered(_) => MarkerStatus::Rendered,
            Slot::OutOfRange => MarkerStatus::OutOfRange,
        }
    }

    pub(crate) fn node(&self) -> Option<&AnchorNode<A>> {
        match &self.slot {
            Slot::Rendered(node) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn node_mut(&mut self) -> Option<&mut AnchorNode<A>> {
        match &mut self.slot {
            Slot::Rendered(node) => Some(node),
            _ => None,
        }
    }

    /// Take the anchor out, leaving the slot `Pending`.
    pub(crate) fn take_node(&mut self) -> Option<AnchorNode<A>> {
        match std::mem::replace(&mut self.slot, Slot::Pending) {
            Slot::Rendered(node) => Some(node),
            other => {
                self.slot = other;
                None
            }
        }
    }
}
