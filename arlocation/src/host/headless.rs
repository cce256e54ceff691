//! In-memory AR host.
//!
//! Keeps anchors in a map and answers geometric queries against node
//! positions. Used by the `simulate` command and by tests; it has no
//! rendering or tracking of its own.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;

use super::{ArHost, HostError, NodeTransform, Pose, Ray, RenderableId, SceneHit};

/// Default hit radius around a node, in meters.
const DEFAULT_HIT_RADIUS: f32 = 0.5;

/// Default distance under which two nodes count as overlapping.
const DEFAULT_OVERLAP_RADIUS: f32 = 1.0;

/// Anchor handle issued by [`HeadlessHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessAnchor(u64);

impl fmt::Display for HeadlessAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor:{}", self.0)
    }
}

/// State of one live anchor and its node.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorRecord {
    pub pose: Pose,
    pub children: Vec<RenderableId>,
    pub transform: Option<NodeTransform>,
    pub enabled: bool,
}

impl AnchorRecord {
    /// Node position: the anchor translation with any pinned height applied.
    pub fn node_position(&self) -> Vec3 {
        let mut position = self.pose.translation;
        if let Some(transform) = &self.transform {
            position.y = transform.height;
        }
        position
    }
}

/// In-memory [`ArHost`].
#[derive(Debug)]
pub struct HeadlessHost {
    next_anchor: u64,
    anchors: HashMap<HeadlessAnchor, AnchorRecord>,
    failures_remaining: usize,
    created: u64,
    detached: u64,
    hit_radius: f32,
    overlap_radius: f32,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_radii(DEFAULT_HIT_RADIUS, DEFAULT_OVERLAP_RADIUS)
    }

    /// Host with custom hit-test and overlap radii.
    pub fn with_radii(hit_radius: f32, overlap_radius: f32) -> Self {
        Self {
            next_anchor: 1,
            anchors: HashMap::new(),
            failures_remaining: 0,
            created: 0,
            detached: 0,
            hit_radius,
            overlap_radius,
        }
    }

    /// Make the next `count` anchor creations fail.
    pub fn fail_next_anchors(&mut self, count: usize) {
        self.failures_remaining = count;
    }

    pub fn anchor(&self, anchor: &HeadlessAnchor) -> Option<&AnchorRecord> {
        self.anchors.get(anchor)
    }

    /// Live anchor carrying `renderable`, if any.
    pub fn anchor_for(&self, renderable: RenderableId) -> Option<(HeadlessAnchor, &AnchorRecord)> {
        self.anchors
            .iter()
            .find(|(_, record)| record.children.contains(&renderable))
            .map(|(id, record)| (*id, record))
    }

    /// Live anchors ordered by creation.
    pub fn live_anchors(&self) -> Vec<(HeadlessAnchor, &AnchorRecord)> {
        let mut anchors: Vec<_> = self.anchors.iter().map(|(id, r)| (*id, r)).collect();
        anchors.sort_by_key(|(id, _)| *id);
        anchors
    }

    pub fn live_anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Anchors created since construction.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Anchors detached since construction.
    pub fn detached_count(&self) -> u64 {
        self.detached
    }
}

impl ArHost for HeadlessHost {
    type Anchor = HeadlessAnchor;

    fn create_anchor(&mut self, pose: Pose) -> Result<HeadlessAnchor, HostError> {
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(HostError::AnchorCreation("injected failure".to_string()));
        }
        if !pose.translation.is_finite() {
            return Err(HostError::AnchorCreation(format!(
                "non-finite translation {}",
                pose.translation
            )));
        }

        let id = HeadlessAnchor(self.next_anchor);
        self.next_anchor += 1;
        self.created += 1;
        self.anchors.insert(
            id,
            AnchorRecord {
                pose,
                children: Vec::new(),
                transform: None,
                enabled: true,
            },
        );
        Ok(id)
    }

    fn detach(&mut self, anchor: HeadlessAnchor) {
        if self.anchors.remove(&anchor).is_some() {
            self.detached += 1;
        }
    }

    fn attach_child(&mut self, anchor: &HeadlessAnchor, renderable: RenderableId) {
        if let Some(record) = self.anchors.get_mut(anchor) {
            record.children.push(renderable);
        }
    }

    fn node_world_position(&self, anchor: &HeadlessAnchor) -> Vec3 {
        self.anchors
            .get(anchor)
            .map(AnchorRecord::node_position)
            .unwrap_or(Vec3::ZERO)
    }

    fn apply_node_transform(&mut self, anchor: &HeadlessAnchor, transform: NodeTransform) {
        if let Some(record) = self.anchors.get_mut(anchor) {
            record.transform = Some(transform);
        }
    }

    fn set_node_enabled(&mut self, anchor: &HeadlessAnchor, enabled: bool) {
        if let Some(record) = self.anchors.get_mut(anchor) {
            record.enabled = enabled;
        }
    }

    fn overlaps_other(&self, anchor: &HeadlessAnchor) -> bool {
        let Some(record) = self.anchors.get(anchor) else {
            return false;
        };
        let position = record.node_position();
        self.anchors.iter().any(|(other_id, other)| {
            other_id != anchor && other.node_position().distance(position) < self.overlap_radius
        })
    }

    fn hit_test_all(&self, ray: &Ray) -> Vec<SceneHit> {
        let mut hits: Vec<SceneHit> = self
            .anchors
            .values()
            .filter_map(|record| {
                let position = record.node_position();
                let t = (position - ray.origin).dot(ray.direction);
                if t < 0.0 {
                    return None;
                }
                if ray.at(t).distance(position) > self.hit_radius {
                    return None;
                }
                Some(SceneHit {
                    renderable: record.children.first().copied(),
                    enabled: record.enabled,
                    distance: t,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(host: &mut HeadlessHost, position: Vec3, renderable: u64) -> HeadlessAnchor {
        let anchor = host.create_anchor(Pose::from_translation(position)).unwrap();
        host.attach_child(&anchor, RenderableId(renderable));
        anchor
    }

    #[test]
    fn test_create_and_detach() {
        let mut host = HeadlessHost::new();
        let anchor = anchored(&mut host, Vec3::new(0.0, 0.0, -5.0), 1);
        assert_eq!(host.live_anchor_count(), 1);
        assert_eq!(host.anchor_for(RenderableId(1)).map(|(a, _)| a), Some(anchor));

        host.detach(anchor);
        assert_eq!(host.live_anchor_count(), 0);
        assert_eq!(host.created_count(), 1);
        assert_eq!(host.detached_count(), 1);
    }

    #[test]
    fn test_injected_failures() {
        let mut host = HeadlessHost::new();
        host.fail_next_anchors(2);
        assert!(host.create_anchor(Pose::IDENTITY).is_err());
        assert!(host.create_anchor(Pose::IDENTITY).is_err());
        assert!(host.create_anchor(Pose::IDENTITY).is_ok());
    }

    #[test]
    fn test_rejects_non_finite_pose() {
        let mut host = HeadlessHost::new();
        let pose = Pose::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(
            host.create_anchor(pose),
            Err(HostError::AnchorCreation(_))
        ));
    }

    #[test]
    fn test_pinned_height_moves_node() {
        let mut host = HeadlessHost::new();
        let anchor = anchored(&mut host, Vec3::new(1.0, 0.0, -3.0), 1);
        host.apply_node_transform(
            &anchor,
            NodeTransform {
                height: 2.5,
                scale: None,
                rotation: None,
            },
        );
        assert_eq!(host.node_world_position(&anchor), Vec3::new(1.0, 2.5, -3.0));
    }

    #[test]
    fn test_hit_test_orders_by_distance() {
        let mut host = HeadlessHost::new();
        anchored(&mut host, Vec3::new(0.0, 0.0, -10.0), 2);
        anchored(&mut host, Vec3::new(0.0, 0.0, -4.0), 1);
        anchored(&mut host, Vec3::new(5.0, 0.0, -4.0), 3);

        let ray = Ray::through(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)).unwrap();
        let hits = host.hit_test_all(&ray);
        let order: Vec<_> = hits.iter().map(|h| h.renderable).collect();
        assert_eq!(order, vec![Some(RenderableId(1)), Some(RenderableId(2))]);
    }

    #[test]
    fn test_overlap_detection() {
        let mut host = HeadlessHost::new();
        let a = anchored(&mut host, Vec3::new(0.0, 0.0, -4.0), 1);
        let b = anchored(&mut host, Vec3::new(0.5, 0.0, -4.0), 2);
        let c = anchored(&mut host, Vec3::new(20.0, 0.0, -4.0), 3);
        assert!(host.overlaps_other(&a));
        assert!(host.overlaps_other(&b));
        assert!(!host.overlaps_other(&c));
    }
}
