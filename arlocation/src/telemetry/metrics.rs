//! Lock-free scene counters.
//!
//! All updates use relaxed atomics; a snapshot may observe counters from
//! slightly different instants.

use std::sync::atomic::{AtomicU64, Ordering};

use super::TelemetrySnapshot;

/// Atomic counters updated by the scene.
///
/// Shared behind an `Arc` so observers on other threads can snapshot while
/// the frame thread records.
#[derive(Debug, Default)]
pub struct SceneMetrics {
    frames: AtomicU64,
    refreshes: AtomicU64,
    markers_evaluated: AtomicU64,
    anchors_created: AtomicU64,
    anchors_detached: AtomicU64,
    anchor_failures: AtomicU64,
    out_of_range: AtomicU64,
    sensor_events: AtomicU64,
}

impl SceneMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_processed(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_executed(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn marker_evaluated(&self) {
        self.markers_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anchor_created(&self) {
        self.anchors_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anchor_detached(&self) {
        self.anchors_detached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anchor_failed(&self) {
        self.anchor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn marker_out_of_range(&self) {
        self.out_of_range.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sensor_event_received(&self) {
        self.sensor_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            markers_evaluated: self.markers_evaluated.load(Ordering::Relaxed),
            anchors_created: self.anchors_created.load(Ordering::Relaxed),
            anchors_detached: self.anchors_detached.load(Ordering::Relaxed),
            anchor_failures: self.anchor_failures.load(Ordering::Relaxed),
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
            sensor_events: self.sensor_events.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_metrics_start_at_zero() {
        let metrics = SceneMetrics::new();
        assert_eq!(metrics.snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn test_counters_increment_independently() {
        let metrics = SceneMetrics::new();
        metrics.anchor_created();
        metrics.anchor_created();
        metrics.anchor_detached();
        metrics.anchor_failed();
        metrics.marker_out_of_range();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.anchors_created, 2);
        assert_eq!(snapshot.anchors_detached, 1);
        assert_eq!(snapshot.anchor_failures, 1);
        assert_eq!(snapshot.out_of_range, 1);
        assert_eq!(snapshot.frames, 0);
    }

    #[test]
    fn test_thread_safe_counting() {
        use std::thread;

        let metrics = Arc::new(SceneMetrics::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.sensor_event_received();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().sensor_events, 800);
    }
}
