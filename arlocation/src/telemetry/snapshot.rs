use std::fmt;

use serde::Serialize;

/// Point-in-time copy of [`SceneMetrics`](super::SceneMetrics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub frames: u64,
    pub refreshes: u64,
    pub markers_evaluated: u64,
    pub anchors_created: u64,
    pub anchors_detached: u64,
    pub anchor_failures: u64,
    pub out_of_range: u64,
    pub sensor_events: u64,
}

impl TelemetrySnapshot {
    /// Anchors currently alive according to the counters.
    pub fn live_anchors(&self) -> u64 {
        self.anchors_created.saturating_sub(self.anchors_detached)
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames:             {}", self.frames)?;
        writeln!(f, "Refreshes:          {}", self.refreshes)?;
        writeln!(f, "Markers evaluated:  {}", self.markers_evaluated)?;
        writeln!(
            f,
            "Anchors:            {} created, {} detached, {} live",
            self.anchors_created,
            self.anchors_detached,
            self.live_anchors()
        )?;
        writeln!(f, "Anchor failures:    {}", self.anchor_failures)?;
        writeln!(f, "Out of range:       {}", self.out_of_range)?;
        write!(f, "Sensor events:      {}", self.sensor_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_anchors_saturates() {
        let snapshot = TelemetrySnapshot {
            anchors_created: 1,
            anchors_detached: 3,
            ..Default::default()
        };
        assert_eq!(snapshot.live_anchors(), 0);
    }

    #[test]
    fn test_display_lists_anchor_totals() {
        let snapshot = TelemetrySnapshot {
            anchors_created: 5,
            anchors_detached: 2,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("5 created, 2 detached, 3 live"));
    }
}
