//! Refresh scheduling.
//!
//! Triggers only *request* a refresh. Requests are coalesced and executed by
//! the next frame that is ready (tracking, with location and bearing known).
//!
//! ```text
//!   first location / first bearing ──┐
//!   moved > threshold ───────────────┤
//!   tracking state changed ──────────┼──► pending ──(ready frame)──► take()
//!   timer elapsed ───────────────────┤
//!   refresh_scene / refresh_marker ──┘
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

use crate::geodesy::{GeoPoint, GeodesicModel};
use crate::host::TrackingState;
use crate::marker::MarkerId;

/// Why a refresh was requested. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshReason {
    /// First location or bearing reading.
    Bootstrap,
    /// Observer moved beyond the threshold.
    Moved { distance_m: f64 },
    /// Camera tracking state changed.
    TrackingChanged {
        from: Option<TrackingState>,
        to: TrackingState,
    },
    /// Safety-net timer elapsed.
    Timer,
    /// Requested by the caller.
    Manual,
    /// Bearing calibration changed.
    Calibration,
}

/// A coalesced set of pending work.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefreshRequest {
    /// Every marker is re-evaluated. `Some(true)` also re-anchors static
    /// markers that are already rendered.
    pub all: Option<bool>,
    /// Markers that must be re-anchored regardless of state.
    pub markers: Vec<MarkerId>,
}

impl RefreshRequest {
    /// Whether `id` is covered, and whether it must be re-anchored.
    pub fn covers(&self, id: MarkerId) -> Option<bool> {
        let forced = self.markers.contains(&id);
        match self.all {
            Some(force_all) => Some(force_all || forced),
            None if forced => Some(true),
            None => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.all.is_none() && self.markers.is_empty()
    }
}

/// Periodic safety-net timer, polled with the frame clock.
#[derive(Debug, Clone)]
pub struct RefreshTimer {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl RefreshTimer {
    /// `None` disables the timer.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Change the interval; the next period starts at the next poll.
    pub fn set_interval(&mut self, interval: Option<Duration>) {
        self.interval = interval;
        self.next_due = None;
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Returns `true` once per elapsed interval. The first poll arms the
    /// timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        match self.next_due {
            None => {
                self.next_due = Some(now + interval);
                false
            }
            Some(due) if now >= due => {
                self.next_due = Some(now + interval);
                true
            }
            Some(_) => false,
        }
    }
}

/// Decides when anchors need re-evaluation.
#[derive(Debug)]
pub struct RefreshScheduler {
    pending: RefreshRequest,
    threshold_m: f64,
    timer: RefreshTimer,
}

impl RefreshScheduler {
    pub fn new(threshold_m: f64, interval: Option<Duration>) -> Self {
        Self {
            pending: RefreshRequest::default(),
            threshold_m,
            timer: RefreshTimer::new(interval),
        }
    }

    pub fn set_threshold(&mut self, threshold_m: f64) {
        self.threshold_m = threshold_m;
    }

    pub fn set_interval(&mut self, interval: Option<Duration>) {
        self.timer.set_interval(interval);
    }

    /// Request re-evaluation of every marker.
    pub fn request_all(&mut self, reason: RefreshReason, force: bool) {
        debug!(?reason, force, "Scene refresh requested");
        let force = force || self.pending.all == Some(true);
        self.pending.all = Some(force);
    }

    /// Request re-anchoring of one marker.
    pub fn request_marker(&mut self, id: MarkerId) {
        if !self.pending.markers.contains(&id) {
            debug!(marker = %id, "Marker refresh requested");
            self.pending.markers.push(id);
        }
    }

    /// Drop a pending single-marker request.
    pub fn forget_marker(&mut self, id: MarkerId) {
        self.pending.markers.retain(|m| *m != id);
    }

    /// Location update. Returns `true` if it requested a refresh.
    pub fn on_location(
        &mut self,
        previous: Option<GeoPoint>,
        current: GeoPoint,
        model: GeodesicModel,
    ) -> bool {
        let Some(previous) = previous else {
            self.request_all(RefreshReason::Bootstrap, false);
            return true;
        };
        let distance_m = model.geodesic(previous, current).distance_m;
        if distance_m > self.threshold_m {
            self.request_all(RefreshReason::Moved { distance_m }, false);
            true
        } else {
            false
        }
    }

    /// Bearing update. Only the first reading requests a refresh.
    pub fn on_bearing(&mut self, previous: Option<f32>) -> bool {
        if previous.is_none() {
            self.request_all(RefreshReason::Bootstrap, false);
            true
        } else {
            false
        }
    }

    /// Tracking update. Every transition requests a refresh.
    pub fn on_tracking(&mut self, previous: Option<TrackingState>, current: TrackingState) -> bool {
        if previous == Some(current) {
            return false;
        }
        tracing::info!(
            from = ?previous,
            to = %current,
            "Tracking state changed"
        );
        self.request_all(
            RefreshReason::TrackingChanged {
                from: previous,
                to: current,
            },
            false,
        );
        true
    }

    /// Poll the safety-net timer.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        if self.timer.poll(now) {
            self.request_all(RefreshReason::Timer, false);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hand over the pending work, leaving nothing pending.
    pub fn take(&mut self) -> Option<RefreshRequest> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
