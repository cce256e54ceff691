//! Single-writer boundary for asynchronous sensor input.
//!
//! Location and orientation providers usually call back on their own
//! threads. They push [`SensorEvent`]s through a [`SensorSender`]; the scene
//! drains the queue at the start of each frame, so scene state is only ever
//! mutated from the frame thread.
//!
//! Sending never blocks and needs no async runtime. The queue is bounded:
//! readings sent while it is full are dropped, and malformed readings are
//! rejected before they are queued.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use crate::geodesy::GeoPoint;

/// Readings held between two frames before new ones are dropped.
pub const SENSOR_QUEUE_CAPACITY: usize = 256;

/// Sensor reading destined for the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// New observer position.
    Location(GeoPoint),
    /// New compass heading in degrees.
    Bearing(f32),
}

impl SensorEvent {
    /// Finite values, with positions inside the WGS84 coordinate ranges.
    pub fn is_valid(&self) -> bool {
        match self {
            SensorEvent::Location(point) => point.is_valid(),
            SensorEvent::Bearing(degrees) => degrees.is_finite(),
        }
    }
}

/// Cloneable handle for pushing sensor readings from any thread.
#[derive(Debug, Clone)]
pub struct SensorSender {
    tx: mpsc::Sender<SensorEvent>,
}

impl SensorSender {
    /// Queue a location update. Returns `false` if it was not queued.
    pub fn send_location(&self, location: GeoPoint) -> bool {
        self.send(SensorEvent::Location(location))
    }

    /// Queue a bearing update. Returns `false` if it was not queued.
    pub fn send_bearing(&self, bearing_deg: f32) -> bool {
        self.send(SensorEvent::Bearing(bearing_deg))
    }

    /// Queue `event`. Invalid readings, a full queue, and a dropped scene
    /// all return `false`.
    pub fn send(&self, event: SensorEvent) -> bool {
        if !event.is_valid() {
            warn!(?event, "Rejected malformed sensor reading");
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "Sensor queue full, reading dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Receiving end owned by the scene.
#[derive(Debug)]
pub(crate) struct SensorInbox {
    tx: mpsc::Sender<SensorEvent>,
    rx: mpsc::Receiver<SensorEvent>,
}

impl SensorInbox {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel(SENSOR_QUEUE_CAPACITY);
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> SensorSender {
        SensorSender {
            tx: self.tx.clone(),
        }
    }

    /// Take every queued event, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<SensorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        if !events.is_empty() {
            trace!(count = events.len(), "Drained sensor events");
        }
        events
    }
}
