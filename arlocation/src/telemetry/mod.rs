//! Scene telemetry for observability.
//!
//! Lock-free counters the scene bumps as it works, and a point-in-time
//! snapshot for display.
//!
//! ```text
//! LocationScene ─────► SceneMetrics ─────► TelemetrySnapshot ─────► Views
//!                      (atomic counters)   (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use arlocation::telemetry::SceneMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(SceneMetrics::new());
//! metrics.frame_processed();
//! metrics.anchor_created();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.frames, 1);
//! assert_eq!(snapshot.anchors_created, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SceneMetrics;
pub use snapshot::TelemetrySnapshot;
