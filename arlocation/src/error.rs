//! Error types for scene operations.

use thiserror::Error;

use crate::geodesy::GeoPoint;
use crate::host::{HostError, RenderableId};
use crate::marker::MarkerId;

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors surfaced by [`LocationScene`](crate::scene::LocationScene).
///
/// Transient host failures (lost tracking, anchor creation refused) are
/// handled inside the scene by skipping the affected marker for a tick; they
/// only appear here when wrapped by a caller-facing operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    /// The marker id was never registered, or has already been removed.
    #[error("Marker {0} is not registered with this scene")]
    UnregisteredMarker(MarkerId),

    /// Custom scaling was selected but no scale function was provided.
    #[error("Marker for renderable {renderable} uses custom scaling without a scale function")]
    MissingCustomScale { renderable: RenderableId },

    /// Marker position is outside valid WGS84 ranges.
    #[error("Invalid marker position {0}")]
    InvalidPosition(GeoPoint),

    /// A marker setting holds a value that can never be rendered.
    #[error("Invalid marker setting '{field}': {reason}")]
    InvalidMarker { field: &'static str, reason: String },

    /// Host-side failure.
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_marker_display() {
        let err = SceneError::UnregisteredMarker(MarkerId::from_raw(7));
        assert_eq!(err.to_string(), "Marker #7 is not registered with this scene");
    }

    #[test]
    fn test_missing_custom_scale_display() {
        let err = SceneError::MissingCustomScale {
            renderable: RenderableId(3),
        };
        assert_eq!(
            err.to_string(),
            "Marker for renderable renderable:3 uses custom scaling without a scale function"
        );
    }

    #[test]
    fn test_from_host_error() {
        let err: SceneError = HostError::NotTracking.into();
        assert!(matches!(err, SceneError::Host(HostError::NotTracking)));
    }
}
