//! ARLocation - geo-anchored markers for AR scenes
//!
//! This library places markers given by latitude/longitude into the scene
//! of a host AR runtime. It computes geodesics between the observer and
//! each marker, projects them into camera-relative offsets, manages one
//! anchor per visible marker, and rewrites per-frame scale and rotation.
//!
//! The host runtime is reached only through [`host::ArHost`]; rendering,
//! tracking, and hit testing stay on the host side.
//!
//! # Modules
//!
//! - [`geodesy`]: WGS84 (Vincenty) and spherical geodesics
//! - [`projection`]: distance/azimuth to Cartesian offsets
//! - [`marker`]: marker definition and rendering options
//! - [`scaling`]: per-frame scale and rotation laws
//! - [`scene`]: marker registry, refresh scheduling, anchor lifecycle
//! - [`host`]: host interface and an in-memory host
//! - [`sensor`]: thread-safe sensor input
//! - [`config`]: scene settings and INI persistence
//! - [`telemetry`]: counters for observability

pub mod config;
pub mod error;
pub mod geodesy;
pub mod host;
pub mod marker;
pub mod projection;
pub mod scaling;
pub mod scene;
pub mod sensor;
pub mod telemetry;

pub use error::{SceneError, SceneResult};
pub use geodesy::{GeoPoint, GeodesicModel, GeodesicResult};
pub use marker::{Marker, MarkerId, PlacementType, RotationMode, ScalingMode};
pub use scene::{FrameInput, FrameReport, LocationScene};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
