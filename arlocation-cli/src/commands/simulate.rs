//! `simulate` command: replay a JSON scenario against the in-memory host.
//!
//! A scenario lists settings, markers, and a sequence of steps:
//!
//! ```json
//! {
//!   "settings": { "scene.max_render_distance_m": "40" },
//!   "markers": [
//!     { "latitude": 48.0002, "longitude": 2.0, "placement": "dynamic" }
//!   ],
//!   "steps": [
//!     { "location": { "latitude": 48.0, "longitude": 2.0 } },
//!     { "bearing": 0.0 },
//!     { "frame": { "tracking": "tracking" } },
//!     "refresh"
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arlocation::config::{ConfigKey, SceneConfig};
use arlocation::host::{HeadlessHost, Pose, RenderableId, TrackingState};
use arlocation::marker::ScaleRange;
use arlocation::telemetry::TelemetrySnapshot;
use arlocation::{
    FrameInput, FrameReport, GeoPoint, LocationScene, Marker, MarkerId, PlacementType,
    RotationMode, ScalingMode,
};
use clap::Args;
use glam::{Quat, Vec3};
use serde::Deserialize;
use tracing::{debug, info};

use super::config::load_config;
use crate::error::CliError;

/// Frame spacing when a step gives no explicit timestamp.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Base configuration file; built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit one JSON object per frame instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    /// `section.key` overrides applied on top of the base configuration.
    #[serde(default)]
    settings: BTreeMap<String, String>,
    #[serde(default)]
    markers: Vec<MarkerSpec>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkerSpec {
    latitude: f64,
    longitude: f64,
    /// Defaults to the marker's index in the scenario.
    renderable: Option<u64>,
    #[serde(default)]
    height_m: f32,
    max_render_range_m: Option<f64>,
    #[serde(default)]
    placement: PlacementType,
    #[serde(default)]
    scaling: ScalingMode,
    #[serde(default)]
    rotation: RotationMode,
    scale_modifier: Option<f32>,
    scale_range: Option<ScaleRange>,
}

impl MarkerSpec {
    fn to_marker(&self, index: usize) -> Marker {
        let renderable = RenderableId(self.renderable.unwrap_or(index as u64));
        let mut marker = Marker::new(GeoPoint::new(self.latitude, self.longitude), renderable)
            .with_height(self.height_m)
            .with_placement(self.placement)
            .with_scaling(self.scaling)
            .with_rotation(self.rotation);
        if let Some(range) = self.max_render_range_m {
            marker = marker.with_max_render_range(range);
        }
        if let Some(modifier) = self.scale_modifier {
            marker = marker.with_scale_modifier(modifier);
        }
        if let Some(range) = self.scale_range {
            marker = marker.with_scale_range(range.min_scale, range.max_scale);
        }
        marker
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum Step {
    Location(GeoPoint),
    Bearing(f32),
    Frame(FrameStep),
    Refresh,
    /// Index into the scenario's marker list.
    RefreshMarker(usize),
    RemoveMarker(usize),
    BearingAdjustment(f32),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameStep {
    #[serde(default = "default_tracking")]
    tracking: TrackingState,
    /// Camera position in scene space.
    #[serde(default)]
    camera: [f32; 3],
    /// Camera rotation about +Y, counterclockwise seen from above.
    #[serde(default)]
    yaw_deg: f32,
    /// Milliseconds since the start of the run.
    at_ms: Option<u64>,
    #[serde(default)]
    display_height_offset: f32,
}

fn default_tracking() -> TrackingState {
    TrackingState::Tracking
}

/// Everything a scenario run produced.
#[derive(Debug)]
struct Outcome {
    reports: Vec<FrameReport>,
    telemetry: TelemetrySnapshot,
    live_anchors: usize,
}

fn load_scenario(path: &Path) -> Result<Scenario, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ScenarioParse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_settings(
    config: &mut SceneConfig,
    settings: &BTreeMap<String, String>,
) -> Result<(), CliError> {
    for (key, value) in settings {
        let config_key: ConfigKey = key.parse()?;
        config_key.set(config, value)?;
    }
    config.validate()?;
    Ok(())
}

fn marker_at(ids: &[Option<MarkerId>], index: usize, step: usize) -> Result<MarkerId, CliError> {
    ids.get(index)
        .copied()
        .flatten()
        .ok_or_else(|| CliError::ScenarioStep {
            step,
            reason: format!("no live marker at index {}", index),
        })
}

fn run_scenario(scenario: &Scenario, config: SceneConfig) -> Result<Outcome, CliError> {
    let mut scene = LocationScene::with_config(HeadlessHost::new(), config)?;

    let mut ids = Vec::with_capacity(scenario.markers.len());
    for (index, marker_spec) in scenario.markers.iter().enumerate() {
        ids.push(Some(scene.add_marker(marker_spec.to_marker(index))?));
    }
    info!(
        markers = ids.len(),
        steps = scenario.steps.len(),
        "Running scenario"
    );

    let start = Instant::now();
    let mut clock = start;
    let mut reports = Vec::new();

    for (step_no, step) in scenario.steps.iter().enumerate() {
        debug!(step = step_no, ?step, "Applying step");
        match step {
            Step::Location(point) => scene.on_location_changed(*point),
            Step::Bearing(degrees) => scene.on_bearing_changed(*degrees),
            Step::Frame(frame) => {
                clock = match frame.at_ms {
                    Some(ms) => start + Duration::from_millis(ms),
                    None => clock + FRAME_INTERVAL,
                };
                let pose = Pose::new(
                    Vec3::from(frame.camera),
                    Quat::from_rotation_y(frame.yaw_deg.to_radians()),
                );
                let input = FrameInput::new(frame.tracking, pose)
                    .with_display_height_offset(frame.display_height_offset)
                    .at(clock);
                reports.push(scene.on_frame_update(input)?);
            }
            Step::Refresh => scene.refresh_scene(),
            Step::RefreshMarker(index) => {
                let id = marker_at(&ids, *index, step_no)?;
                scene.refresh_marker(id)?;
            }
            Step::RemoveMarker(index) => {
                let id = marker_at(&ids, *index, step_no)?;
                scene.remove_marker(id);
                ids[*index] = None;
            }
            Step::BearingAdjustment(degrees) => scene.set_bearing_adjustment(*degrees)?,
        }
    }

    Ok(Outcome {
        reports,
        telemetry: scene.metrics().snapshot(),
        live_anchors: scene.host().live_anchor_count(),
    })
}

fn print_report(index: usize, report: &FrameReport) {
    println!(
        "frame {:>3}: {:<8} ready={} refreshed={} placed={} visible={}/{}",
        index,
        report.tracking_state,
        report.ready,
        report.refreshed,
        report.anchors_placed,
        report.visible().count(),
        report.markers.len()
    );
    for m in &report.markers {
        let distance = m
            .distance_m
            .map(|d| format!("{:.1} m", d))
            .unwrap_or_else(|| "-".to_string());
        let position = m
            .position
            .map(|p| format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z))
            .unwrap_or_else(|| "-".to_string());
        let scale = m
            .scale
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "    marker {:<4} {:<10} {:>10}  pos {}  scale {}",
            m.id, m.status, distance, position, scale
        );
    }
}

pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let scenario = load_scenario(&args.scenario)?;
    let mut config = match args.config.as_deref() {
        Some(path) => load_config(Some(path))?,
        None => SceneConfig::default(),
    };
    apply_settings(&mut config, &scenario.settings)?;

    let outcome = run_scenario(&scenario, config)?;

    if args.json {
        for report in &outcome.reports {
            println!("{}", serde_json::to_string(report)?);
        }
        println!("{}", serde_json::to_string(&outcome.telemetry)?);
    } else {
        for (index, report) in outcome.reports.iter().enumerate() {
            print_report(index, report);
        }
        println!();
        println!("{}", outcome.telemetry);
        println!("Host anchors alive: {}", outcome.live_anchors);
    }
    Ok(())
}
