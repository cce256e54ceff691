//! `project` and `scale` commands.

use arlocation::config::SceneConfig;
use arlocation::geodesy::{GeoPoint, GeodesicModel};
use arlocation::marker::ScaleRange;
use arlocation::projection::{project, relative_azimuth};
use arlocation::scaling::{gradual_fixed_size_factor, gradual_to_max_render_distance, GradualScaling};
use arlocation::scene::horizon_adjustment;
use clap::Args;

use super::common::{parse_geo_point, ModelArg};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Observer position as LAT,LON
    #[arg(value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub from: GeoPoint,

    /// Target position as LAT,LON
    #[arg(value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub to: GeoPoint,

    /// Observer heading in degrees clockwise from north
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub heading: f32,

    /// Compass calibration offset in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub adjustment: f32,

    /// Marker height above the camera in meters
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub height: f32,

    /// Clamp to the render distance and apply the horizon adjustment
    #[arg(long)]
    pub dynamic: bool,

    /// Render distance for dynamic placement
    #[arg(long)]
    pub max_render_distance: Option<f64>,

    /// Geodesic model
    #[arg(long, value_enum, default_value_t = ModelArg::Ellipsoidal)]
    pub model: ModelArg,
}

#[derive(Debug, Args)]
pub struct ScaleArgs {
    /// Distance from the observer in meters
    pub distance: f64,

    /// Gradual scaling floor
    #[arg(long)]
    pub min_scale: Option<f64>,

    /// Distance below which gradual scaling is 1.0
    #[arg(long)]
    pub min_distance: Option<f64>,

    /// Distance at which gradual scaling reaches its floor
    #[arg(long)]
    pub max_distance: Option<f64>,

    /// Render distance used by the range-based modes
    #[arg(long)]
    pub max_render_distance: Option<f64>,

    /// Lower bound of the scale range
    #[arg(long, default_value_t = ScaleRange::default().min_scale)]
    pub range_min: f32,

    /// Upper bound of the scale range
    #[arg(long, default_value_t = ScaleRange::default().max_scale)]
    pub range_max: f32,
}

/// Placement of one target, as the scene would compute it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    distance_m: f64,
    azimuth_deg: f64,
    relative_azimuth_deg: f32,
    render_distance_m: f64,
    height_m: f64,
    scene: [f64; 3],
}

fn compute_projection(args: &ProjectArgs, config: &SceneConfig) -> Projection {
    let model = GeodesicModel::from(args.model);
    let curve = model.geodesic(args.from, args.to);
    let relative = relative_azimuth(curve.azimuth_deg, args.heading, args.adjustment);

    let (render_distance_m, height_m) = if args.dynamic {
        let render = curve.distance_m.min(config.max_render_distance_m);
        let rise = horizon_adjustment(
            curve.distance_m,
            render,
            config.horizon_rise_per_m,
            config.horizon_cap_m,
        );
        (render, f64::from(args.height) + rise)
    } else {
        (curve.distance_m, f64::from(args.height))
    };

    let offset = project(render_distance_m, relative);
    Projection {
        distance_m: curve.distance_m,
        azimuth_deg: curve.azimuth_deg,
        relative_azimuth_deg: relative,
        render_distance_m,
        height_m,
        scene: [offset.x, height_m, -offset.y],
    }
}

pub fn run_project(args: ProjectArgs) -> Result<(), CliError> {
    let mut config = SceneConfig::default();
    if let Some(distance) = args.max_render_distance {
        config.max_render_distance_m = distance;
    }
    config.validate()?;

    let p = compute_projection(&args, &config);
    println!("Distance:          {:.3} m", p.distance_m);
    println!("Azimuth:           {:.4}°", p.azimuth_deg);
    println!("Relative azimuth:  {:.4}°", p.relative_azimuth_deg);
    if args.dynamic {
        println!("Render distance:   {:.3} m", p.render_distance_m);
    }
    println!("Height:            {:.3} m", p.height_m);
    println!(
        "Scene offset:      ({:.3}, {:.3}, {:.3})",
        p.scene[0], p.scene[1], p.scene[2]
    );
    Ok(())
}

pub fn run_scale(args: ScaleArgs) -> Result<(), CliError> {
    if !args.distance.is_finite() || args.distance < 0.0 {
        return Err(CliError::Config(format!(
            "Distance must be a non-negative number, got {}",
            args.distance
        )));
    }

    let mut config = SceneConfig::default();
    if let Some(v) = args.min_scale {
        config.scaling.min_scale = v;
    }
    if let Some(v) = args.min_distance {
        config.scaling.min_distance_m = v;
    }
    if let Some(v) = args.max_distance {
        config.scaling.max_distance_m = v;
    }
    if let Some(v) = args.max_render_distance {
        config.max_render_distance_m = v;
    }
    config.validate()?;

    let range = ScaleRange {
        min_scale: args.range_min,
        max_scale: args.range_max,
    };
    let gradual: GradualScaling = config.scaling;
    let render = args.distance.min(config.max_render_distance_m);

    println!("Distance:                      {:.3} m", args.distance);
    println!("Render distance:               {:.3} m", render);
    println!("Gradual:                       {:.4}", gradual.factor(args.distance));
    println!(
        "Gradual fixed size:            {:.4}",
        gradual_fixed_size_factor(args.distance, render, range)
    );
    println!(
        "Gradual to max render distance: {:.4}",
        gradual_to_max_render_distance(args.distance, render, config.max_render_distance_m, range)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(to: GeoPoint, dynamic: bool) -> ProjectArgs {
        ProjectArgs {
            from: GeoPoint::new(48.0, 2.0),
            to,
            heading: 0.0,
            adjustment: 0.0,
            height: 1.0,
            dynamic,
            max_render_distance: None,
            model: ModelArg::Ellipsoidal,
        }
    }

    #[test]
    fn test_project_target_north_is_straight_ahead() {
        let to = arlocation::geodesy::destination(GeoPoint::new(48.0, 2.0), 0.0, 20.0);
        let p = compute_projection(&args(to, false), &SceneConfig::default());
        assert!((p.distance_m - 20.0).abs() < 0.01);
        assert!(p.scene[0].abs() < 0.01);
        assert!((p.scene[1] - 1.0).abs() < 1e-9);
        assert!((p.scene[2] + 20.0).abs() < 0.01);
    }

    #[test]
    fn test_project_dynamic_clamps_and_rises() {
        let to = arlocation::geodesy::destination(GeoPoint::new(48.0, 2.0), 90.0, 130.0);
        let p = compute_projection(&args(to, true), &SceneConfig::default());
        assert!((p.render_distance_m - 30.0).abs() < 1e-9);
        // 1.0 + 0.005 * (130 - 30)
        assert!((p.height_m - 1.5).abs() < 0.01);
        assert!((p.scene[0] - 30.0).abs() < 0.01);
        assert!(p.scene[2].abs() < 0.01);
    }

    #[test]
    fn test_scale_rejects_negative_distance() {
        let args = ScaleArgs {
            distance: -1.0,
            min_scale: None,
            min_distance: None,
            max_distance: None,
            max_render_distance: None,
            range_min: 0.8,
            range_max: 1.4,
        };
        assert!(matches!(run_scale(args), Err(CliError::Config(_))));
    }
}
