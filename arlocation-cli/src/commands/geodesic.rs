//! `geodesic` and `destination` commands.

use arlocation::geodesy::{GeoPoint, GeodesicModel};
use clap::Args;

use super::common::{parse_geo_point, ModelArg};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct GeodesicArgs {
    /// Start point as LAT,LON
    #[arg(value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub from: GeoPoint,

    /// End point as LAT,LON
    #[arg(value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub to: GeoPoint,

    /// Geodesic model
    #[arg(long, value_enum, default_value_t = ModelArg::Ellipsoidal)]
    pub model: ModelArg,
}

#[derive(Debug, Args)]
pub struct DestinationArgs {
    /// Start point as LAT,LON
    #[arg(value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub start: GeoPoint,

    /// Initial azimuth in degrees clockwise from north
    #[arg(long, allow_hyphen_values = true)]
    pub azimuth: f64,

    /// Distance in meters
    #[arg(long)]
    pub distance: f64,

    /// Geodesic model
    #[arg(long, value_enum, default_value_t = ModelArg::Ellipsoidal)]
    pub model: ModelArg,
}

pub fn run_geodesic(args: GeodesicArgs) -> Result<(), CliError> {
    let model = GeodesicModel::from(args.model);
    let curve = model.geodesic(args.from, args.to);

    println!("Model:    {}", model);
    println!("From:     {}", args.from);
    println!("To:       {}", args.to);
    println!("Distance: {:.3} m", curve.distance_m);
    println!("Azimuth:  {:.4}°", curve.azimuth_deg);
    Ok(())
}

pub fn run_destination(args: DestinationArgs) -> Result<(), CliError> {
    if !args.distance.is_finite() || args.distance < 0.0 {
        return Err(CliError::Config(format!(
            "Distance must be a non-negative number, got {}",
            args.distance
        )));
    }
    let model = GeodesicModel::from(args.model);
    let end = model.destination(args.start, args.azimuth, args.distance);

    println!("Model:       {}", model);
    println!("Start:       {}", args.start);
    println!("Destination: {}", end);
    Ok(())
}
