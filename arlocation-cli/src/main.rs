//! ARLocation CLI - headless driver for the projection engine
//!
//! Exposes the geodesy, projection, and scaling calculations on the command
//! line, manages the configuration file, and replays scenario files against
//! the in-memory host.

mod commands;
mod error;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "arlocation", version, about = "Geo-anchored AR marker engine")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Distance and initial azimuth between two points
    Geodesic(commands::geodesic::GeodesicArgs),

    /// Point reached from a start along an azimuth
    Destination(commands::geodesic::DestinationArgs),

    /// Camera-relative placement of a target
    Project(commands::project::ProjectArgs),

    /// Scale factors at a distance
    Scale(commands::project::ScaleArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },

    /// Replay a scenario file against the in-memory host
    Simulate(commands::simulate::SimulateArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "arlocation=debug,info",
        _ => "arlocation=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Geodesic(args) => commands::geodesic::run_geodesic(args),
        Commands::Destination(args) => commands::geodesic::run_destination(args),
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Scale(args) => commands::project::run_scale(args),
        Commands::Config { command } => commands::config::run(command),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
