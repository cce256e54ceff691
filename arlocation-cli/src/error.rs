//! CLI error type.

use std::path::PathBuf;

use arlocation::config::ConfigError;
use arlocation::SceneError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Failed to read scenario {path}: {source}")]
    ScenarioRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario {path}: {source}")]
    ScenarioParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scenario step {step}: {reason}")]
    ScenarioStep { step: usize, reason: String },

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to write to stdout: {0}")]
    Stdout(#[from] std::io::Error),
}
