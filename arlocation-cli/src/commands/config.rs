//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list`, `config show`, and
//! `config path` read and modify the scene configuration file.

use std::path::{Path, PathBuf};

use arlocation::config::{config_file_path, ConfigKey, SceneConfig};
use clap::Subcommand;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., scene.max_render_distance_m)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., scene.max_render_distance_m)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Print the effective configuration as INI
    Show {
        /// Read this file instead of the default location
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Show { file } => run_show(file.as_deref()),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'arlocation config list' to see available keys.",
            key
        ))
    })
}

/// Load a config file, or the default one.
pub fn load_config(file: Option<&Path>) -> Result<SceneConfig, CliError> {
    let config = match file {
        Some(path) => SceneConfig::load_from(path)?,
        None => SceneConfig::load()?,
    };
    Ok(config)
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load_config(None)?;
    println!("{}", config_key.get(&config));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let mut config = load_config(None)?;
    config_key.set(&mut config, value)?;
    config.validate()?;
    config.save()?;

    println!("Set {} = {}", config_key, value);
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = load_config(None)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for key in ConfigKey::ALL {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }
        println!("  {} = {}", key.name(), key.get(&config));
    }

    Ok(())
}

fn run_show(file: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(file)?;
    config.write_ini(&mut std::io::stdout().lock())?;
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_accepts_section_dot_name() {
        assert_eq!(
            parse_key("scene.max_render_distance_m").unwrap(),
            ConfigKey::MaxRenderDistance
        );
        assert!(matches!(parse_key("max_render_distance_m"), Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[scene]\nmax_render_distance_m = 45\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.max_render_distance_m, 45.0);
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.ini")));
        assert!(matches!(result, Err(CliError::ConfigFile(_))));
    }
}
