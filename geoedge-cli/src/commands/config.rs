//! Configuration management CLI commands.

use clap::Subcommand;
use geoedge::config::{config_file_path, to_config_string, ConfigFile};
use std::path::Path;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file if none exists
    Init,

    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values plus environment)
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init => run_init(config_path),
        ConfigCommands::Path => run_path(config_path),
        ConfigCommands::Show => run_show(config_path),
    }
}

fn run_init(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                ConfigFile::default().save_to(path)?;
            }
            path.to_path_buf()
        }
        None => ConfigFile::ensure_exists()?,
    };
    println!("Configuration file: {}", path.display());
    Ok(())
}

fn run_path(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path.map_or_else(config_file_path, Path::to_path_buf);
    println!("{}", path.display());
    Ok(())
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    }
    .with_env_overrides();

    print!("{}", render(&config));
    Ok(())
}

/// Effective configuration as INI, with the access token masked.
fn render(config: &ConfigFile) -> String {
    let mut shown = config.clone();
    if shown.engine.access_token.is_some() {
        shown.engine.access_token = Some("********".to_string());
    }
    to_config_string(&shown)
}
