//! GeoEdge CLI - Command-line interface
//!
//! Builds cloud-free satellite composites and prints the resulting tile
//! response, and manages the GeoEdge configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::composite::CompositeArgs;
use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "geoedge")]
#[command(version = geoedge::VERSION)]
#[command(about = "Cloud-free Landsat and Sentinel-2 composites as map tiles", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.geoedge/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a composite and print {"tile": ...} or {"error": ...}
    Composite(CompositeArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Composite(args) => commands::composite::run(args, config_path, cli.debug),
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_composite_flags() {
        let cli = Cli::try_parse_from([
            "geoedge",
            "composite",
            "--satellite",
            "landsat",
            "--start",
            "2021-01-01",
            "--end",
            "2021-06-01",
            "--region",
            "aoi.geojson",
            "--bands",
            "B4,B3,B2",
            "--max",
            "0.3,0.3,0.4",
            "--debug",
        ])
        .unwrap();

        assert!(cli.debug);
        let Commands::Composite(args) = cli.command else {
            panic!("expected composite command");
        };
        assert_eq!(args.max, vec![0.3, 0.3, 0.4]);
        assert_eq!(args.bands.as_deref(), Some("B4,B3,B2"));
    }

    #[test]
    fn test_request_conflicts_with_flags() {
        let parsed = Cli::try_parse_from([
            "geoedge",
            "composite",
            "--request",
            "req.json",
            "--satellite",
            "landsat",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["geoedge", "--config", "/tmp/g.ini", "config", "path"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/g.ini")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Path
            }
        ));
    }
}
