//! Default values and the `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Base URL of a computation service running next to the CLI.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8080";

/// Deadline for one percentile reduction or tile materialization.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 120;

/// Simplification tolerance used when bounding the region for filtering.
pub const DEFAULT_ERROR_MARGIN_METERS: f64 = 1e4;

pub const DEFAULT_LOW_PERCENTILE: u8 = 2;
pub const DEFAULT_HIGH_PERCENTILE: u8 = 98;

/// Meters per pixel at which stretch statistics are sampled.
pub const DEFAULT_STRETCH_SCALE: f64 = 30.0;

/// Pixel budget for stretch statistics.
pub const DEFAULT_MAX_PIXELS: u64 = 10_000_000_000_000;

/// Environment variable that overrides `[engine] access_token`.
pub const ACCESS_TOKEN_ENV: &str = "GEOEDGE_ACCESS_TOKEN";

/// Default log file path (`~/.geoedge/logs/geoedge.log`).
pub fn default_log_path() -> PathBuf {
    config_directory()
        .join("logs")
        .join(crate::logging::default_log_file())
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            engine: EngineSettings {
                url: DEFAULT_ENGINE_URL.to_string(),
                access_token: None,
                timeout: DEFAULT_ENGINE_TIMEOUT_SECS,
            },
            region: RegionSettings {
                error_margin: DEFAULT_ERROR_MARGIN_METERS,
            },
            stretch: StretchSettings {
                low_percentile: DEFAULT_LOW_PERCENTILE,
                high_percentile: DEFAULT_HIGH_PERCENTILE,
                scale: DEFAULT_STRETCH_SCALE,
                max_pixels: DEFAULT_MAX_PIXELS,
            },
            logging: LoggingSettings {
                file: default_log_path(),
            },
        }
    }
}
