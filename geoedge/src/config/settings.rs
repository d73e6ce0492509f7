//! Settings structs, one per INI section.

use std::path::PathBuf;

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub engine: EngineSettings,
    pub region: RegionSettings,
    pub stretch: StretchSettings,
    pub logging: LoggingSettings,
}

/// `[engine]` - remote raster computation service.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Base URL of the computation service.
    pub url: String,
    /// Bearer token obtained by the external session bootstrap.
    pub access_token: Option<String>,
    /// Deadline in seconds for each materializing engine call.
    pub timeout: u64,
}

/// `[region]`
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSettings {
    /// Error margin in meters applied when deriving the filter bounds.
    pub error_margin: f64,
}

/// `[stretch]` - percentile stretch parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchSettings {
    pub low_percentile: u8,
    pub high_percentile: u8,
    /// Sampling resolution in meters per pixel.
    pub scale: f64,
    /// Upper bound on pixels considered by one reduction.
    pub max_pixels: u64,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
