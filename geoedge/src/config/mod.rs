//! Configuration for GeoEdge.
//!
//! User settings live in `~/.geoedge/config.ini`. A missing file means
//! defaults; present keys overlay the defaults section by section.
//!
//! ```
//! use geoedge::config::{ConfigFile, DEFAULT_ENGINE_TIMEOUT_SECS};
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.engine.timeout, DEFAULT_ENGINE_TIMEOUT_SECS);
//! assert_eq!(config.stretch.low_percentile, 2);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use writer::to_config_string;
pub use settings::{ConfigFile, EngineSettings, LoggingSettings, RegionSettings, StretchSettings};
