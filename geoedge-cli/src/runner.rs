//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and service creation
//! so command handlers only deal with their own arguments.

use crate::error::CliError;
use geoedge::config::ConfigFile;
use geoedge::engine::{AsyncReqwestClient, HttpEngine};
use geoedge::log::TracingLogger;
use geoedge::logging::{default_log_file, init_logging, LoggingGuard};
use geoedge::service::{CompositeService, PipelineConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Service type used by the CLI.
pub type HttpCompositeService = CompositeService<HttpEngine<AsyncReqwestClient>>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// Logs go to the configured file only; stdout is reserved for the JSON
    /// response document.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Alternative config file; `~/.geoedge/config.ini` when `None`
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        }
        .with_env_overrides();

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, false, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("GeoEdge v{}", geoedge::VERSION);
        info!("GeoEdge CLI: {} command", command);
    }

    /// Create a composite service talking to `engine_url`, or to the
    /// configured engine when `None`.
    pub fn create_service(&self, engine_url: Option<&str>) -> Result<HttpCompositeService, CliError> {
        let engine_settings = &self.config.engine;
        let url = engine_url.unwrap_or(&engine_settings.url);

        let client =
            AsyncReqwestClient::with_timeout(engine_settings.timeout).map_err(CliError::EngineSetup)?;
        let engine =
            HttpEngine::new(client, url).with_access_token(engine_settings.access_token.clone());

        let pipeline =
            PipelineConfig::from_config(&self.config).map_err(|e| CliError::Config(e.to_string()))?;

        info!(
            url = url,
            authenticated = engine_settings.access_token.is_some(),
            "Composite service created"
        );
        Ok(CompositeService::new(engine, pipeline, Arc::new(TracingLogger)))
    }
}
