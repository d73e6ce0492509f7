//! Pipeline configuration.

use std::time::Duration;

use crate::composite::StretchConfig;
use crate::config::{ConfigFile, DEFAULT_ENGINE_TIMEOUT_SECS};
use crate::geometry::{ErrorMargin, GeometryError};

/// Tunables for a [`super::CompositeService`].
///
/// ```
/// use geoedge::service::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::default().with_engine_timeout(Duration::from_secs(30));
/// assert_eq!(config.engine_timeout(), Duration::from_secs(30));
/// assert_eq!(config.stretch().low_percentile, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    error_margin: ErrorMargin,
    stretch: StretchConfig,
    engine_timeout: Duration,
}

impl PipelineConfig {
    /// Build from the user's config file.
    pub fn from_config(config: &ConfigFile) -> Result<Self, GeometryError> {
        Ok(Self {
            error_margin: ErrorMargin::meters(config.region.error_margin)?,
            stretch: StretchConfig::from(&config.stretch),
            engine_timeout: Duration::from_secs(config.engine.timeout),
        })
    }

    pub fn with_error_margin(mut self, margin: ErrorMargin) -> Self {
        self.error_margin = margin;
        self
    }

    pub fn with_stretch(mut self, stretch: StretchConfig) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = timeout;
        self
    }

    pub fn error_margin(&self) -> ErrorMargin {
        self.error_margin
    }

    pub fn stretch(&self) -> &StretchConfig {
        &self.stretch
    }

    /// Deadline applied to each engine call.
    pub fn engine_timeout(&self) -> Duration {
        self.engine_timeout
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            error_margin: ErrorMargin::default(),
            stretch: StretchConfig::default(),
            engine_timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
        }
    }
}
