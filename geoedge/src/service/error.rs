//! Pipeline error type.

use thiserror::Error;

use crate::composite::StretchError;
use crate::date::DateRangeError;
use crate::engine::EngineError;
use crate::geometry::GeometryError;
use crate::satellite::{UnsupportedBand, UnsupportedSatellite};

/// Everything that can end a composite request.
///
/// Validation failures are detected locally before any engine call. Engine
/// failures carry the engine's own message. No partial composite is ever
/// produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("{0}")]
    UnsupportedSatellite(#[from] UnsupportedSatellite),

    #[error("{0}")]
    UnsupportedBand(#[from] UnsupportedBand),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    #[error("Invalid region: {0}")]
    InvalidRegion(#[from] GeometryError),

    #[error("Cannot stretch band '{band}': {reason}")]
    DegenerateBand { band: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine failure: {0}")]
    EngineFailure(EngineError),

    #[error("Engine timeout: {0}")]
    EngineTimeout(EngineError),
}

impl PipelineError {
    /// Only timeouts may succeed when retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::EngineTimeout(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedSatellite(_) => "unsupported_satellite",
            PipelineError::UnsupportedBand(_) => "unsupported_band",
            PipelineError::InvalidDateRange(_) => "invalid_date_range",
            PipelineError::InvalidRegion(_) => "invalid_region",
            PipelineError::DegenerateBand { .. } => "degenerate_band",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::EngineFailure(_) => "engine_failure",
            PipelineError::EngineTimeout(_) => "engine_timeout",
        }
    }
}

impl From<EngineError> for PipelineError {
    fn from(e: EngineError) -> Self {
        if e.is_timeout() {
            PipelineError::EngineTimeout(e)
        } else {
            PipelineError::EngineFailure(e)
        }
    }
}

impl From<StretchError> for PipelineError {
    fn from(e: StretchError) -> Self {
        match e {
            StretchError::Engine(e) => e.into(),
            StretchError::NoValidPixels { band } => PipelineError::DegenerateBand {
                band,
                reason: "no valid pixels in the region".to_string(),
            },
        }
    }
}
