//! Composite service: request validation, pipeline orchestration and the
//! request/response documents.
//!
//! ```no_run
//! use geoedge::engine::{AsyncReqwestClient, HttpEngine};
//! use geoedge::log::TracingLogger;
//! use geoedge::service::{CompositeRequest, CompositeService, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn example(request: CompositeRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = HttpEngine::new(AsyncReqwestClient::with_timeout(120)?, "http://localhost:8080");
//! let service = CompositeService::new(engine, PipelineConfig::default(), Arc::new(TracingLogger));
//! let response = service.handle(&request).await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod orchestrator;
mod request;
mod visualization;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::{CompositeOutput, CompositeService, ValidatedRequest};
pub use request::{CompositeRequest, CompositeResponse, STATUS_NOT_FOUND, STATUS_OK};
pub use visualization::{NameList, OneOrMany, VisualizationConfig};
