//! GeoEdge - cloud-free satellite composites rendered as map tiles
//!
//! Given a region, a date window, a sensor (Landsat 8/9 or Sentinel-2) and a
//! band selection, GeoEdge builds a cloud-masked median composite, stretches
//! each band between its 2nd and 98th percentile, and asks a raster engine to
//! render the result as an XYZ tile layer.
//!
//! # High-Level API
//!
//! The [`service`] module wires everything together:
//!
//! ```ignore
//! use geoedge::engine::{AsyncReqwestClient, HttpEngine};
//! use geoedge::service::{CompositeService, PipelineConfig};
//!
//! let engine = HttpEngine::new(AsyncReqwestClient::with_timeout(120)?, url);
//! let service = CompositeService::new(engine, PipelineConfig::default(), logger);
//! let response = service.handle(&request).await;
//! ```
//!
//! All imagery work happens inside a [`engine::RasterEngine`]; the rest of
//! the crate only builds lazy expressions for it.

pub mod composite;
pub mod config;
pub mod date;
pub mod engine;
pub mod geometry;
pub mod log;
pub mod logging;
pub mod satellite;
pub mod service;

/// Version of the GeoEdge library and CLI.
///
/// Synchronized across the workspace from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
