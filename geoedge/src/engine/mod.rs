//! Raster engines and the lazy expressions they evaluate.
//!
//! The pipeline only ever builds [`CollectionExpr`] / [`ImageExpr`] graphs.
//! Pixels are touched inside a [`RasterEngine`]:
//!
//! * [`LocalEngine`] evaluates graphs against an in-memory scene catalog
//! * [`HttpEngine`] posts them to a remote computation service
//! * [`TimeoutEngine`] bounds the time either one may take

mod expr;
mod http;
pub mod local;
mod timeout;
mod types;

pub use expr::{CollectionExpr, ImageExpr, ImageFunction, Reducer};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpEngine};
pub use local::LocalEngine;
pub use timeout::TimeoutEngine;
pub use types::{
    EngineError, MapTile, PercentileRequest, PercentileStats, RasterEngine, RenderOptions,
};
