//! Deadline enforcement around engine calls.

use std::future::Future;
use std::time::Duration;

use super::expr::ImageExpr;
use super::types::{EngineError, MapTile, PercentileRequest, PercentileStats, RenderOptions};
use super::RasterEngine;

/// Wraps an engine so that every materializing call fails with
/// [`EngineError::Timeout`] once `timeout` has elapsed.
#[derive(Debug, Clone)]
pub struct TimeoutEngine<E> {
    inner: E,
    timeout: Duration,
}

impl<E: RasterEngine> TimeoutEngine<E> {
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn with_deadline<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| EngineError::Timeout { operation, after })?
}

impl<E: RasterEngine> RasterEngine for TimeoutEngine<E> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn reduce_percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> Result<PercentileStats, EngineError> {
        with_deadline(
            "reduce_percentiles",
            self.timeout,
            self.inner.reduce_percentiles(image, request),
        )
        .await
    }

    async fn get_map(
        &self,
        image: &ImageExpr,
        options: &RenderOptions,
    ) -> Result<MapTile, EngineError> {
        with_deadline("get_map", self.timeout, self.inner.get_map(image, options)).await
    }
}
