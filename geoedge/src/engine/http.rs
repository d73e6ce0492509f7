//! Remote raster engine reached over HTTP.
//!
//! Expressions are posted as JSON to two endpoints:
//!
//! * `POST {base}/v1/value:compute` returns `{"<band>_p<n>": number|null}`
//! * `POST {base}/v1/maps` returns `{"mapId", "urlFormat", "min", "max"}`

use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::expr::ImageExpr;
use super::types::{EngineError, MapTile, PercentileRequest, PercentileStats, RenderOptions};
use super::RasterEngine;

const COMPUTE_PATH: &str = "/v1/value:compute";
const MAPS_PATH: &str = "/v1/maps";

const USER_AGENT: &str = concat!("geoedge/", env!("CARGO_PKG_VERSION"));

/// Asynchronous HTTP transport used by [`HttpEngine`].
///
/// Abstracted so tests can substitute a canned client.
pub trait AsyncHttpClient: Send + Sync {
    /// POST `json_body` to `url` and return the response body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `json_body` - JSON body as a string
    /// * `bearer_token` - Optional token for the Authorization header
    fn post_json(
        &self,
        url: &str,
        json_body: &str,
        bearer_token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<u8>, EngineError>> + Send;
}

/// [`AsyncHttpClient`] backed by reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl AsyncReqwestClient {
    /// Client whose requests give up after `timeout_secs`.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn post_json(
        &self,
        url: &str,
        json_body: &str,
        bearer_token: Option<&str>,
    ) -> Result<Vec<u8>, EngineError> {
        trace!(url = url, bytes = json_body.len(), "HTTP POST request starting");

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(json_body.to_string());
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                if e.is_timeout() {
                    return Err(EngineError::Timeout {
                        operation: "HTTP request",
                        after: self.timeout,
                    });
                }
                return Err(EngineError::Request(format!("POST request failed: {}", e)));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(EngineError::Request(format!(
                "HTTP {} from POST {}: {}",
                status,
                url,
                detail.trim()
            )));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(EngineError::Request(format!("Failed to read response: {}", e)))
            }
        }
    }
}

/// [`RasterEngine`] that delegates evaluation to a remote service.
pub struct HttpEngine<C: AsyncHttpClient> {
    client: C,
    base_url: String,
    access_token: Option<String>,
}

impl<C: AsyncHttpClient> HttpEngine<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Send `token` as a bearer credential on every call.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, EngineError> {
        let url = format!("{}{}", self.base_url, path);
        let body = serde_json::to_string(&body)
            .map_err(|e| EngineError::Computation(format!("Failed to encode expression: {}", e)))?;
        let bytes = self
            .client
            .post_json(&url, &body, self.access_token.as_deref())
            .await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::InvalidResponse(format!("{} from {}", e, url)))
    }
}

impl<C: AsyncHttpClient> RasterEngine for HttpEngine<C> {
    fn name(&self) -> &str {
        "http"
    }

    async fn reduce_percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> Result<PercentileStats, EngineError> {
        let body = json!({
            "expression": image,
            "percentiles": request.percentiles,
            "geometry": request.geometry,
            "scale": request.scale,
            "maxPixels": request.max_pixels,
        });
        self.call(COMPUTE_PATH, body).await
    }

    async fn get_map(
        &self,
        image: &ImageExpr,
        options: &RenderOptions,
    ) -> Result<MapTile, EngineError> {
        let body = json!({
            "expression": image,
            "visualization": options,
        });
        self.call(MAPS_PATH, body).await
    }
}
