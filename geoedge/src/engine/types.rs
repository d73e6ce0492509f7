//! Raster engine abstraction.
//!
//! An engine owns the imagery. The pipeline hands it lazy expressions and
//! asks for exactly two kinds of materialization: percentile statistics and
//! a rendered tile map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::expr::ImageExpr;
use crate::geometry::Geometry;

/// Errors reported by a raster engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Transport-level failure talking to the engine.
    #[error("Engine request failed: {0}")]
    Request(String),

    /// The engine rejected or failed to evaluate the expression.
    #[error("Engine computation failed: {0}")]
    Computation(String),

    /// The engine replied with something that could not be decoded.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    #[error("Computation would touch {count} pixels, more than the allowed {max}")]
    TooManyPixels { count: u64, max: u64 },

    #[error("{operation} did not complete within {}s", .after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl EngineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }
}

/// Parameters of a percentile reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRequest {
    /// Percentiles in `0..=100`.
    pub percentiles: Vec<u8>,
    /// Area to sample; `None` means the whole image.
    pub geometry: Option<Geometry>,
    /// Sampling scale in meters.
    pub scale: f64,
    /// Upper bound on sampled pixels.
    pub max_pixels: u64,
}

/// Percentile values keyed `<band>_p<percentile>`.
///
/// A `None` value means the band had no valid pixel in the sampled area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentileStats(BTreeMap<String, Option<f64>>);

impl PercentileStats {
    pub fn key(band: &str, percentile: u8) -> String {
        format!("{band}_p{percentile}")
    }

    pub fn insert(&mut self, band: &str, percentile: u8, value: Option<f64>) {
        self.0.insert(Self::key(band, percentile), value);
    }

    /// `None` when the key is missing or the value is null.
    pub fn get(&self, band: &str, percentile: u8) -> Option<f64> {
        self.0.get(&Self::key(band, percentile)).copied().flatten()
    }

    pub fn contains(&self, band: &str, percentile: u8) -> bool {
        self.0.contains_key(&Self::key(band, percentile))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rendering parameters for [`RasterEngine::get_map`].
///
/// `min`, `max` and `gamma` hold one value for all bands or one per band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<String>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bands: Vec::new(),
            min: vec![0.0],
            max: vec![1.0],
            gamma: None,
            palette: None,
            opacity: None,
        }
    }
}

impl RenderOptions {
    /// Check that these options can draw `band_count` bands.
    ///
    /// A map shows 1 band (grayscale or palette) or 3 bands (RGB, no
    /// palette). `min`, `max` and `gamma` hold one shared value or one value
    /// per band.
    pub fn check_layout(&self, band_count: usize) -> Result<(), String> {
        if band_count != 1 && band_count != 3 {
            return Err(format!("Rendering needs 1 or 3 bands, got {band_count}"));
        }
        if self.palette.is_some() && band_count != 1 {
            return Err("A palette can only be applied to a single band".to_string());
        }
        let per_band = [
            ("min", Some(&self.min)),
            ("max", Some(&self.max)),
            ("gamma", self.gamma.as_ref()),
        ];
        for (name, values) in per_band {
            if let Some(values) = values {
                if values.len() != 1 && values.len() != band_count {
                    return Err(format!(
                        "'{name}' needs 1 or {band_count} values, got {}",
                        values.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A rendered map: an XYZ URL template plus its display range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapTile {
    pub map_id: String,
    /// Template with `{z}`, `{x}` and `{y}` placeholders.
    #[serde(rename = "urlFormat")]
    pub url_template: String,
    #[serde(default)]
    pub min: Vec<f64>,
    #[serde(default)]
    pub max: Vec<f64>,
}

/// A lazy raster evaluator.
///
/// Implementations must be safe to share between concurrent requests.
pub trait RasterEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Compute per-band percentiles of `image`.
    fn reduce_percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> impl Future<Output = Result<PercentileStats, EngineError>> + Send;

    /// Render `image` and return its tile URL template.
    fn get_map(
        &self,
        image: &ImageExpr,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<MapTile, EngineError>> + Send;
}

impl<E: RasterEngine> RasterEngine for Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reduce_percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> impl Future<Output = Result<PercentileStats, EngineError>> + Send {
        (**self).reduce_percentiles(image, request)
    }

    fn get_map(
        &self,
        image: &ImageExpr,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<MapTile, EngineError>> + Send {
        (**self).get_map(image, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_keys() {
        let mut stats = PercentileStats::default();
        stats.insert("B4", 2, Some(0.05));
        stats.insert("B4", 98, None);

        assert_eq!(PercentileStats::key("B8A", 98), "B8A_p98");
        assert_eq!(stats.get("B4", 2), Some(0.05));
        assert_eq!(stats.get("B4", 98), None);
        assert!(stats.contains("B4", 98));
        assert!(!stats.contains("B3", 2));
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_percentile_stats_json() {
        let stats: PercentileStats =
            serde_json::from_str(r#"{"B4_p2": 0.01, "B4_p98": 0.3, "B3_p2": null}"#).unwrap();
        assert_eq!(stats.get("B4", 98), Some(0.3));
        assert!(stats.contains("B3", 2));
        assert_eq!(stats.get("B3", 2), None);
    }

    #[test]
    fn test_map_tile_json_names() {
        let tile: MapTile = serde_json::from_str(
            r#"{"mapId": "abc", "urlFormat": "https://tiles/abc/{z}/{x}/{y}", "min": [0], "max": [1]}"#,
        )
        .unwrap();
        assert_eq!(tile.map_id, "abc");
        assert_eq!(tile.url_template, "https://tiles/abc/{z}/{x}/{y}");
    }

    #[test]
    fn test_render_options_omit_unset_fields() {
        let json = serde_json::to_value(RenderOptions::default()).unwrap();
        assert_eq!(json, serde_json::json!({"min": [0.0], "max": [1.0]}));
    }

    #[test]
    fn test_timeout_message() {
        let err = EngineError::Timeout {
            operation: "get_map",
            after: Duration::from_secs(120),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "get_map did not complete within 120s");
    }

    #[test]
    fn test_render_layout() {
        let options = RenderOptions::default();
        assert!(options.check_layout(1).is_ok());
        assert!(options.check_layout(3).is_ok());
        assert_eq!(
            options.check_layout(2).unwrap_err(),
            "Rendering needs 1 or 3 bands, got 2"
        );

        let palette = RenderOptions {
            palette: Some(vec!["000000".into(), "ffffff".into()]),
            ..RenderOptions::default()
        };
        assert!(palette.check_layout(1).is_ok());
        assert!(palette.check_layout(3).is_err());

        let gamma = RenderOptions {
            gamma: Some(vec![1.0, 1.2]),
            ..RenderOptions::default()
        };
        assert!(gamma.check_layout(3).unwrap_err().contains("'gamma'"));
    }
}
