//! Percentile stretch of a composite into the `[0, 1]` display range.

use thiserror::Error;

use crate::config::{
    StretchSettings, DEFAULT_HIGH_PERCENTILE, DEFAULT_LOW_PERCENTILE, DEFAULT_MAX_PIXELS,
    DEFAULT_STRETCH_SCALE,
};
use crate::engine::{EngineError, ImageExpr, PercentileRequest, RasterEngine};
use crate::geometry::Geometry;

/// Failures computing stretch parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StretchError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Band '{band}' has no valid pixels in the region")]
    NoValidPixels { band: String },
}

/// Which percentiles to stretch between, and how to sample them.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchConfig {
    pub low_percentile: u8,
    pub high_percentile: u8,
    /// Sampling resolution in meters per pixel.
    pub scale: f64,
    pub max_pixels: u64,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            low_percentile: DEFAULT_LOW_PERCENTILE,
            high_percentile: DEFAULT_HIGH_PERCENTILE,
            scale: DEFAULT_STRETCH_SCALE,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl From<&StretchSettings> for StretchConfig {
    fn from(settings: &StretchSettings) -> Self {
        Self {
            low_percentile: settings.low_percentile,
            high_percentile: settings.high_percentile,
            scale: settings.scale,
            max_pixels: settings.max_pixels,
        }
    }
}

/// Stretch range of one band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandStretch {
    pub band: String,
    pub low: f64,
    pub high: f64,
}

impl BandStretch {
    /// `low == high`: the band is constant over the sampled pixels.
    pub fn is_degenerate(&self) -> bool {
        self.high <= self.low
    }
}

/// Per-band stretch ranges, in band order.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchParams {
    pub bands: Vec<BandStretch>,
}

impl StretchParams {
    pub fn get(&self, band: &str) -> Option<&BandStretch> {
        self.bands.iter().find(|b| b.band == band)
    }

    /// Build the normalized image: one band per entry, each in `[0, 1]`.
    ///
    /// A degenerate band becomes the constant 0 over its valid pixels.
    pub fn apply(&self, image: &ImageExpr) -> ImageExpr {
        let bands = self
            .bands
            .iter()
            .map(|stretch| {
                let band = image.clone().select([stretch.band.as_str()]);
                if stretch.is_degenerate() {
                    band.fill(0.0)
                } else {
                    band.clamp(stretch.low, stretch.high)
                        .unit_scale(stretch.low, stretch.high)
                }
            })
            .collect();
        ImageExpr::stack(bands)
    }
}

/// Computes stretch ranges with one engine percentile reduction.
pub struct StretchEngine<'a, E> {
    engine: &'a E,
    config: StretchConfig,
}

impl<'a, E: RasterEngine> StretchEngine<'a, E> {
    pub fn new(engine: &'a E, config: StretchConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &StretchConfig {
        &self.config
    }

    /// Percentile ranges of `bands` over the valid pixels of `image` within
    /// `geometry` (the whole image when `None`).
    pub async fn compute(
        &self,
        image: &ImageExpr,
        bands: &[String],
        geometry: Option<&Geometry>,
    ) -> Result<StretchParams, StretchError> {
        let (low_p, high_p) = (self.config.low_percentile, self.config.high_percentile);
        let request = PercentileRequest {
            percentiles: vec![low_p, high_p],
            geometry: geometry.cloned(),
            scale: self.config.scale,
            max_pixels: self.config.max_pixels,
        };
        let stats = self.engine.reduce_percentiles(image, &request).await?;

        let mut params = Vec::with_capacity(bands.len());
        for band in bands {
            for p in [low_p, high_p] {
                if !stats.contains(band, p) {
                    return Err(EngineError::InvalidResponse(format!(
                        "percentile result is missing '{}'",
                        crate::engine::PercentileStats::key(band, p)
                    ))
                    .into());
                }
            }
            let (Some(low), Some(high)) = (stats.get(band, low_p), stats.get(band, high_p)) else {
                return Err(StretchError::NoValidPixels { band: band.clone() });
            };
            params.push(BandStretch {
                band: band.clone(),
                low,
                high,
            });
        }
        Ok(StretchParams { bands: params })
    }

    /// [`compute`](Self::compute) followed by [`StretchParams::apply`].
    pub async fn stretch(
        &self,
        image: &ImageExpr,
        bands: &[String],
        geometry: Option<&Geometry>,
    ) -> Result<(ImageExpr, StretchParams), StretchError> {
        let params = self.compute(image, bands, geometry).await?;
        Ok((params.apply(image), params))
    }
}
