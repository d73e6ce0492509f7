//! The composite pipeline, end to end.

use std::sync::Arc;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::request::{CompositeRequest, CompositeResponse};
use crate::composite::{temporal_median, StretchEngine, StretchParams};
use crate::date::DateRange;
use crate::engine::{MapTile, RasterEngine, RenderOptions, TimeoutEngine};
use crate::geometry::{Geometry, Region};
use crate::log::Logger;
use crate::satellite::{resolve_bands, BandSet, CompositeBuilder, SatelliteSource};
use crate::{log_debug, log_info, log_warn};

/// A request whose inputs have all been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub source: SatelliteSource,
    pub dates: DateRange,
    pub region: Region,
    pub bands: BandSet,
    pub render: RenderOptions,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutput {
    pub tile: MapTile,
    pub stretch: StretchParams,
}

/// Runs composite requests against a raster engine.
///
/// Holds no per-request state; one service can serve concurrent requests.
/// Every engine call is bounded by [`PipelineConfig::engine_timeout`].
pub struct CompositeService<E: RasterEngine> {
    engine: TimeoutEngine<E>,
    config: PipelineConfig,
    logger: Arc<dyn Logger>,
}

impl<E: RasterEngine> CompositeService<E> {
    pub fn new(engine: E, config: PipelineConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            engine: TimeoutEngine::new(engine, config.engine_timeout()),
            config,
            logger,
        }
    }

    pub fn engine(&self) -> &E {
        self.engine.inner()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check the request without calling the engine.
    ///
    /// Inputs are checked in order: satellite, dates, region, bands, then
    /// whether the visualization can draw those bands. The first failure is
    /// returned.
    pub fn validate(&self, request: &CompositeRequest) -> Result<ValidatedRequest, PipelineError> {
        let source: SatelliteSource = request.satellite.parse()?;
        let dates = DateRange::from_pair(&request.date)?;
        let geometry = Geometry::from_geojson(&request.geojson)?;
        let region = Region::new(geometry, self.config.error_margin())?;

        let bands = BandSet::new(request.visualization.band_names())
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
        resolve_bands(source, &bands)?;

        let render = request.visualization.merge(bands.as_slice());
        render
            .check_layout(bands.len())
            .map_err(PipelineError::InvalidRequest)?;
        Ok(ValidatedRequest {
            source,
            dates,
            region,
            bands,
            render,
        })
    }

    /// Validate, composite, stretch and render.
    pub async fn run(&self, request: &CompositeRequest) -> Result<CompositeOutput, PipelineError> {
        let validated = self.validate(request)?;
        self.composite(&validated).await
    }

    /// Build and render the composite for an already validated request.
    pub async fn composite(
        &self,
        request: &ValidatedRequest,
    ) -> Result<CompositeOutput, PipelineError> {
        log_info!(
            self.logger,
            "Compositing {} bands [{}] for {} via {} engine",
            request.source,
            request.bands.as_slice().join(", "),
            request.dates,
            self.engine.name()
        );

        let collection =
            CompositeBuilder::new(request.source).build(&request.region, &request.dates, &request.bands)?;
        let composite = temporal_median(collection, &request.region);

        let stretcher = StretchEngine::new(&self.engine, self.config.stretch().clone());
        let (image, stretch) = stretcher
            .stretch(
                &composite,
                request.bands.as_slice(),
                Some(request.region.geometry()),
            )
            .await?;
        for band in &stretch.bands {
            if band.is_degenerate() {
                log_warn!(
                    self.logger,
                    "Band {} is constant ({}), rendering it as 0",
                    band.band,
                    band.low
                );
            } else {
                log_debug!(
                    self.logger,
                    "Band {} stretched over [{}, {}]",
                    band.band,
                    band.low,
                    band.high
                );
            }
        }

        let tile = self.engine.get_map(&image, &request.render).await?;
        log_info!(self.logger, "Composite ready: map {}", tile.map_id);

        Ok(CompositeOutput { tile, stretch })
    }

    /// Run a request and turn the outcome into a response document.
    pub async fn handle(&self, request: &CompositeRequest) -> CompositeResponse {
        let result = self.run(request).await;
        if let Err(e) = &result {
            log_warn!(
                self.logger,
                "Composite request failed ({}{}): {}",
                e.kind(),
                if e.is_retryable() { ", retryable" } else { "" },
                e
            );
        }
        CompositeResponse::from(result.map(|output| output.tile.url_template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, ImageExpr, PercentileRequest, PercentileStats};
    use crate::log::{LogLevel, MemoryLogger};
    use crate::service::{NameList, VisualizationConfig};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Engine that answers with canned results and remembers what it saw.
    #[derive(Default)]
    struct ScriptedEngine {
        stats: PercentileStats,
        percentile_calls: Mutex<Vec<PercentileRequest>>,
        rendered: Mutex<Vec<(ImageExpr, RenderOptions)>>,
        delay: Option<Duration>,
    }

    impl RasterEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn reduce_percentiles(
            &self,
            _image: &ImageExpr,
            request: &PercentileRequest,
        ) -> Result<PercentileStats, EngineError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.percentile_calls.lock().unwrap().push(request.clone());
            Ok(self.stats.clone())
        }

        async fn get_map(
            &self,
            image: &ImageExpr,
            options: &RenderOptions,
        ) -> Result<MapTile, EngineError> {
            self.rendered
                .lock()
                .unwrap()
                .push((image.clone(), options.clone()));
            Ok(MapTile {
                map_id: "m-1".to_string(),
                url_template: "https://tiles/m-1/{z}/{x}/{y}".to_string(),
                min: options.min.clone(),
                max: options.max.clone(),
            })
        }
    }

    fn stats(bands: &[&str]) -> PercentileStats {
        let mut stats = PercentileStats::default();
        for band in bands {
            stats.insert(band, 2, Some(0.02));
            stats.insert(band, 98, Some(0.3));
        }
        stats
    }

    fn request(satellite: &str, date: [&str; 2], bands: &[&str]) -> CompositeRequest {
        CompositeRequest {
            date: date.iter().map(|d| d.to_string()).collect(),
            satellite: satellite.to_string(),
            geojson: json!({
                "type": "Polygon",
                "coordinates": [[[10.0, 45.0], [10.03, 45.0], [10.03, 45.03], [10.0, 45.03], [10.0, 45.0]]]
            }),
            visualization: VisualizationConfig::with_bands(bands.iter().copied()),
        }
    }

    fn service(engine: ScriptedEngine) -> (CompositeService<ScriptedEngine>, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let service = CompositeService::new(engine, PipelineConfig::default(), logger.clone());
        (service, logger)
    }

    #[tokio::test]
    async fn test_landsat_request_renders_tile() {
        let (service, logger) = service(ScriptedEngine {
            stats: stats(&["B4", "B3", "B2"]),
            ..ScriptedEngine::default()
        });

        let response = service
            .handle(&request("landsat", ["2021-01-01", "2021-06-01"], &["B4", "B3", "B2"]))
            .await;
        assert_eq!(response, CompositeResponse::Tile("https://tiles/m-1/{z}/{x}/{y}".to_string()));

        let calls = service.engine().percentile_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].percentiles, vec![2, 98]);
        assert_eq!(calls[0].scale, 30.0);
        assert_eq!(calls[0].max_pixels, 10_000_000_000_000);
        assert!(calls[0].geometry.is_some());

        let rendered = service.engine().rendered.lock().unwrap();
        let (image, options) = &rendered[0];
        assert_eq!(options.bands, vec!["B4", "B3", "B2"]);
        assert_eq!((options.min.clone(), options.max.clone()), (vec![0.0], vec![1.0]));
        let ImageExpr::Stack { images } = image else {
            panic!("stretched image should stack one band per request band");
        };
        assert_eq!(images.len(), 3);

        assert!(logger.contains(LogLevel::Info, "landsat"));
        assert!(logger.contains(LogLevel::Info, "map m-1"));
    }

    #[test]
    fn test_validation_order() {
        let (service, _) = service(ScriptedEngine::default());

        // Every input is wrong; the satellite is reported first.
        let mut bad = request("modis", ["2021-06-01", "2021-01-01"], &[]);
        bad.geojson = json!({"type": "Point", "coordinates": [0, 0]});
        assert_eq!(service.validate(&bad).unwrap_err().kind(), "unsupported_satellite");

        bad.satellite = "landsat".to_string();
        assert_eq!(service.validate(&bad).unwrap_err().kind(), "invalid_date_range");

        bad.date = vec!["2021-01-01".to_string(), "2021-06-01".to_string()];
        assert_eq!(service.validate(&bad).unwrap_err().kind(), "invalid_region");

        bad.geojson = request("landsat", ["2021-01-01", "2021-06-01"], &[]).geojson;
        assert_eq!(service.validate(&bad).unwrap_err().kind(), "invalid_request");

        bad.visualization = VisualizationConfig::with_bands(["B4", "B10"]);
        assert_eq!(service.validate(&bad).unwrap_err().kind(), "unsupported_band");
    }

    #[test]
    fn test_validated_request_normalizes_bands() {
        let (service, _) = service(ScriptedEngine::default());
        let validated = service
            .validate(&request("Sentinel2", ["2021-01-01", "2021-02-01"], &["b8", "b4", "b8", "B3"]))
            .unwrap();
        assert_eq!(validated.source, SatelliteSource::Sentinel2);
        assert_eq!(validated.bands.as_slice(), &["B8", "B4", "B3"]);
        assert_eq!(validated.render.bands, vec!["B8", "B4", "B3"]);
    }

    #[tokio::test]
    async fn test_unrenderable_band_count_never_calls_engine() {
        let (service, _) = service(ScriptedEngine {
            stats: stats(&["B4", "B3"]),
            ..ScriptedEngine::default()
        });
        let err = service
            .run(&request("landsat", ["2021-01-01", "2021-06-01"], &["B4", "B3"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalid_request");
        assert!(err.to_string().contains("1 or 3 bands"), "{err}");
        assert!(service.engine().percentile_calls.lock().unwrap().is_empty());
        assert!(service.engine().rendered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_palette_needs_single_band() {
        let (service, _) = service(ScriptedEngine::default());
        let mut request = request("landsat", ["2021-01-01", "2021-06-01"], &["B4", "B3", "B2"]);
        request.visualization.palette = Some(NameList::Joined("000000,ffffff".to_string()));
        assert_eq!(service.validate(&request).unwrap_err().kind(), "invalid_request");

        request.visualization.bands = NameList::Joined("B5".to_string());
        assert!(service.validate(&request).is_ok());
    }

    #[tokio::test]
    async fn test_validation_failure_never_calls_engine() {
        let (service, logger) = service(ScriptedEngine::default());
        let response = service
            .handle(&request("modis", ["2021-01-01", "2021-06-01"], &["B4"]))
            .await;

        assert_eq!(response.status_code(), 404);
        assert!(service.engine().percentile_calls.lock().unwrap().is_empty());
        assert!(logger.contains(LogLevel::Warn, "unsupported_satellite"));
    }

    #[tokio::test]
    async fn test_no_valid_pixels_is_degenerate() {
        let mut empty = PercentileStats::default();
        empty.insert("B4", 2, None);
        empty.insert("B4", 98, None);
        let (service, _) = service(ScriptedEngine {
            stats: empty,
            ..ScriptedEngine::default()
        });

        let err = service
            .run(&request("landsat", ["2021-01-01", "2021-06-01"], &["B4"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "degenerate_band");
        assert!(service.engine().rendered.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_engine_times_out() {
        let engine = ScriptedEngine {
            stats: stats(&["B4"]),
            delay: Some(Duration::from_secs(600)),
            ..ScriptedEngine::default()
        };
        let service = CompositeService::new(
            engine,
            PipelineConfig::default().with_engine_timeout(Duration::from_secs(10)),
            Arc::new(MemoryLogger::new()),
        );

        let err = service
            .run(&request("landsat", ["2021-01-01", "2021-06-01"], &["B4"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "engine_timeout");
        assert!(err.is_retryable());
    }
}
