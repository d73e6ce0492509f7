//! In-process raster engine.
//!
//! Holds a catalog of scenes on one shared pixel grid and evaluates
//! expression graphs directly. Rendered maps are kept in memory and can be
//! fetched back by map id, which makes the whole pipeline observable in
//! tests and offline demos.

mod eval;
mod raster;
mod render;

pub use raster::{Grid, Raster, RasterBand, Scene};

use image::RgbaImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use self::eval::{percentile, Collection, Evaluator};
use super::expr::{CollectionExpr, ImageExpr};
use super::types::{EngineError, MapTile, PercentileRequest, PercentileStats, RenderOptions};
use super::RasterEngine;

/// URL scheme of maps served by [`LocalEngine`].
pub const LOCAL_TILE_PREFIX: &str = "memory://local/maps";

/// A map rendered by [`LocalEngine::get_map`].
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub image: RgbaImage,
    /// The evaluated raster the image was drawn from.
    pub raster: Raster,
    pub options: RenderOptions,
}

/// In-memory [`RasterEngine`].
pub struct LocalEngine {
    grid: Grid,
    catalog: HashMap<String, Vec<Scene>>,
    maps: Mutex<HashMap<String, RenderedMap>>,
    next_map: AtomicU64,
    latency: Option<Duration>,
    failure: Option<String>,
}

impl LocalEngine {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            catalog: HashMap::new(),
            maps: Mutex::new(HashMap::new()),
            next_map: AtomicU64::new(1),
            latency: None,
            failure: None,
        }
    }

    /// Add a scene to `archive`. The scene must sit on the engine grid.
    pub fn add_scene(&mut self, archive: &str, scene: Scene) -> Result<(), EngineError> {
        if scene.raster.grid != self.grid || !scene.raster.is_consistent() {
            return Err(EngineError::Computation(format!(
                "Scene '{}' does not match the engine grid",
                scene.id
            )));
        }
        self.catalog.entry(archive.to_string()).or_default().push(scene);
        Ok(())
    }

    pub fn with_scene(mut self, archive: &str, scene: Scene) -> Result<Self, EngineError> {
        self.add_scene(archive, scene)?;
        Ok(self)
    }

    /// Register an archive with no scenes.
    pub fn with_archive(mut self, archive: &str) -> Self {
        self.catalog.entry(archive.to_string()).or_default();
        self
    }

    /// Delay every materializing call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every materializing call with a computation error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn scene_count(&self, archive: &str) -> usize {
        self.catalog.get(archive).map_or(0, Vec::len)
    }

    /// Evaluate an image expression to pixels.
    pub fn evaluate(&self, image: &ImageExpr) -> Result<Raster, EngineError> {
        Evaluator::new(&self.grid, &self.catalog).image(image)
    }

    /// Scenes surviving a collection expression.
    pub fn evaluate_collection(&self, collection: &CollectionExpr) -> Result<Vec<Scene>, EngineError> {
        Evaluator::new(&self.grid, &self.catalog)
            .collection(collection)
            .map(|Collection { scenes, .. }| scenes)
    }

    /// A previously rendered map.
    pub fn rendered(&self, map_id: &str) -> Option<RenderedMap> {
        self.maps.lock().ok()?.get(map_id).cloned()
    }

    pub fn map_count(&self) -> usize {
        self.maps.lock().map_or(0, |maps| maps.len())
    }

    async fn prepare(&self) -> Result<(), EngineError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(message) => Err(EngineError::Computation(message.clone())),
            None => Ok(()),
        }
    }

    fn percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> Result<PercentileStats, EngineError> {
        let raster = self.evaluate(image)?;
        let stride = (request.scale / self.grid.resolution_m).round().max(1.0) as usize;
        let coverage = request.geometry.as_ref().map(|g| self.grid.coverage(g));

        let sampled: Vec<usize> = self
            .grid
            .sample_indices(stride)
            .filter(|i| coverage.as_ref().map_or(true, |c| c[*i]))
            .collect();
        let count = sampled.len() as u64;
        if count > request.max_pixels {
            return Err(EngineError::TooManyPixels {
                count,
                max: request.max_pixels,
            });
        }

        let mut stats = PercentileStats::default();
        for band in &raster.bands {
            let mut values: Vec<f64> = sampled
                .iter()
                .filter_map(|i| band.values.get(*i).copied().flatten())
                .filter(|v| v.is_finite())
                .collect();
            values.sort_by(f64::total_cmp);
            for p in &request.percentiles {
                stats.insert(&band.name, *p, percentile(&values, *p));
            }
        }
        Ok(stats)
    }

    fn store(&self, rendered: RenderedMap) -> Result<String, EngineError> {
        let map_id = format!("local-{}", self.next_map.fetch_add(1, Ordering::Relaxed));
        self.maps
            .lock()
            .map_err(|_| EngineError::Computation("Map store is poisoned".to_string()))?
            .insert(map_id.clone(), rendered);
        Ok(map_id)
    }
}

impl RasterEngine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn reduce_percentiles(
        &self,
        image: &ImageExpr,
        request: &PercentileRequest,
    ) -> Result<PercentileStats, EngineError> {
        self.prepare().await?;
        self.percentiles(image, request)
    }

    async fn get_map(
        &self,
        image: &ImageExpr,
        options: &RenderOptions,
    ) -> Result<MapTile, EngineError> {
        self.prepare().await?;
        let raster = self.evaluate(image)?;
        let rendered = render::render(&raster, options)?;
        let map_id = self.store(RenderedMap {
            image: rendered,
            raster,
            options: options.clone(),
        })?;

        Ok(MapTile {
            url_template: format!("{LOCAL_TILE_PREFIX}/{map_id}/tiles/{{z}}/{{x}}/{{y}}"),
            map_id,
            min: options.min.clone(),
            max: options.max.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateRange;
    use crate::engine::ImageFunction;
    use crate::geometry::{BoundingBox, Geometry, Point};
    use crate::satellite::{CloudMask, SatelliteSource};
    use chrono::NaiveDate;

    fn grid() -> Grid {
        Grid::new(Point::new(0.0, 2.0), 1.0, 2, 2, 30.0)
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn scene(id: &str, date: &str, b4: [f64; 4], scl: [f64; 4]) -> Scene {
        Scene::new(
            id,
            day(date),
            Raster::new(grid())
                .with_band("B4", b4.to_vec())
                .with_band("SCL", scl.to_vec()),
        )
    }

    fn engine() -> LocalEngine {
        LocalEngine::new(grid())
            .with_scene("S2", scene("a", "2021-01-05", [2500.0, 2500.0, 5000.0, 5000.0], [4.0; 4]))
            .unwrap()
            .with_scene("S2", scene("b", "2021-01-15", [7500.0, 5000.0, 7500.0, 5000.0], [4.0, 9.0, 4.0, 9.0]))
            .unwrap()
            .with_scene("S2", scene("c", "2021-03-01", [9000.0; 4], [4.0; 4]))
            .unwrap()
    }

    fn january() -> CollectionExpr {
        let range = DateRange::parse("2021-01-01", "2021-02-01").unwrap();
        CollectionExpr::archive("S2").filter_date(&range)
    }

    fn masked(collection: CollectionExpr) -> CollectionExpr {
        collection
            .select(vec!["B4".into(), "SCL".into()], vec!["B4".into(), "SCL".into()])
            .map(ImageFunction::CloudMask(CloudMask::for_source(SatelliteSource::Sentinel2)))
    }

    #[test]
    fn test_rejects_scene_on_other_grid() {
        let other = Grid::new(Point::new(0.0, 2.0), 0.5, 4, 4, 30.0);
        let scene = Scene::new("x", day("2021-01-01"), Raster::new(other).with_constant_band("B4", 1.0));
        assert!(LocalEngine::new(grid()).with_scene("S2", scene).is_err());
    }

    #[test]
    fn test_filters_by_date_and_bounds() {
        let engine = engine();
        assert_eq!(engine.scene_count("S2"), 3);
        assert_eq!(engine.scene_count("NOPE"), 0);
        assert_eq!(engine.evaluate_collection(&january()).unwrap().len(), 2);

        let far = BoundingBox::new(50.0, 50.0, 51.0, 51.0);
        let none = january().filter_bounds(far);
        assert!(engine.evaluate_collection(&none).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_archive_is_an_error() {
        let err = engine()
            .evaluate_collection(&CollectionExpr::archive("NOPE"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Computation(_)));
    }

    #[test]
    fn test_masked_median() {
        let raster = engine().evaluate(&masked(january()).median()).unwrap();
        assert_eq!(raster.band_names(), vec!["B4"]);
        // Pixels 1 and 3 are cloudy in scene b, so only scene a contributes.
        assert_eq!(
            raster.band("B4").unwrap().values,
            vec![Some(0.5), Some(0.25), Some(0.625), Some(0.5)]
        );
    }

    #[test]
    fn test_empty_collection_keeps_band_names() {
        let range = DateRange::parse("2022-01-01", "2022-02-01").unwrap();
        let empty = masked(CollectionExpr::archive("S2").filter_date(&range));
        let raster = engine().evaluate(&empty.median()).unwrap();
        assert_eq!(raster.band_names(), vec!["B4"]);
        assert_eq!(raster.band("B4").unwrap().valid_count(), 0);
    }

    #[test]
    fn test_clip_masks_outside_pixels() {
        let left = Geometry::polygon(BoundingBox::new(0.0, 0.0, 1.0, 2.0).to_polygon());
        let raster = engine()
            .evaluate(&masked(january()).median().clip(left))
            .unwrap();
        assert_eq!(
            raster.band("B4").unwrap().values,
            vec![Some(0.5), None, Some(0.625), None]
        );
    }

    #[tokio::test]
    async fn test_percentiles_and_pixel_budget() {
        let engine = engine();
        let image = masked(january()).median();
        let mut request = PercentileRequest {
            percentiles: vec![0, 100],
            geometry: None,
            scale: 30.0,
            max_pixels: 100,
        };

        let stats = engine.reduce_percentiles(&image, &request).await.unwrap();
        assert_eq!(stats.get("B4", 0), Some(0.25));
        assert_eq!(stats.get("B4", 100), Some(0.625));

        request.max_pixels = 3;
        let err = engine.reduce_percentiles(&image, &request).await.unwrap_err();
        assert_eq!(err, EngineError::TooManyPixels { count: 4, max: 3 });

        // A 60 m scale on a 30 m grid samples every other pixel.
        request.scale = 60.0;
        let stats = engine.reduce_percentiles(&image, &request).await.unwrap();
        assert_eq!(stats.get("B4", 100), Some(0.5));
    }

    #[tokio::test]
    async fn test_get_map_stores_rendered_image() {
        let engine = engine();
        let image = masked(january()).median();
        let options = RenderOptions {
            bands: vec!["B4".into()],
            ..RenderOptions::default()
        };

        let tile = engine.get_map(&image, &options).await.unwrap();
        assert_eq!(tile.map_id, "local-1");
        assert_eq!(tile.url_template, "memory://local/maps/local-1/tiles/{z}/{x}/{y}");
        assert_eq!((tile.min.clone(), tile.max.clone()), (vec![0.0], vec![1.0]));

        let rendered = engine.rendered(&tile.map_id).unwrap();
        assert_eq!(rendered.image.dimensions(), (2, 2));
        assert_eq!(rendered.image.get_pixel(0, 1)[0], 159);
        assert_eq!(engine.map_count(), 1);
        assert!(engine.rendered("local-2").is_none());
    }

    #[tokio::test]
    async fn test_failing_engine() {
        let engine = engine().failing("quota exceeded");
        let err = engine
            .get_map(&masked(january()).median(), &RenderOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Computation("quota exceeded".to_string()));
    }
}
