//! Evaluation of expression graphs against the in-memory catalog.

use std::collections::HashMap;

use regex::Regex;

use super::raster::{Grid, Raster, RasterBand, Scene};
use crate::engine::expr::{CollectionExpr, ImageExpr, ImageFunction, Reducer};
use crate::engine::EngineError;
use crate::satellite::CloudMask;

/// Scenes plus the band names every scene carries.
///
/// The band list survives an empty scene set, so reducing an empty
/// collection still yields the expected (fully masked) bands.
#[derive(Debug, Clone)]
pub(super) struct Collection {
    pub bands: Vec<String>,
    pub scenes: Vec<Scene>,
}

pub(super) struct Evaluator<'a> {
    grid: &'a Grid,
    catalog: &'a HashMap<String, Vec<Scene>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(grid: &'a Grid, catalog: &'a HashMap<String, Vec<Scene>>) -> Self {
        Self { grid, catalog }
    }

    pub fn collection(&self, expr: &CollectionExpr) -> Result<Collection, EngineError> {
        match expr {
            CollectionExpr::Archive { id } => {
                let scenes = self
                    .catalog
                    .get(id)
                    .ok_or_else(|| EngineError::Computation(format!("Unknown archive '{id}'")))?
                    .clone();
                let bands = scenes
                    .first()
                    .map(|s| s.raster.band_names().into_iter().map(String::from).collect())
                    .unwrap_or_default();
                Ok(Collection { bands, scenes })
            }
            CollectionExpr::FilterBounds { input, bounds } => {
                let mut collection = self.collection(input)?;
                collection.scenes.retain(|s| s.footprint.intersects(bounds));
                Ok(collection)
            }
            CollectionExpr::FilterDate { input, start, end } => {
                let mut collection = self.collection(input)?;
                collection
                    .scenes
                    .retain(|s| *start <= s.acquired && s.acquired < *end);
                Ok(collection)
            }
            CollectionExpr::Merge { left, right } => {
                let mut merged = self.collection(left)?;
                let other = self.collection(right)?;
                if merged.bands.is_empty() {
                    merged.bands = other.bands;
                }
                merged.scenes.extend(other.scenes);
                Ok(merged)
            }
            CollectionExpr::Select {
                input,
                bands,
                rename,
            } => {
                if bands.len() != rename.len() {
                    return Err(EngineError::Computation(format!(
                        "select: {} bands but {} new names",
                        bands.len(),
                        rename.len()
                    )));
                }
                let collection = self.collection(input)?;
                let scenes = collection
                    .scenes
                    .into_iter()
                    .map(|scene| select_scene(scene, bands, rename))
                    .collect::<Result<_, _>>()?;
                Ok(Collection {
                    bands: rename.clone(),
                    scenes,
                })
            }
            CollectionExpr::Map { input, function } => {
                let collection = self.collection(input)?;
                match function {
                    ImageFunction::CloudMask(mask) => apply_cloud_mask(collection, mask),
                }
            }
        }
    }

    pub fn image(&self, expr: &ImageExpr) -> Result<Raster, EngineError> {
        match expr {
            ImageExpr::Reduce {
                collection,
                reducer,
            } => {
                let collection = self.collection(collection)?;
                match reducer {
                    Reducer::Median => Ok(self.median(&collection)),
                }
            }
            ImageExpr::Clip { input, geometry } => {
                let mut raster = self.image(input)?;
                let coverage = raster.grid.coverage(geometry);
                for band in &mut raster.bands {
                    for (value, inside) in band.values.iter_mut().zip(&coverage) {
                        if !inside {
                            *value = None;
                        }
                    }
                }
                Ok(raster)
            }
            ImageExpr::Select { input, bands } => {
                let raster = self.image(input)?;
                let mut selected = Raster::new(raster.grid);
                for name in bands {
                    let band = raster.band(name).ok_or_else(|| {
                        EngineError::Computation(format!("Image has no band '{name}'"))
                    })?;
                    selected.bands.push(band.clone());
                }
                Ok(selected)
            }
            ImageExpr::Clamp { input, low, high } => {
                let (low, high) = (*low, *high);
                if low > high {
                    return Err(EngineError::Computation(format!(
                        "clamp: low {low} exceeds high {high}"
                    )));
                }
                self.map_bands(input, |v| v.max(low).min(high))
            }
            ImageExpr::UnitScale { input, low, high } => {
                let (low, high) = (*low, *high);
                let span = high - low;
                if span == 0.0 || !span.is_finite() {
                    return Err(EngineError::Computation(format!(
                        "unit_scale: empty range [{low}, {high}]"
                    )));
                }
                self.map_bands(input, |v| (v - low) / span)
            }
            ImageExpr::Fill { input, value } => {
                let value = *value;
                self.map_bands(input, |_| value)
            }
            ImageExpr::Stack { images } => {
                let mut stacked = Raster::new(*self.grid);
                for image in images {
                    stacked.bands.extend(self.image(image)?.bands);
                }
                Ok(stacked)
            }
        }
    }

    fn map_bands(&self, input: &ImageExpr, f: impl Fn(f64) -> f64) -> Result<Raster, EngineError> {
        let mut raster = self.image(input)?;
        raster.bands = raster.bands.iter().map(|band| band.map(&f)).collect();
        Ok(raster)
    }

    fn median(&self, collection: &Collection) -> Raster {
        let len = self.grid.len();
        let mut reduced = Raster::new(*self.grid);
        let mut stack = Vec::with_capacity(collection.scenes.len());

        for name in &collection.bands {
            let columns: Vec<&RasterBand> = collection
                .scenes
                .iter()
                .filter_map(|scene| scene.raster.band(name))
                .collect();

            let values = (0..len)
                .map(|i| {
                    stack.clear();
                    stack.extend(columns.iter().filter_map(|band| band.values.get(i).copied().flatten()));
                    median(&mut stack)
                })
                .collect();
            reduced.bands.push(RasterBand::new(name.clone(), values));
        }
        reduced
    }
}

fn select_scene(scene: Scene, bands: &[String], rename: &[String]) -> Result<Scene, EngineError> {
    let mut raster = Raster::new(scene.raster.grid);
    for (source, target) in bands.iter().zip(rename) {
        let band = scene.raster.band(source).ok_or_else(|| {
            EngineError::Computation(format!("Image '{}' has no band '{source}'", scene.id))
        })?;
        raster.bands.push(RasterBand::new(target.clone(), band.values.clone()));
    }
    Ok(Scene { raster, ..scene })
}

fn apply_cloud_mask(collection: Collection, mask: &CloudMask) -> Result<Collection, EngineError> {
    let optical = mask
        .optical_matcher()
        .map_err(|e| EngineError::Computation(format!("Invalid band pattern: {e}")))?;
    let bands = collection
        .bands
        .into_iter()
        .filter(|name| optical.is_match(name))
        .collect();
    let scenes = collection
        .scenes
        .into_iter()
        .map(|scene| mask_scene(scene, mask, &optical))
        .collect::<Result<_, _>>()?;
    Ok(Collection { bands, scenes })
}

fn mask_scene(scene: Scene, mask: &CloudMask, optical: &Regex) -> Result<Scene, EngineError> {
    let aux = scene.raster.band(mask.aux_band()).ok_or_else(|| {
        EngineError::Computation(format!(
            "Image '{}' has no band '{}'",
            scene.id,
            mask.aux_band()
        ))
    })?;
    let valid: Vec<bool> = aux
        .values
        .iter()
        .map(|v| v.is_some_and(|v| mask.is_valid(v)))
        .collect();

    let mut raster = Raster::new(scene.raster.grid);
    for band in scene.raster.bands.iter().filter(|b| optical.is_match(&b.name)) {
        let values = band
            .values
            .iter()
            .zip(&valid)
            .map(|(value, ok)| if *ok { value.map(|raw| mask.to_reflectance(raw)) } else { None })
            .collect();
        raster.bands.push(RasterBand::new(band.name.clone(), values));
    }
    Ok(Scene { raster, ..scene })
}

/// Median of `values`; the mean of the two central values for even counts.
pub(super) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Percentile of sorted `values`, interpolating linearly between ranks.
pub(super) fn percentile(sorted: &[f64], p: u8) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = f64::from(p.min(100)) * last as f64 / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut [7.0]), Some(7.0));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        assert_eq!(percentile(&values, 2), Some(2.0));
        assert_eq!(percentile(&values, 98), Some(98.0));

        let short = [0.0, 10.0];
        assert_eq!(percentile(&short, 50), Some(5.0));
        assert_eq!(percentile(&short, 0), Some(0.0));
        assert_eq!(percentile(&short, 100), Some(10.0));
        assert_eq!(percentile(&[], 50), None);
    }

    #[test]
    fn test_single_value_percentile_is_that_value() {
        assert_eq!(percentile(&[0.4], 2), Some(0.4));
        assert_eq!(percentile(&[0.4], 98), Some(0.4));
    }
}
