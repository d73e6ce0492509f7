//! In-memory raster model for [`super::LocalEngine`].

use chrono::NaiveDate;

use crate::geometry::{BoundingBox, Geometry, Point};

/// A north-up lon/lat pixel grid.
///
/// Pixel `(col, row)` covers `[origin.lon + col*size, +size)` horizontally
/// and grows southwards from `origin.lat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// North-west corner.
    pub origin: Point,
    /// Pixel edge length in degrees.
    pub pixel_deg: f64,
    pub width: usize,
    pub height: usize,
    /// Nominal ground resolution in meters, used to turn a sampling scale
    /// into a pixel stride.
    pub resolution_m: f64,
}

impl Grid {
    pub fn new(origin: Point, pixel_deg: f64, width: usize, height: usize, resolution_m: f64) -> Self {
        Self {
            origin,
            pixel_deg,
            width,
            height,
            resolution_m,
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin.lon,
            self.origin.lat - self.height as f64 * self.pixel_deg,
            self.origin.lon + self.width as f64 * self.pixel_deg,
            self.origin.lat,
        )
    }

    pub fn pixel_center(&self, index: usize) -> Point {
        let col = index % self.width;
        let row = index / self.width;
        Point::new(
            self.origin.lon + (col as f64 + 0.5) * self.pixel_deg,
            self.origin.lat - (row as f64 + 0.5) * self.pixel_deg,
        )
    }

    /// Per-pixel flag: is the pixel center inside `geometry`?
    pub fn coverage(&self, geometry: &Geometry) -> Vec<bool> {
        (0..self.len())
            .map(|i| geometry.contains(&self.pixel_center(i)))
            .collect()
    }

    /// Pixel indices sampled at every `stride`-th row and column.
    pub fn sample_indices(&self, stride: usize) -> impl Iterator<Item = usize> + '_ {
        let stride = stride.max(1);
        (0..self.height)
            .step_by(stride)
            .flat_map(move |row| (0..self.width).step_by(stride).map(move |col| row * self.width + col))
    }
}

/// One named band; `None` marks a masked pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl RasterBand {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Band where every pixel holds `value`.
    pub fn constant(name: impl Into<String>, len: usize, value: f64) -> Self {
        Self::new(name, vec![Some(value); len])
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.iter().map(|v| v.map(&f)).collect(),
        }
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Bands sharing one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub grid: Grid,
    pub bands: Vec<RasterBand>,
}

impl Raster {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            bands: Vec::new(),
        }
    }

    /// Add a fully valid band.
    pub fn with_band(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with_masked_band(name, values.into_iter().map(Some).collect())
    }

    pub fn with_masked_band(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.bands.push(RasterBand::new(name, values));
        self
    }

    /// Add a band holding `value` everywhere.
    pub fn with_constant_band(self, name: impl Into<String>, value: f64) -> Self {
        let len = self.grid.len();
        let mut raster = self;
        raster.bands.push(RasterBand::constant(name, len, value));
        raster
    }

    pub fn band(&self, name: &str) -> Option<&RasterBand> {
        self.bands.iter().find(|b| b.name == name)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    /// Every band has one value per grid pixel.
    pub fn is_consistent(&self) -> bool {
        self.bands.iter().all(|b| b.values.len() == self.grid.len())
    }
}

/// A single acquisition stored in an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub acquired: NaiveDate,
    pub footprint: BoundingBox,
    pub raster: Raster,
}

impl Scene {
    /// Scene whose footprint is the full grid extent.
    pub fn new(id: impl Into<String>, acquired: NaiveDate, raster: Raster) -> Self {
        Self {
            id: id.into(),
            acquired,
            footprint: raster.grid.bounds(),
            raster,
        }
    }

    pub fn with_footprint(mut self, footprint: BoundingBox) -> Self {
        self.footprint = footprint;
        self
    }
}
