//! Geometry type definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Meters per degree of latitude (mean spherical Earth).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Errors raised while building geometries from request input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Unsupported GeoJSON type '{0}' (expected Feature, FeatureCollection, Polygon or MultiPolygon)")]
    UnsupportedType(String),

    #[error("Malformed GeoJSON: {0}")]
    Malformed(String),

    #[error("Coordinate ({lon}, {lat}) is outside the valid lon/lat range")]
    OutOfRange { lon: f64, lat: f64 },

    #[error("Region geometry is empty")]
    Empty,

    #[error("Error margin must be a positive number of meters, got {0}")]
    InvalidMargin(f64),
}

/// A lon/lat position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (MIN_LON..=MAX_LON).contains(&self.lon)
            && (MIN_LAT..=MAX_LAT).contains(&self.lat)
    }
}

/// Axis-aligned lon/lat box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.lon, p.lat, p.lon, p.lat),
                Some(b) => Self::new(
                    b.min_lon.min(p.lon),
                    b.min_lat.min(p.lat),
                    b.max_lon.max(p.lon),
                    b.max_lat.max(p.lat),
                ),
            })
        })
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::new(
            self.min_lon.min(other.min_lon),
            self.min_lat.min(other.min_lat),
            self.max_lon.max(other.max_lon),
            self.max_lat.max(other.max_lat),
        )
    }

    /// Closed-interval overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.min_lon
            && self.min_lat <= other.min_lat
            && self.max_lon >= other.max_lon
            && self.max_lat >= other.max_lat
    }

    /// Grow the box outward by `meters` on every side.
    ///
    /// Longitude degrees are converted at the box's highest absolute latitude,
    /// where a degree is shortest, so the result never under-covers. The
    /// result is clamped to the valid lon/lat range.
    pub fn expand_meters(&self, meters: f64) -> BoundingBox {
        let dlat = meters / METERS_PER_DEGREE;
        let worst_lat = self.min_lat.abs().max(self.max_lat.abs()).min(89.0);
        let dlon = meters / (METERS_PER_DEGREE * worst_lat.to_radians().cos());

        Self::new(
            (self.min_lon - dlon).max(MIN_LON),
            (self.min_lat - dlat).max(MIN_LAT),
            (self.max_lon + dlon).min(MAX_LON),
            (self.max_lat + dlat).min(MAX_LAT),
        )
    }

    /// The box as a closed polygon ring.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(
            vec![
                Point::new(self.min_lon, self.min_lat),
                Point::new(self.max_lon, self.min_lat),
                Point::new(self.max_lon, self.max_lat),
                Point::new(self.min_lon, self.max_lat),
                Point::new(self.min_lon, self.min_lat),
            ],
            Vec::new(),
        )
    }
}

/// A polygon with an exterior ring and optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { exterior, holes }
    }

    /// Absolute planar area of the exterior ring minus holes, in square degrees.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_area(h)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }

    /// Whether the polygon covers no area.
    ///
    /// True when the exterior vertices are all collinear, or when holes
    /// cancel the whole exterior. A self-intersecting exterior whose lobes
    /// cancel in [`Polygon::area`] still covers area and is not empty.
    pub fn is_empty(&self) -> bool {
        !spans_area(&self.exterior) || (ring_area(&self.exterior) > 0.0 && self.area() <= 0.0)
    }

    /// Even-odd point-in-polygon; points inside a hole are outside.
    pub fn contains(&self, p: &Point) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.exterior)
    }
}

/// Shoelace formula over a ring (closing edge implied).
fn ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.lon * b.lat - b.lon * a.lat)
        .sum();
    (twice / 2.0).abs()
}

/// At least three vertices that are not all on one line.
fn spans_area(ring: &[Point]) -> bool {
    let Some(first) = ring.first() else {
        return false;
    };
    let Some(second) = ring.iter().find(|p| *p != first) else {
        return false;
    };
    ring.iter().any(|p| {
        let cross = (second.lon - first.lon) * (p.lat - first.lat)
            - (second.lat - first.lat) * (p.lon - first.lon);
        cross != 0.0
    })
}

fn ring_contains(ring: &[Point], p: &Point) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat)
            && p.lon < (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// One or more polygons.
///
/// Serializes as a GeoJSON `MultiPolygon` (see [`super::geojson`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", try_from = "serde_json::Value")]
pub struct Geometry {
    pub polygons: Vec<Polygon>,
}

impl Geometry {
    pub fn polygon(polygon: Polygon) -> Self {
        Self {
            polygons: vec![polygon],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(Polygon::is_empty)
    }

    pub fn contains(&self, p: &Point) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.polygons
            .iter()
            .filter_map(Polygon::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

/// Maximum simplification tolerance applied when bounding a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMargin {
    meters: f64,
}

impl ErrorMargin {
    pub fn meters(meters: f64) -> Result<Self, GeometryError> {
        if !meters.is_finite() || meters <= 0.0 {
            return Err(GeometryError::InvalidMargin(meters));
        }
        Ok(Self { meters })
    }

    pub fn as_meters(&self) -> f64 {
        self.meters
    }
}

impl Default for ErrorMargin {
    fn default() -> Self {
        Self {
            meters: crate::config::DEFAULT_ERROR_MARGIN_METERS,
        }
    }
}

/// The caller's area of interest.
///
/// Immutable once built; the polygon drives clipping, the margin-expanded
/// bounding box drives collection filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    geometry: Geometry,
    margin: ErrorMargin,
    bounds: BoundingBox,
}

impl Region {
    /// Build a region, rejecting empty geometries.
    pub fn new(geometry: Geometry, margin: ErrorMargin) -> Result<Self, GeometryError> {
        if geometry.is_empty() {
            return Err(GeometryError::Empty);
        }
        let bounds = geometry
            .bounds()
            .ok_or(GeometryError::Empty)?
            .expand_meters(margin.as_meters());

        Ok(Self {
            geometry,
            margin,
            bounds,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn margin(&self) -> ErrorMargin {
        self.margin
    }

    /// Bounding geometry used to filter collections.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}
