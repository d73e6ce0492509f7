//! Region geometry.
//!
//! Polygons in lon/lat degrees, their bounding boxes, and the [`Region`]
//! type that carries a request's area of interest through the pipeline.

mod geojson;
mod types;

pub use types::{
    BoundingBox, ErrorMargin, Geometry, GeometryError, Point, Polygon, Region, MAX_LAT, MAX_LON,
    METERS_PER_DEGREE, MIN_LAT, MIN_LON,
};

#[cfg(test)]
mod tests;
