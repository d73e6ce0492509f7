//! GeoJSON conversion for [`Geometry`].
//!
//! Accepts `Polygon`, `MultiPolygon`, a `Feature` wrapping either, or a
//! `FeatureCollection` (polygons of every feature are combined). Output is
//! always a `MultiPolygon`.

use serde_json::{json, Value};

use super::types::{Geometry, GeometryError, Point, Polygon};

impl Geometry {
    /// Parse a GeoJSON document into a geometry.
    pub fn from_geojson(value: &Value) -> Result<Self, GeometryError> {
        let polygons = polygons_of(value)?;
        Ok(Self { polygons })
    }

    /// Render as a GeoJSON `MultiPolygon` geometry object.
    pub fn to_geojson(&self) -> Value {
        let coordinates: Vec<Value> = self
            .polygons
            .iter()
            .map(|polygon| {
                let rings: Vec<Value> = std::iter::once(&polygon.exterior)
                    .chain(polygon.holes.iter())
                    .map(|ring| ring_to_value(ring))
                    .collect();
                Value::Array(rings)
            })
            .collect();

        json!({ "type": "MultiPolygon", "coordinates": coordinates })
    }
}

impl From<Geometry> for Value {
    fn from(geometry: Geometry) -> Self {
        geometry.to_geojson()
    }
}

impl TryFrom<Value> for Geometry {
    type Error = GeometryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Geometry::from_geojson(&value)
    }
}

fn polygons_of(value: &Value) -> Result<Vec<Polygon>, GeometryError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::Malformed("missing 'type' member".to_string()))?;

    match kind {
        "Feature" => {
            let geometry = value
                .get("geometry")
                .filter(|g| !g.is_null())
                .ok_or_else(|| GeometryError::Malformed("feature has no geometry".to_string()))?;
            polygons_of(geometry)
        }
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| GeometryError::Malformed("missing 'features' array".to_string()))?;
            let mut polygons = Vec::new();
            for feature in features {
                polygons.extend(polygons_of(feature)?);
            }
            Ok(polygons)
        }
        "Polygon" => Ok(vec![parse_polygon(coordinates(value)?)?]),
        "MultiPolygon" => coordinates(value)?
            .as_array()
            .ok_or_else(|| GeometryError::Malformed("MultiPolygon coordinates must be an array".to_string()))?
            .iter()
            .map(parse_polygon)
            .collect(),
        other => Err(GeometryError::UnsupportedType(other.to_string())),
    }
}

fn coordinates(value: &Value) -> Result<&Value, GeometryError> {
    value
        .get("coordinates")
        .ok_or_else(|| GeometryError::Malformed("missing 'coordinates' member".to_string()))
}

fn parse_polygon(value: &Value) -> Result<Polygon, GeometryError> {
    let rings = value
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("polygon must be an array of rings".to_string()))?;

    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| GeometryError::Malformed("polygon has no exterior ring".to_string()))??;
    let holes = rings.collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, holes))
}

fn parse_ring(value: &Value) -> Result<Vec<Point>, GeometryError> {
    let positions = value
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("ring must be an array of positions".to_string()))?;

    positions
        .iter()
        .map(|position| {
            let pair = position.as_array().filter(|p| p.len() >= 2).ok_or_else(|| {
                GeometryError::Malformed(format!("invalid position {}", position))
            })?;
            let lon = pair[0].as_f64();
            let lat = pair[1].as_f64();
            let (Some(lon), Some(lat)) = (lon, lat) else {
                return Err(GeometryError::Malformed(format!(
                    "non-numeric position {}",
                    position
                )));
            };
            let point = Point::new(lon, lat);
            if !point.is_valid() {
                return Err(GeometryError::OutOfRange { lon, lat });
            }
            Ok(point)
        })
        .collect()
}

fn ring_to_value(ring: &[Point]) -> Value {
    Value::Array(ring.iter().map(|p| json!([p.lon, p.lat])).collect())
}
