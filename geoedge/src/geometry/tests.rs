//! Tests for region geometry

use super::*;
use serde_json::json;

fn square(min_lon: f64, min_lat: f64, size: f64) -> Polygon {
    BoundingBox::new(min_lon, min_lat, min_lon + size, min_lat + size).to_polygon()
}

#[test]
fn test_square_area_and_containment() {
    let poly = square(10.0, 20.0, 1.0);

    assert!((poly.area() - 1.0).abs() < 1e-12);
    assert!(poly.contains(&Point::new(10.5, 20.5)));
    assert!(!poly.contains(&Point::new(11.5, 20.5)));
    assert!(!poly.is_empty());
}

#[test]
fn test_hole_excludes_points() {
    let outer = square(0.0, 0.0, 4.0);
    let hole = square(1.0, 1.0, 2.0);
    let poly = Polygon::new(outer.exterior, vec![hole.exterior]);

    assert!((poly.area() - 12.0).abs() < 1e-12);
    assert!(!poly.contains(&Point::new(2.0, 2.0)));
    assert!(poly.contains(&Point::new(0.5, 0.5)));
}

#[test]
fn test_degenerate_polygon_is_empty() {
    let line = Polygon::new(
        vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(0.0, 0.0)],
        vec![],
    );
    assert!(line.is_empty());
    assert!(Geometry::polygon(line).is_empty());
    assert!(Geometry { polygons: vec![] }.is_empty());
}

#[test]
fn test_self_intersecting_ring_is_not_empty() {
    // Two triangular lobes meeting at (1, 1); their signed areas cancel.
    let bowtie = Polygon::new(
        vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(0.0, 0.0),
        ],
        Vec::new(),
    );

    assert_eq!(bowtie.area(), 0.0);
    assert!(!bowtie.is_empty());
    assert!(bowtie.contains(&Point::new(1.5, 1.0)));
    assert!(bowtie.contains(&Point::new(0.5, 1.0)));

    let region = Region::new(Geometry::polygon(bowtie), ErrorMargin::default());
    assert!(region.is_ok());
}

#[test]
fn test_hole_covering_exterior_is_empty() {
    let hollow = Polygon::new(square(0.0, 0.0, 1.0).exterior, vec![square(0.0, 0.0, 1.0).exterior]);
    assert!(hollow.is_empty());
}

#[test]
fn test_bounding_box_intersection_and_containment() {
    let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
    let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
    let c = BoundingBox::new(2.5, 2.5, 3.0, 3.0);

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(a.intersects(&BoundingBox::new(2.0, 0.0, 4.0, 1.0)), "touching edges intersect");
    assert!(a.contains_box(&BoundingBox::new(0.5, 0.5, 1.5, 1.5)));
    assert!(!a.contains_box(&b));
}

#[test]
fn test_expand_meters_grows_every_side() {
    let bbox = BoundingBox::new(10.0, 45.0, 10.1, 45.1);
    let expanded = bbox.expand_meters(10_000.0);

    let dlat = 10_000.0 / METERS_PER_DEGREE;
    assert!((bbox.min_lat - expanded.min_lat - dlat).abs() < 1e-9);
    assert!((expanded.max_lat - bbox.max_lat - dlat).abs() < 1e-9);
    // A degree of longitude is shorter than a degree of latitude at 45°N.
    assert!(bbox.min_lon - expanded.min_lon > dlat);
    assert!(expanded.contains_box(&bbox));
}

#[test]
fn test_expand_meters_clamps_to_valid_range() {
    let bbox = BoundingBox::new(179.9, 89.9, 180.0, 90.0);
    let expanded = bbox.expand_meters(50_000.0);

    assert_eq!(expanded.max_lon, MAX_LON);
    assert_eq!(expanded.max_lat, MAX_LAT);
    assert!(expanded.min_lon >= MIN_LON);
}

#[test]
fn test_region_rejects_empty_geometry() {
    let result = Region::new(Geometry { polygons: vec![] }, ErrorMargin::default());
    assert_eq!(result.unwrap_err(), GeometryError::Empty);
}

#[test]
fn test_error_margin_must_be_positive() {
    assert!(ErrorMargin::meters(0.0).is_err());
    assert!(ErrorMargin::meters(f64::NAN).is_err());
    assert_eq!(ErrorMargin::meters(250.0).unwrap().as_meters(), 250.0);
    assert_eq!(ErrorMargin::default().as_meters(), 10_000.0);
}

#[test]
fn test_region_bounds_cover_any_footprint_containing_the_region() {
    let region = Region::new(
        Geometry::polygon(square(-122.5, 37.7, 0.1)),
        ErrorMargin::default(),
    )
    .unwrap();

    // Footprints that contain the region, from tight to generous.
    for pad in [0.0, 0.01, 0.5, 3.0] {
        let footprint = BoundingBox::new(-122.5 - pad, 37.7 - pad, -122.4 + pad, 37.8 + pad);
        assert!(region.bounds().intersects(&footprint), "pad {pad}");
    }
    let polygon_bounds = region.geometry().bounds().unwrap();
    assert!(region.bounds().contains_box(&polygon_bounds));
}

#[test]
fn test_parse_polygon_geojson() {
    let value = json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
    });

    let geometry = Geometry::from_geojson(&value).unwrap();
    assert_eq!(geometry.polygons.len(), 1);
    assert_eq!(geometry.polygons[0].exterior.len(), 5);
    assert!(geometry.contains(&Point::new(0.5, 0.5)));
}

#[test]
fn test_parse_feature_and_feature_collection() {
    let polygon = json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
    });
    let feature = json!({ "type": "Feature", "properties": {}, "geometry": polygon });
    let collection = json!({ "type": "FeatureCollection", "features": [feature.clone(), feature.clone()] });

    assert_eq!(Geometry::from_geojson(&feature).unwrap().polygons.len(), 1);
    assert_eq!(Geometry::from_geojson(&collection).unwrap().polygons.len(), 2);
}

#[test]
fn test_parse_multipolygon_with_hole() {
    let value = json!({
        "type": "MultiPolygon",
        "coordinates": [
            [
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]]
            ],
            [[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0], [10.0, 10.0]]]
        ]
    });

    let geometry = Geometry::from_geojson(&value).unwrap();
    assert_eq!(geometry.polygons.len(), 2);
    assert_eq!(geometry.polygons[0].holes.len(), 1);
    assert!(!geometry.contains(&Point::new(2.0, 2.0)));
}

#[test]
fn test_parse_rejects_bad_input() {
    let point = json!({ "type": "Point", "coordinates": [0.0, 0.0] });
    assert!(matches!(
        Geometry::from_geojson(&point),
        Err(GeometryError::UnsupportedType(t)) if t == "Point"
    ));

    let out_of_range = json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [200.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
    });
    assert!(matches!(
        Geometry::from_geojson(&out_of_range),
        Err(GeometryError::OutOfRange { .. })
    ));

    assert!(Geometry::from_geojson(&json!({ "coordinates": [] })).is_err());
    assert!(Geometry::from_geojson(&json!({ "type": "Feature", "geometry": null })).is_err());
    assert!(Geometry::from_geojson(&json!({ "type": "Polygon", "coordinates": [[["a", 1]]] })).is_err());
}

#[test]
fn test_geometry_serializes_as_multipolygon() {
    let geometry = Geometry::polygon(square(0.0, 0.0, 1.0));
    let value = serde_json::to_value(&geometry).unwrap();

    assert_eq!(value["type"], "MultiPolygon");
    assert_eq!(value["coordinates"][0][0][2], json!([1.0, 1.0]));

    let back: Geometry = serde_json::from_value(value).unwrap();
    assert_eq!(back, geometry);
}
