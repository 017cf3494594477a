use approx::assert_relative_eq;
use assert_matches::assert_matches;
use geo::{
    Area, Geometry, GeometryCollection, LineString, MultiPolygon, Point, Polygon, Validation,
    polygon,
};

use imagery_catalog::error::CatalogError;
use imagery_catalog::geometry::{is_polygonal, point_count, repair, simplify};

fn circle(cx: f64, cy: f64, radius: f64, vertices: usize) -> Polygon<f64> {
    let mut ring: Vec<(f64, f64)> = (0..vertices)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / vertices as f64;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString::from(ring), vec![])
}

#[test]
fn valid_multipolygon_is_untouched() {
    let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![
        circle(0.0, 0.0, 1.0, 32),
        circle(5.0, 5.0, 1.0, 32),
    ]));
    assert_eq!(repair("multi", Some(multi.clone())).unwrap(), Some(multi));
}

#[test]
fn overlapping_members_are_merged() {
    let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
        Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]),
        Geometry::Polygon(polygon![
            (x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0), (x: 1.0, y: 1.0),
        ]),
        Geometry::Point(Point::new(10.0, 10.0)),
    ]));

    let repaired = repair("overlap", Some(collection)).unwrap().unwrap();
    assert!(is_polygonal(&repaired));
    assert!(repaired.is_valid());
    assert_relative_eq!(repaired.unsigned_area(), 7.0, epsilon = 1e-9);
}

#[test]
fn collection_without_area_fails() {
    let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
        Geometry::Point(Point::new(0.0, 0.0)),
        Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
    ]));

    let err = repair("lines", Some(collection)).unwrap_err();
    assert_matches!(err, CatalogError::InvalidGeometry { ref id, .. } if id == "lines");
}

#[test]
fn simplify_null_is_null() {
    assert_eq!(simplify("none", None, 0.01).unwrap(), None);
}

#[test]
fn simplify_reduces_dense_rings() {
    let dense = Geometry::Polygon(circle(10.0, 50.0, 2.0, 2000));
    let before = point_count(&dense);

    let simplified = simplify("dense", Some(dense), 0.01).unwrap().unwrap();
    assert!(is_polygonal(&simplified));
    assert!(simplified.is_valid());
    assert!(point_count(&simplified) < before);
}

#[test]
fn simplify_with_zero_tolerance_keeps_vertices() {
    let shape = Geometry::Polygon(circle(0.0, 0.0, 1.0, 64));
    let simplified = simplify("exact", Some(shape.clone()), 0.0).unwrap();
    assert_eq!(simplified, Some(shape));
}
