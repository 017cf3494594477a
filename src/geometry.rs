use geo::{
    BooleanOps, Coord, CoordsIter, Geometry, LineString, MapCoords, MultiPolygon, Polygon,
    Simplify, Validation,
};
use tracing::debug;

use crate::error::CatalogError;

/// Turns `geometry` into a valid Polygon or MultiPolygon.
///
/// `None` passes through. Valid polygonal input is returned untouched. Anything else is
/// reduced to its polygonal members, which are healed and merged with a union; points and
/// lines are dropped. Fails when nothing polygonal survives or the union is still invalid.
pub fn repair(
    id: &str,
    geometry: Option<Geometry<f64>>,
) -> Result<Option<Geometry<f64>>, CatalogError> {
    let Some(geometry) = geometry else {
        return Ok(None);
    };
    if is_polygonal(&geometry) && geometry.is_valid() {
        return Ok(Some(geometry));
    }

    let kind = geometry_kind(&geometry);
    let mut members = Vec::new();
    collect_polygons(geometry, &mut members);
    members.retain(|polygon| !polygon.exterior().0.is_empty());

    if members.is_empty() {
        return Err(CatalogError::invalid_geometry(
            id,
            format!("{kind} has no polygonal area"),
        ));
    }
    if members.len() == 1 && members[0].is_valid() {
        debug!(source = id, "kept the only polygon of {kind}");
        return Ok(members.pop().map(Geometry::Polygon));
    }

    let merged = members
        .iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| acc.union(polygon));
    if merged.0.is_empty() {
        return Err(CatalogError::invalid_geometry(
            id,
            format!("{kind} collapsed to an empty area during repair"),
        ));
    }
    if !merged.is_valid() {
        return Err(CatalogError::invalid_geometry(
            id,
            format!("{kind} is still invalid after repair"),
        ));
    }
    debug!(
        source = id,
        parts = merged.0.len(),
        "repaired invalid {kind}"
    );

    Ok(Some(into_polygonal(merged)))
}

/// Douglas-Peucker simplification with `tolerance`, followed by [`repair`].
pub fn simplify(
    id: &str,
    geometry: Option<Geometry<f64>>,
    tolerance: f64,
) -> Result<Option<Geometry<f64>>, CatalogError> {
    let Some(geometry) = geometry else {
        return Ok(None);
    };
    if tolerance <= 0.0 {
        return repair(id, Some(geometry));
    }

    let before = geometry.coords_count();
    let simplified = match geometry {
        Geometry::Polygon(polygon) => Geometry::Polygon(simplify_polygon(&polygon, tolerance)),
        Geometry::MultiPolygon(multi) => Geometry::MultiPolygon(MultiPolygon::new(
            multi
                .iter()
                .map(|polygon| simplify_polygon(polygon, tolerance))
                .collect(),
        )),
        other => other,
    };
    let repaired = repair(id, Some(simplified))?;
    if let Some(after) = repaired.as_ref().map(|g| g.coords_count()) {
        debug!(source = id, before, after, "simplified geometry");
    }
    Ok(repaired)
}

// Rings that would lose their area keep their original shape (exteriors) or are
// dropped (holes).
fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = polygon.exterior().simplify(&tolerance);
    let exterior = if is_ring(&exterior) {
        exterior
    } else {
        polygon.exterior().clone()
    };
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| ring.simplify(&tolerance))
        .filter(is_ring)
        .collect();
    Polygon::new(exterior, interiors)
}

fn is_ring(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4
}

pub fn point_count(geometry: &Geometry<f64>) -> usize {
    geometry.coords_count()
}

pub fn is_polygonal(geometry: &Geometry<f64>) -> bool {
    matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
}

/// Rounds every coordinate to `precision` decimal digits.
pub fn round_coordinates(geometry: &Geometry<f64>, precision: u32) -> Geometry<f64> {
    let factor = 10f64.powi(precision as i32);
    geometry.map_coords(|Coord { x, y }| Coord {
        x: (x * factor).round() / factor,
        y: (y * factor).round() / factor,
    })
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => out.push(polygon),
        Geometry::MultiPolygon(multi) => out.extend(multi),
        Geometry::Rect(rect) => out.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => out.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for member in collection {
                collect_polygons(member, out);
            }
        }
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => {}
    }
}

fn into_polygonal(mut multi: MultiPolygon<f64>) -> Geometry<f64> {
    if multi.0.len() == 1 {
        if let Some(polygon) = multi.0.pop() {
            return Geometry::Polygon(polygon);
        }
    }
    Geometry::MultiPolygon(multi)
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
