//! Geometry utilities for output polygon preparation.
//!
//! Event footprints get simplified for output size, repaired when the
//! simplification (or the source data) produces self-intersections, and
//! measured on the sphere for the cross-source comparison report.

use geo::{BooleanOps, BoundingRect, ChamberlainDuquetteArea, MultiPolygon, Simplify, Validation};

/// Douglas-Peucker tolerance in degrees for output geometries.
pub const SIMPLIFY_TOLERANCE_DEG: f64 = 0.005;

/// Simplifies a footprint for output, repairing it if needed.
#[must_use]
pub fn simplify_for_output(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    repair(&geometry.simplify(SIMPLIFY_TOLERANCE_DEG))
}

/// Returns a valid version of the geometry.
///
/// Valid input passes through untouched. Invalid input (self-touching
/// rings, bowties) is resolved by a union against the empty set, which
/// re-noded through the boolean-ops overlay yields a valid polygon
/// covering the same region.
#[must_use]
pub fn repair(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if geometry.is_valid() {
        return geometry.clone();
    }
    log::debug!("Repairing invalid geometry via empty-set union");
    geometry.union(&MultiPolygon::new(Vec::new()))
}

/// Dissolves a set of footprints into one geometry.
#[must_use]
pub fn dissolve(geometries: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    geometries
        .iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, g| acc.union(g))
}

/// Whether `inner`'s bounding box lies entirely within `outer`'s.
///
/// Used to drop redundant sub-region rows already covered by a region
/// row of the same event. Bounding boxes are a deliberate approximation
/// matching the coverage check done at export time.
#[must_use]
pub fn bbox_within(inner: &MultiPolygon<f64>, outer: &MultiPolygon<f64>) -> bool {
    let (Some(inner_rect), Some(outer_rect)) = (inner.bounding_rect(), outer.bounding_rect())
    else {
        return false;
    };
    inner_rect.min().x >= outer_rect.min().x
        && inner_rect.min().y >= outer_rect.min().y
        && inner_rect.max().x <= outer_rect.max().x
        && inner_rect.max().y <= outer_rect.max().y
}

/// Spherical surface area in square kilometres.
#[must_use]
pub fn area_km2(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.chamberlain_duquette_unsigned_area() / 1_000_000.0
}
