//! R-tree point-in-polygon index over a boundary layer.

use geo::{BoundingRect, Contains, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

use crate::layer::BoundaryLayer;

/// A boundary polygon stored in the R-tree with its unit code.
struct IndexEntry {
    code: i64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over one administrative level.
///
/// Constructed once per layer and shared across the whole matching run.
/// Administrative units of a single level tile their country without
/// overlap, so the first containing polygon wins.
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl SpatialIndex {
    /// Builds the index from every unit in a layer.
    #[must_use]
    pub fn build(layer: &BoundaryLayer) -> Self {
        let entries: Vec<IndexEntry> = layer
            .units()
            .map(|unit| IndexEntry {
                code: unit.code,
                envelope: compute_envelope(&unit.geometry),
                polygon: unit.geometry.clone(),
            })
            .collect();

        log::info!(
            "Built spatial index with {} level-{} polygons",
            entries.len(),
            layer.level().as_number()
        );

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Looks up the unit code containing a point, if any.
    #[must_use]
    pub fn locate(&self, lng: f64, lat: f64) -> Option<i64> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                return Some(entry.code);
            }
        }
        None
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::AdminLevel;

    fn two_square_layer() -> BoundaryLayer {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"ADM1_CODE":100,"ADM1_NAME":"West","iso3":"AAA"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type":"Feature","properties":{"ADM1_CODE":200,"ADM1_NAME":"East","iso3":"AAA"},"geometry":{"type":"Polygon","coordinates":[[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
        ]}"#;
        BoundaryLayer::from_geojson(AdminLevel::Level1, raw).unwrap()
    }

    #[test]
    fn locates_point_inside_polygon() {
        let index = SpatialIndex::build(&two_square_layer());
        assert_eq!(index.locate(0.5, 0.5), Some(100));
        assert_eq!(index.locate(2.5, 0.5), Some(200));
    }

    #[test]
    fn returns_none_outside_all_polygons() {
        let index = SpatialIndex::build(&two_square_layer());
        assert_eq!(index.locate(1.5, 0.5), None);
        assert_eq!(index.locate(-10.0, 40.0), None);
    }
}
