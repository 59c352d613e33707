//! Final output writers: `GeoJSON` layers and the comparison CSV.

use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::{Map, Value, json};

use crate::compare::ComparisonRow;
use crate::footprint::NationalFootprint;
use crate::{PipelineError, ResolvedLocation};

/// Builds the sub-national layer: one feature per event × region.
#[must_use]
pub fn subnational_collection(locations: &[ResolvedLocation]) -> FeatureCollection {
    let features = locations
        .iter()
        .map(|location| {
            feature(
                &location.geometry,
                json!({
                    "dis_no": location.dis_no.as_str(),
                    "iso3": location.iso3,
                    "adm_level": location.level.as_number(),
                    "adm_code": location.code,
                    "adm_name": location.name,
                    "location": location.mention,
                    "quality": location.quality,
                }),
            )
        })
        .collect();
    collection(features)
}

/// Builds the national layer: one feature per event.
#[must_use]
pub fn national_collection(footprints: &[NationalFootprint]) -> FeatureCollection {
    let features = footprints
        .iter()
        .map(|fp| {
            feature(
                &fp.geometry,
                json!({
                    "dis_no": fp.dis_no.as_str(),
                    "iso3": fp.iso3,
                    "adm_names": fp.names,
                    "adm_codes": fp.codes,
                    "adm_levels": fp.levels,
                    "quality": fp.quality,
                    "regional_flags": fp.regional_flags,
                }),
            )
        })
        .collect();
    collection(features)
}

/// Writes a feature collection to a `GeoJSON` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_geojson(path: &Path, fc: FeatureCollection) -> Result<(), PipelineError> {
    let text = GeoJson::FeatureCollection(fc).to_string();
    std::fs::write(path, text)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Writes the comparison report as CSV.
///
/// # Errors
///
/// Returns an error if the file cannot be written or a row cannot be
/// encoded.
pub fn write_comparison_csv(path: &Path, rows: &[ComparisonRow]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} comparison rows to {}", rows.len(), path.display());
    Ok(())
}

fn feature(geometry: &geo::MultiPolygon<f64>, properties: Value) -> Feature {
    let properties: Map<String, Value> = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};
    use geo_disasters_boundaries::AdminLevel;
    use geo_disasters_catalog::EventKey;

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]])
    }

    fn location() -> ResolvedLocation {
        ResolvedLocation {
            dis_no: EventKey::parse("2000-0001-AAA").unwrap(),
            iso3: "AAA".to_string(),
            level: AdminLevel::Level1,
            code: 10,
            name: "Alpha".to_string(),
            mention: Some("alpha".to_string()),
            quality: 2,
            geometry: unit_square(),
        }
    }

    #[test]
    fn subnational_features_carry_the_full_schema() {
        let fc = subnational_collection(&[location()]);
        assert_eq!(fc.features.len(), 1);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["dis_no"], "2000-0001-AAA");
        assert_eq!(props["adm_level"], 1);
        assert_eq!(props["adm_code"], 10);
        assert_eq!(props["quality"], 2);
        assert!(fc.features[0].geometry.is_some());
    }

    #[test]
    fn geojson_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subnational.geojson");
        write_geojson(&path, subnational_collection(&[location()])).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        assert!(matches!(parsed, GeoJson::FeatureCollection(fc) if fc.features.len() == 1));
    }

    #[test]
    fn comparison_csv_has_one_line_per_row_plus_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.csv");
        let row = ComparisonRow {
            dis_no: EventKey::parse("2000-0001-AAA").unwrap(),
            area_km2: 100.0,
            reference_area_km2: 90.0,
            absolute_mismatch_km2: 10.0,
            mismatch_fraction: 0.111,
            over_threshold: true,
            levels: "1".to_string(),
            reference_levels: "1 - 2".to_string(),
            quality: 2,
            reference_quality: 1,
        };
        write_comparison_csv(&path, &[row]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("2000-0001-AAA"));
    }
}
