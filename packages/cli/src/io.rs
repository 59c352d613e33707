//! File I/O glue for the pipeline stages.
//!
//! Reads the source catalog export, round-trips mention lists as CSV,
//! and reads national footprint layers back from `GeoJSON` for the
//! comparison stage.

use std::error::Error;
use std::path::Path;

use geo::MultiPolygon;
use geo_disasters_catalog::{DisasterEvent, EventKey};
use geo_disasters_locations::Mention;
use geo_disasters_pipeline::NationalFootprint;
use geojson::{FeatureCollection, GeoJson};
use serde::Deserialize;

/// One row of the catalog CSV export, with its original column headers.
#[derive(Debug, Deserialize)]
struct RawEventRecord {
    #[serde(rename = "DisNo.")]
    dis_no: String,
    #[serde(rename = "ISO")]
    iso3: String,
    #[serde(rename = "Disaster Group")]
    disaster_group: String,
    #[serde(rename = "Disaster Type")]
    disaster_type: String,
    #[serde(rename = "Disaster Subtype")]
    disaster_subtype: Option<String>,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "Admin Units")]
    admin_units: Option<String>,
    #[serde(rename = "Total Deaths")]
    total_deaths: Option<f64>,
    #[serde(rename = "Total Affected")]
    total_affected: Option<f64>,
    #[serde(rename = "Total Damage ('000 US$)")]
    total_damage: Option<f64>,
}

/// Reads catalog records from a CSV export.
///
/// Rows with malformed event keys are logged and skipped; one bad row
/// must not abort the batch.
pub fn read_events(path: &Path) -> Result<Vec<DisasterEvent>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();
    let mut skipped = 0_usize;

    for row in reader.deserialize::<RawEventRecord>() {
        let raw = row?;
        let dis_no = match EventKey::parse(&raw.dis_no) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Skipping catalog row: {e}");
                skipped += 1;
                continue;
            }
        };
        events.push(DisasterEvent {
            dis_no,
            iso3: raw.iso3,
            disaster_group: raw.disaster_group,
            disaster_type: raw.disaster_type,
            disaster_subtype: raw.disaster_subtype,
            location: raw.location,
            admin_units: raw.admin_units,
            total_deaths: raw.total_deaths,
            total_affected: raw.total_affected,
            total_damage: raw.total_damage,
        });
    }

    log::info!(
        "Read {} catalog records from {} ({skipped} skipped)",
        events.len(),
        path.display()
    );
    Ok(events)
}

/// Writes the split mention list as CSV.
pub fn write_mentions(path: &Path, mentions: &[Mention]) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for mention in mentions {
        writer.serialize(mention)?;
    }
    writer.flush()?;
    log::info!("Wrote {} mentions to {}", mentions.len(), path.display());
    Ok(())
}

/// Reads a mention list back.
pub fn read_mentions(path: &Path) -> Result<Vec<Mention>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut mentions = Vec::new();
    for row in reader.deserialize() {
        mentions.push(row?);
    }
    Ok(mentions)
}

/// Reads a national footprint layer from `GeoJSON`.
///
/// Expects the property schema this pipeline writes (`dis_no`, `iso3`,
/// `adm_names`, `adm_codes`, `adm_levels`, `quality`, `regional_flags`);
/// the reference dataset for comparison must be exported in the same
/// shape. Features with unusable geometry or properties are skipped
/// with a warning.
pub fn read_national(path: &Path) -> Result<Vec<NationalFootprint>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    let fc = FeatureCollection::try_from(geojson)?;

    let mut footprints = Vec::new();
    for feature in fc.features {
        let Some(dis_no) = feature
            .property("dis_no")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| EventKey::parse(s).ok())
        else {
            log::warn!("Skipping national feature without a valid dis_no");
            continue;
        };
        let Some(geometry) = feature.geometry.as_ref().and_then(to_multipolygon) else {
            log::warn!("{dis_no}: skipping feature without polygon geometry");
            continue;
        };

        footprints.push(NationalFootprint {
            dis_no,
            iso3: string_property(&feature, "iso3"),
            names: string_property(&feature, "adm_names"),
            codes: string_property(&feature, "adm_codes"),
            levels: list_property(&feature, "adm_levels"),
            quality: feature
                .property("quality")
                .and_then(serde_json::Value::as_u64)
                .and_then(|q| u8::try_from(q).ok())
                .unwrap_or(4),
            regional_flags: list_property(&feature, "regional_flags"),
            geometry,
        });
    }

    log::info!(
        "Read {} national footprints from {}",
        footprints.len(),
        path.display()
    );
    Ok(footprints)
}

fn string_property(feature: &geojson::Feature, key: &str) -> String {
    feature
        .property(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn list_property(feature: &geojson::Feature, key: &str) -> Vec<u8> {
    feature
        .property(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

fn to_multipolygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
