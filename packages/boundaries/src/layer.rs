//! Boundary layer loading from `GeoJSON` feature collections.
//!
//! A layer holds every administrative unit of one level (1 or 2) across
//! all countries, keyed by the numeric unit code carried in the feature
//! properties (`ADM1_CODE` / `ADM2_CODE`).

use std::collections::BTreeMap;

use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};

use crate::BoundaryError;

/// Administrative hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdminLevel {
    /// First-level subdivision (region, province, state).
    Level1,
    /// Second-level subdivision (district, county).
    Level2,
}

impl AdminLevel {
    /// Numeric representation used in output files.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Level1 => 1,
            Self::Level2 => 2,
        }
    }
}

/// One administrative unit: its identity plus boundary geometry.
#[derive(Debug, Clone)]
pub struct AdminUnit {
    /// Globally unique numeric code for this unit at its level.
    pub code: i64,
    /// Unit display name.
    pub name: String,
    /// Owning country ISO3 code.
    pub iso3: String,
    /// For level-2 units, the parent level-1 code.
    pub adm1_code: Option<i64>,
    /// Boundary geometry in lon/lat degrees.
    pub geometry: MultiPolygon<f64>,
}

/// All units of one administrative level, indexed by code and country.
#[derive(Debug)]
pub struct BoundaryLayer {
    level: AdminLevel,
    by_code: BTreeMap<i64, AdminUnit>,
    codes_by_country: BTreeMap<String, Vec<i64>>,
}

impl BoundaryLayer {
    /// Parses a `GeoJSON` feature collection into a layer.
    ///
    /// Level-1 features carry `ADM1_CODE`/`ADM1_NAME`; level-2 features
    /// carry `ADM2_CODE`/`ADM2_NAME` plus their parent `ADM1_CODE`.
    /// Both carry `iso3`. Features with unparsable geometry are skipped
    /// with a warning; missing required properties are an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the `GeoJSON` is malformed or a feature lacks
    /// the required code, name, or ISO3 properties.
    pub fn from_geojson(level: AdminLevel, raw: &str) -> Result<Self, BoundaryError> {
        let geojson: GeoJson = raw.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        let mut by_code = BTreeMap::new();
        let mut codes_by_country: BTreeMap<String, Vec<i64>> = BTreeMap::new();

        for feature in collection.features {
            let (code_key, name_key) = match level {
                AdminLevel::Level1 => ("ADM1_CODE", "ADM1_NAME"),
                AdminLevel::Level2 => ("ADM2_CODE", "ADM2_NAME"),
            };

            let code = require_i64(&feature, code_key)?;
            let name = require_str(&feature, name_key)?;
            let iso3 = require_str(&feature, "iso3")?;
            let adm1_code = match level {
                AdminLevel::Level1 => None,
                AdminLevel::Level2 => Some(require_i64(&feature, "ADM1_CODE")?),
            };

            let Some(geometry) = feature.geometry.as_ref().and_then(to_multipolygon) else {
                log::warn!("Skipping unit {code} ({name}): no usable polygon geometry");
                continue;
            };

            codes_by_country.entry(iso3.clone()).or_default().push(code);
            by_code.insert(
                code,
                AdminUnit {
                    code,
                    name,
                    iso3,
                    adm1_code,
                    geometry,
                },
            );
        }

        log::info!(
            "Loaded {} level-{} units across {} countries",
            by_code.len(),
            level.as_number(),
            codes_by_country.len()
        );

        Ok(Self {
            level,
            by_code,
            codes_by_country,
        })
    }

    /// The administrative level of this layer.
    #[must_use]
    pub const fn level(&self) -> AdminLevel {
        self.level
    }

    /// Number of units in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the layer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Looks up a unit by its code.
    #[must_use]
    pub fn unit(&self, code: i64) -> Option<&AdminUnit> {
        self.by_code.get(&code)
    }

    /// All units belonging to one country, in code order.
    pub fn units_for_country(&self, iso3: &str) -> impl Iterator<Item = &AdminUnit> {
        self.codes_by_country
            .get(iso3)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|code| self.by_code.get(code))
    }

    /// Iterates over every unit in the layer.
    pub fn units(&self) -> impl Iterator<Item = &AdminUnit> {
        self.by_code.values()
    }

    /// Checks that every level-2 unit's parent exists in the level-1 layer.
    ///
    /// # Errors
    ///
    /// Returns the first unit whose `ADM1_CODE` has no match.
    pub fn validate_hierarchy(&self, level1: &Self) -> Result<(), BoundaryError> {
        for unit in self.by_code.values() {
            if let Some(adm1_code) = unit.adm1_code {
                if level1.unit(adm1_code).is_none() {
                    return Err(BoundaryError::MissingParent {
                        adm2_code: unit.code,
                        adm1_code,
                    });
                }
            }
        }
        Ok(())
    }
}

fn require_i64(feature: &geojson::Feature, key: &str) -> Result<i64, BoundaryError> {
    feature
        .property(key)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| BoundaryError::MalformedFeature {
            message: format!("missing numeric property {key}"),
        })
}

fn require_str(feature: &geojson::Feature, key: &str) -> Result<String, BoundaryError> {
    feature
        .property(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BoundaryError::MalformedFeature {
            message: format!("missing string property {key}"),
        })
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
