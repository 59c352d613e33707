#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result consolidation and geometry finalization.
//!
//! Locations arrive from three independent resolution paths: explicit
//! admin codes embedded in the catalog (quality 1), coordinate-derived
//! spatial matches (quality 2/3) and name-only disambiguation (quality
//! 2–4). This crate merges them into one schema, joins and finalizes
//! boundary geometry, dissolves per-event national footprints, applies
//! the event-level filters, and produces the cross-dataset comparison
//! report plus the final `GeoJSON` layers.

pub mod compare;
pub mod consolidate;
pub mod explicit;
pub mod filters;
pub mod footprint;
pub mod output;

use geo::MultiPolygon;
use geo_disasters_boundaries::AdminLevel;
use geo_disasters_catalog::EventKey;
use geo_disasters_matcher::NameMatch;
use thiserror::Error;

pub use compare::{ComparisonRow, compare};
pub use consolidate::{Consolidated, consolidate};
pub use footprint::{NationalFootprint, dissolve_national};

/// Errors from consolidation and output writing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Boundary layer loading failed.
    #[error(transparent)]
    Boundary(#[from] geo_disasters_boundaries::BoundaryError),

    /// Catalog parsing failed.
    #[error(transparent)]
    Catalog(#[from] geo_disasters_catalog::CatalogError),
}

/// A resolved location awaiting geometry join.
///
/// The common schema of all three resolution paths. `mention` is absent
/// for the explicit-code path, which never went through geocoding.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLocation {
    /// Owning event key.
    pub dis_no: EventKey,
    /// Country ISO3 code.
    pub iso3: String,
    /// Administrative level of the chosen unit.
    pub level: AdminLevel,
    /// Chosen unit code.
    pub code: i64,
    /// Chosen unit name.
    pub name: String,
    /// Original mention text, when the location was geocoded.
    pub mention: Option<String>,
    /// Quality flag, 1 (explicit code) to 4 (gazetteer only).
    pub quality: u8,
}

impl From<NameMatch> for PendingLocation {
    fn from(m: NameMatch) -> Self {
        Self {
            dis_no: m.dis_no,
            iso3: m.iso3,
            level: m.level,
            code: m.code,
            name: m.name,
            mention: Some(m.mention),
            quality: m.quality,
        }
    }
}

/// A final output row: one event × one administrative unit.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    /// Owning event key.
    pub dis_no: EventKey,
    /// Country ISO3 code.
    pub iso3: String,
    /// Administrative level of the unit.
    pub level: AdminLevel,
    /// Unit code.
    pub code: i64,
    /// Unit name.
    pub name: String,
    /// Original mention text, when geocoded.
    pub mention: Option<String>,
    /// Quality flag.
    pub quality: u8,
    /// Finalized (simplified, valid) boundary geometry.
    pub geometry: MultiPolygon<f64>,
}
