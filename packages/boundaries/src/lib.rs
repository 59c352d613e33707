#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary reference data.
//!
//! Loads the level-1 (region) and level-2 (sub-region) boundary layers
//! from `GeoJSON`, validates the level-2 → level-1 parent hierarchy,
//! builds R-tree spatial indexes for point-in-polygon matching, and
//! provides the geometry utilities (repair, simplification, bounding
//! boxes, spherical area) the downstream consolidation stage needs.

pub mod geometry;
pub mod index;
pub mod layer;

use thiserror::Error;

pub use index::SpatialIndex;
pub use layer::{AdminLevel, AdminUnit, BoundaryLayer};

/// Errors from boundary-layer loading and validation.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A feature is missing a required property or geometry.
    #[error("Malformed boundary feature: {message}")]
    MalformedFeature {
        /// Description of what is missing.
        message: String,
    },

    /// A level-2 unit references a level-1 parent that does not exist.
    #[error("Unit {adm2_code} references missing level-1 parent {adm1_code}")]
    MissingParent {
        /// The level-2 unit code.
        adm2_code: i64,
        /// The referenced level-1 code.
        adm1_code: i64,
    },
}
