#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gazetteer resolution for location mentions.
//!
//! Sends each mention to the `GeoNames` fuzzy search endpoint, filtered
//! to the mention's country, and records the best hit's coordinates,
//! canonical place name, and first-level admin name. The public service
//! allows 1000 requests per hour per account, so the client runs behind
//! a [`RateLimiter`] budgeted at 900 per rolling hour with a minimum
//! spacing between requests.
//!
//! Long runs survive interruption through chunked CSV checkpoints (see
//! [`chunks`]): results are flushed every [`chunks::CHUNK_SIZE`] rows and
//! a restarted run resumes past the last complete chunk.

pub mod chunks;
pub mod client;
pub mod countries;
pub mod rate_limit;
pub mod resolver;

use thiserror::Error;

pub use client::{GeoNamesClient, SearchTransport};
pub use rate_limit::RateLimiter;
pub use resolver::{GeocodedCandidate, Resolver};

/// Errors from gazetteer operations.
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// A mention's ISO3 code has no alpha-2 mapping. This is a
    /// configuration gap, not a transient failure, so the run aborts.
    #[error("No alpha-2 mapping for country {iso3}")]
    UnknownCountry {
        /// The unmapped ISO3 code.
        iso3: String,
    },

    /// Checkpoint file I/O failed.
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint CSV encoding or decoding failed.
    #[error("Checkpoint CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One gazetteer hit for a searched mention.
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerPlace {
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Canonical place name as the gazetteer spells it.
    pub name: String,
    /// First-level administrative division containing the place.
    pub admin1: String,
}
