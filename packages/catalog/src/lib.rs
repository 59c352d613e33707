#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! EM-DAT disaster catalog types.
//!
//! A catalog record is identified by its `DisNo.` event key
//! (`YYYY-NNNN-ISO3`, e.g. `"1998-0012-USA"`) and carries the free-text
//! location field plus, for newer events, an embedded list of formal
//! admin-unit codes. Records are read once and immutable afterwards;
//! the only mutation the pipeline ever applies is the manual correction
//! data in [`corrections`].

pub mod admin_units;
pub mod corrections;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from catalog parsing and configuration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The embedded corrections TOML is malformed.
    #[error("Corrections config error: {0}")]
    Config(#[from] toml::de::Error),

    /// An event key does not follow the `YYYY-NNNN-ISO3` pattern.
    #[error("Malformed event key: {key}")]
    MalformedEventKey {
        /// The offending key.
        key: String,
    },

    /// An embedded admin-unit list entry is malformed.
    #[error("Malformed admin-unit list: {message}")]
    MalformedAdminUnits {
        /// Description of the parsing failure.
        message: String,
    },
}

/// A disaster event key: catalog ID plus country ISO3 code.
///
/// Format: `YYYY-NNNN-ISO3` (e.g. `"1998-0012-USA"`). The trailing
/// three letters are the country code of the reporting country.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Parses and validates an event key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedEventKey`] if the key does not
    /// match `YYYY-NNNN-ISO3`.
    pub fn parse(key: &str) -> Result<Self, CatalogError> {
        let parts: Vec<&str> = key.split('-').collect();
        let ok = parts.len() == 3
            && parts[0].len() == 4
            && parts[0].chars().all(|c| c.is_ascii_digit())
            && parts[1].len() == 4
            && parts[1].chars().all(|c| c.is_ascii_digit())
            && parts[2].len() == 3
            && parts[2].chars().all(|c| c.is_ascii_alphabetic());
        if ok {
            Ok(Self(key.to_string()))
        } else {
            Err(CatalogError::MalformedEventKey {
                key: key.to_string(),
            })
        }
    }

    /// The country ISO3 code segment of the key.
    #[must_use]
    pub fn iso3(&self) -> &str {
        &self.0[self.0.len() - 3..]
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record from the source disaster catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisasterEvent {
    /// Event key (`DisNo.` column).
    pub dis_no: EventKey,
    /// Country ISO3 code as reported by the catalog. May be a legacy
    /// code that needs remapping (see [`corrections`]).
    pub iso3: String,
    /// Disaster group (`"Natural"` for everything this pipeline keeps).
    pub disaster_group: String,
    /// Disaster type (e.g. `"Flood"`, `"Storm"`).
    pub disaster_type: String,
    /// Disaster subtype, when reported.
    pub disaster_subtype: Option<String>,
    /// Free-text location field.
    pub location: Option<String>,
    /// Raw embedded admin-unit list, when the catalog provides codes
    /// directly. Parsed by [`admin_units::parse_admin_units`].
    pub admin_units: Option<String>,
    /// Total reported deaths.
    pub total_deaths: Option<f64>,
    /// Total reported affected people.
    pub total_affected: Option<f64>,
    /// Total reported damage ('000 US$).
    pub total_damage: Option<f64>,
}

impl DisasterEvent {
    /// Whether the event carries any impact figure at all.
    ///
    /// Events without deaths, affected counts or damage estimates are
    /// dropped from the final dataset.
    #[must_use]
    pub const fn has_impact_data(&self) -> bool {
        self.total_deaths.is_some() || self.total_affected.is_some() || self.total_damage.is_some()
    }
}
