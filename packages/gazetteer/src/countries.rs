//! Compile-time registry of ISO 3166 alpha-3 to alpha-2 mappings.
//!
//! The catalog keys events by alpha-3 while the gazetteer's country
//! filter takes alpha-2. The table is embedded from
//! `config/countries.toml` at compile time.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::GazetteerError;

#[derive(Debug, Deserialize)]
struct CountryTable {
    iso2: BTreeMap<String, String>,
}

const COUNTRIES_TOML: &str = include_str!("../config/countries.toml");

static TABLE: OnceLock<CountryTable> = OnceLock::new();

fn table() -> &'static CountryTable {
    TABLE.get_or_init(|| {
        toml::de::from_str(COUNTRIES_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded country table: {e}"))
    })
}

/// Resolves an alpha-3 country code to its alpha-2 equivalent.
///
/// # Errors
///
/// Returns [`GazetteerError::UnknownCountry`] when the code is not in
/// the embedded table. Callers treat this as fatal: an unmapped country
/// means the table needs extending, and silently skipping it would drop
/// every mention in that country.
pub fn iso2_for(iso3: &str) -> Result<&'static str, GazetteerError> {
    table()
        .iso2
        .get(iso3)
        .map(String::as_str)
        .ok_or_else(|| GazetteerError::UnknownCountry {
            iso3: iso3.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_codes() {
        assert_eq!(iso2_for("USA").unwrap(), "US");
        assert_eq!(iso2_for("PHL").unwrap(), "PH");
        assert_eq!(iso2_for("SSD").unwrap(), "SS");
    }

    #[test]
    fn unknown_code_is_an_error() {
        let err = iso2_for("XXX").unwrap_err();
        assert!(matches!(err, GazetteerError::UnknownCountry { ref iso3 } if iso3 == "XXX"));
    }
}
