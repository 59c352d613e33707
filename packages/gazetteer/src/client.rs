//! `GeoNames` fuzzy search client.
//!
//! Queries the `searchJSON` endpoint with a country filter, fuzzy
//! matching enabled, and `maxRows=1` so only the gazetteer's best hit
//! comes back.
//!
//! See <https://www.geonames.org/export/geonames-search.html>

use async_trait::async_trait;

use crate::{GazetteerError, GazetteerPlace};

/// Default search endpoint for the public service.
pub const DEFAULT_BASE_URL: &str = "http://api.geonames.org/searchJSON";

/// Fuzzy matching tolerance passed to the search endpoint.
const FUZZY: &str = "0.7";

/// Abstraction over the search backend so the resolver can be tested
/// without network access.
#[async_trait]
pub trait SearchTransport {
    /// Searches for a place within one country.
    ///
    /// `Ok(None)` means the gazetteer answered well-formed but empty;
    /// errors mean the request or response itself failed.
    async fn search(
        &self,
        query: &str,
        iso2: &str,
    ) -> Result<Option<GazetteerPlace>, GazetteerError>;
}

/// HTTP client for the `GeoNames` search API.
pub struct GeoNamesClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
}

impl GeoNamesClient {
    /// A client for the public endpoint under the given account.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, username)
    }

    /// A client against a custom endpoint, for self-hosted mirrors.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            username: username.into(),
        }
    }
}

#[async_trait]
impl SearchTransport for GeoNamesClient {
    async fn search(
        &self,
        query: &str,
        iso2: &str,
    ) -> Result<Option<GazetteerPlace>, GazetteerError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("country", iso2),
                ("maxRows", "1"),
                ("fuzzy", FUZZY),
                ("username", &self.username),
            ])
            .send()
            .await?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a `searchJSON` response body.
///
/// The service reports quota and auth problems as a `status` object
/// instead of a `geonames` array; those surface as parse errors so the
/// resolver's retry loop sees them.
fn parse_response(body: &serde_json::Value) -> Result<Option<GazetteerPlace>, GazetteerError> {
    if let Some(message) = body["status"]["message"].as_str() {
        return Err(GazetteerError::Parse {
            message: format!("Service error: {message}"),
        });
    }

    let results = body["geonames"].as_array().ok_or_else(|| {
        GazetteerError::Parse {
            message: "Missing geonames array".to_string(),
        }
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let longitude = coordinate(&first["lng"]).ok_or_else(|| GazetteerError::Parse {
        message: "Missing lng in search result".to_string(),
    })?;
    let latitude = coordinate(&first["lat"]).ok_or_else(|| GazetteerError::Parse {
        message: "Missing lat in search result".to_string(),
    })?;

    let name = first["name"].as_str().unwrap_or_default().to_string();
    let admin1 = first["adminName1"].as_str().unwrap_or_default().to_string();

    Ok(Some(GazetteerPlace {
        longitude,
        latitude,
        name,
        admin1,
    }))
}

/// Coordinates come back as strings from the public service but as
/// numbers from some mirrors; accept both.
fn coordinate(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_hit_with_string_coordinates() {
        let body = serde_json::json!({
            "totalResultsCount": 42,
            "geonames": [{
                "lng": "120.59556",
                "lat": "15.48801",
                "name": "Tarlac City",
                "adminName1": "Central Luzon"
            }]
        });
        let place = parse_response(&body).unwrap().unwrap();
        assert!((place.longitude - 120.595_56).abs() < 1e-6);
        assert!((place.latitude - 15.488_01).abs() < 1e-6);
        assert_eq!(place.name, "Tarlac City");
        assert_eq!(place.admin1, "Central Luzon");
    }

    #[test]
    fn parses_numeric_coordinates() {
        let body = serde_json::json!({
            "geonames": [{ "lng": 15.05, "lat": 12.11, "name": "Ndjamena", "adminName1": "" }]
        });
        let place = parse_response(&body).unwrap().unwrap();
        assert!((place.longitude - 15.05).abs() < 1e-9);
    }

    #[test]
    fn empty_geonames_is_a_clean_miss() {
        let body = serde_json::json!({ "totalResultsCount": 0, "geonames": [] });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn status_object_is_an_error() {
        let body = serde_json::json!({
            "status": { "message": "the hourly limit has been exceeded", "value": 19 }
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GazetteerError::Parse { .. }));
    }

    #[test]
    fn missing_geonames_key_is_an_error() {
        let body = serde_json::json!({ "unexpected": true });
        assert!(parse_response(&body).is_err());
    }
}
