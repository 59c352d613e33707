#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location-field splitting for disaster catalog records.
//!
//! Catalog location fields are informal, multi-language lists of places:
//! - Comma/semicolon lists: `"Tarlac, Pampanga; Cagayan"`
//! - Bracketed qualifiers: `"Tarlac, Pampanga (Luzon)"`
//! - Conjunctions: `"Sofala and Manica provinces"`
//! - Slash alternatives: `"Boven Digoel/Kouh"`
//! - The `"Level 1"` qualifier keyword used by newer entries
//!
//! This module normalizes these into atomic [`MentionCandidate`]s, each
//! a single geocodable place name with an optional bracketed qualifier.
//! The rules here are catalog-specific heuristics, not general NLP.

pub mod splitter;

use geo_disasters_catalog::EventKey;
use geo_disasters_catalog::corrections::Corrections;
use serde::{Deserialize, Serialize};

pub use splitter::{MentionCandidate, Splitter};

/// One atomic location mention owned by an event, ready to geocode.
///
/// The `location` text is the mention's locality joined with its
/// bracketed qualifier (`"tarlac, luzon"`), which is what gets sent to
/// the gazetteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Owning event key.
    pub dis_no: EventKey,
    /// Country ISO3 code, after legacy and qualifier-driven remaps.
    pub iso3: String,
    /// The mention text to geocode.
    pub location: String,
}

/// Splits one event's raw location field into [`Mention`] rows.
///
/// Applies record-level ISO corrections on top of [`Splitter::split`]:
/// legacy ISO remaps, qualifier-driven remaps (an event filed under one
/// country whose qualifier places it in another), and the dropped-ISO
/// list for countries that no longer exist. Returns an empty vector for
/// events under a dropped ISO code or with an empty location field.
#[must_use]
pub fn mentions_for_event(
    corrections: &Corrections,
    dis_no: &EventKey,
    raw_location: &str,
) -> Vec<Mention> {
    let iso3 = corrections.remap_iso(dis_no.iso3());
    if corrections.is_dropped_iso(iso3) {
        log::debug!("{dis_no}: dropping event under retired ISO code {iso3}");
        return Vec::new();
    }

    let splitter = Splitter::new(corrections);
    splitter
        .split(iso3, raw_location)
        .into_iter()
        .filter_map(|candidate| {
            let mention_iso3 = candidate.qualifier.as_deref().map_or(iso3, |qualifier| {
                corrections.remap_iso_for_qualifier(iso3, qualifier)
            });
            if corrections.is_dropped_iso(mention_iso3) {
                return None;
            }
            Some(Mention {
                dis_no: dis_no.clone(),
                iso3: mention_iso3.to_string(),
                location: candidate.query_text(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> EventKey {
        EventKey::parse(s).unwrap()
    }

    #[test]
    fn remaps_legacy_iso_codes() {
        let corrections = Corrections::embedded();
        let mentions = mentions_for_event(corrections, &key("1998-0012-AZO"), "terceira");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].iso3, "PRT");
    }

    #[test]
    fn drops_retired_countries() {
        let corrections = Corrections::embedded();
        let mentions = mentions_for_event(corrections, &key("1991-0100-YUG"), "belgrade");
        assert!(mentions.is_empty());
    }

    #[test]
    fn qualifier_moves_event_to_montenegro() {
        let corrections = Corrections::embedded();
        let mentions =
            mentions_for_event(corrections, &key("1995-0200-SRB"), "kolasin (montenegro)");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].iso3, "MNE");
        assert_eq!(mentions[0].location, "kolasin, montenegro");
    }
}
