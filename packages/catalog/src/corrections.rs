//! Compile-time registry of manual correction data.
//!
//! The catalog needs a long tail of hand-maintained fixes: per-country
//! region-name rewrites, legacy ISO remaps, per-event mention overrides
//! and exclusion lists. These live in `config/corrections.toml`,
//! embedded at compile time and deserialized once into [`Corrections`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::CatalogError;

/// One `from` → `to` text rewrite rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteRule {
    /// Text to replace (lowercase).
    pub from: String,
    /// Replacement text.
    pub to: String,
}

/// Ordered rewrite rules for one country's location text.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRewrites {
    /// Country the rules apply to.
    pub iso3: String,
    /// Rules, applied in order.
    pub rules: Vec<RewriteRule>,
}

/// A legacy ISO code remap.
#[derive(Debug, Clone, Deserialize)]
pub struct IsoRemap {
    /// Code as found in the catalog.
    pub from: String,
    /// Current ISO3 code.
    pub to: String,
}

/// An ISO remap conditioned on a mention's bracketed qualifier.
#[derive(Debug, Clone, Deserialize)]
pub struct QualifierIsoRemap {
    /// Country code the event is filed under.
    pub iso3: String,
    /// Qualifier text (lowercase) that triggers the remap.
    pub qualifier: String,
    /// Corrected ISO3 code.
    pub to: String,
}

/// A manual mention fix with pinned coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct MentionOverride {
    /// Owning event key.
    pub event: String,
    /// Mention text (lowercase) as produced by the splitter.
    pub mention: String,
    /// Corrected place name.
    pub name: String,
    /// Fixed longitude.
    pub longitude: f64,
    /// Fixed latitude.
    pub latitude: f64,
}

/// An event/mention pair excluded from a heuristic match stage.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchExclusion {
    /// Owning event key.
    pub event: String,
    /// Mention text (lowercase).
    pub mention: String,
}

/// The full manual-correction registry.
#[derive(Debug, Clone, Deserialize)]
pub struct Corrections {
    region_rewrites: Vec<RegionRewrites>,
    stripped_terms: Vec<String>,
    us_states: BTreeMap<String, String>,
    iso_remaps: Vec<IsoRemap>,
    qualifier_iso_remaps: Vec<QualifierIsoRemap>,
    dropped_isos: Vec<String>,
    climate_disaster_types: Vec<String>,
    mention_overrides: Vec<MentionOverride>,
    province_match_exclusions: Vec<MatchExclusion>,
    dropped_events: Vec<String>,
}

const CORRECTIONS_TOML: &str = include_str!("../config/corrections.toml");

static EMBEDDED: OnceLock<Corrections> = OnceLock::new();

impl Corrections {
    /// Returns the embedded registry, parsing it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed; the config ships with
    /// the binary, so this is effectively a compile-time guarantee.
    #[must_use]
    pub fn embedded() -> &'static Self {
        EMBEDDED.get_or_init(|| {
            Self::parse(CORRECTIONS_TOML)
                .unwrap_or_else(|e| panic!("Failed to parse embedded corrections: {e}"))
        })
    }

    /// Parses a corrections registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the TOML is malformed.
    pub fn parse(toml_str: &str) -> Result<Self, CatalogError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Applies the country-specific region rewrites to a lowercased
    /// location string.
    #[must_use]
    pub fn rewrite_location(&self, iso3: &str, location: &str) -> String {
        let mut text = location.to_lowercase();
        for rewrites in &self.region_rewrites {
            if rewrites.iso3 == iso3 {
                for rule in &rewrites.rules {
                    if text.contains(&rule.from) {
                        log::debug!("{iso3}: rewriting '{}' to '{}'", rule.from, rule.to);
                        text = text.replace(&rule.from, &rule.to);
                    }
                }
            }
        }
        text
    }

    /// Generic administrative nouns to strip from split candidates.
    #[must_use]
    pub fn stripped_terms(&self) -> &[String] {
        &self.stripped_terms
    }

    /// Expands a two-letter USA state abbreviation, if known.
    #[must_use]
    pub fn expand_us_state(&self, abbr: &str) -> Option<&str> {
        self.us_states
            .get(abbr.to_lowercase().as_str())
            .map(String::as_str)
    }

    /// Remaps a legacy ISO code, returning the input unchanged when no
    /// remap exists.
    #[must_use]
    pub fn remap_iso<'a>(&'a self, iso3: &'a str) -> &'a str {
        self.iso_remaps
            .iter()
            .find(|r| r.from == iso3)
            .map_or(iso3, |r| r.to.as_str())
    }

    /// Remaps an ISO code based on a mention's bracketed qualifier.
    #[must_use]
    pub fn remap_iso_for_qualifier<'a>(&'a self, iso3: &'a str, qualifier: &str) -> &'a str {
        self.qualifier_iso_remaps
            .iter()
            .find(|r| r.iso3 == iso3 && r.qualifier == qualifier.to_lowercase())
            .map_or(iso3, |r| r.to.as_str())
    }

    /// Whether events under this ISO code are dropped entirely.
    #[must_use]
    pub fn is_dropped_iso(&self, iso3: &str) -> bool {
        self.dropped_isos.iter().any(|c| c == iso3)
    }

    /// Whether a disaster type is in the retained climate set.
    #[must_use]
    pub fn is_climate_type(&self, disaster_type: &str) -> bool {
        self.climate_disaster_types.iter().any(|t| t == disaster_type)
    }

    /// Looks up a manual override for an event/mention pair.
    #[must_use]
    pub fn override_for(&self, event: &str, mention: &str) -> Option<&MentionOverride> {
        let mention = mention.to_lowercase();
        self.mention_overrides
            .iter()
            .find(|o| o.event == event && o.mention == mention)
    }

    /// Whether an event/mention pair is excluded from province-based
    /// fuzzy matching.
    #[must_use]
    pub fn is_province_match_excluded(&self, event: &str, mention: &str) -> bool {
        let mention = mention.to_lowercase();
        self.province_match_exclusions
            .iter()
            .any(|x| x.event == event && x.mention == mention)
    }

    /// Whether an event is dropped from the final dataset.
    #[must_use]
    pub fn is_dropped_event(&self, event: &str) -> bool {
        self.dropped_events.iter().any(|e| e == event)
    }
}
