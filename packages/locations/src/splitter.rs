//! The location-string splitter.
//!
//! Turns one raw location field into atomic locality/qualifier pairs.
//! Splitting proceeds in fixed phases: country-specific rewrites,
//! separator normalization, the `"Level 1"` special case, group
//! splitting (semicolons, then parenthesis-aware commas), generic-noun
//! stripping, multi-bracket re-splitting, and finally bracket
//! extraction with a locality × qualifier cross product.

use std::sync::LazyLock;

use geo_disasters_catalog::corrections::Corrections;
use regex::Regex;

/// Regex for the `"Level 1"` qualifier keyword: everything before it is
/// the locality, everything after is the bracketed qualifier.
static LEVEL_1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)level 1\s*(.*)$").expect("valid regex"));

/// Regex for `") and"`, which joins bracketed groups and must become a
/// group separator before conjunction rewriting.
static PAREN_AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*and\b").expect("valid regex"));

/// Regex for textual conjunctions rewritten to commas.
static CONJUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(and|between)\b").expect("valid regex"));

/// An atomic location candidate produced by the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    /// The place name itself.
    pub locality: String,
    /// Bracketed qualifier (a parent or disambiguating sub-location),
    /// when one was attached.
    pub qualifier: Option<String>,
}

impl MentionCandidate {
    /// The text sent to the gazetteer: locality joined with its
    /// qualifier.
    #[must_use]
    pub fn query_text(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{}, {}", self.locality, qualifier),
            None => self.locality.clone(),
        }
    }
}

/// Splits raw catalog location text into [`MentionCandidate`]s.
pub struct Splitter<'a> {
    corrections: &'a Corrections,
}

impl<'a> Splitter<'a> {
    /// Creates a splitter backed by the given corrections registry.
    #[must_use]
    pub const fn new(corrections: &'a Corrections) -> Self {
        Self { corrections }
    }

    /// Splits one raw location field into atomic mention candidates.
    ///
    /// Empty input yields an empty vector. Purely numeric localities
    /// are dropped; two-character localities of USA events are expanded
    /// via the state-abbreviation table.
    #[must_use]
    pub fn split(&self, iso3: &str, raw_text: &str) -> Vec<MentionCandidate> {
        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        let text = self.corrections.rewrite_location(iso3, raw_text);
        let text = normalize_separators(&text);

        // "Level 1" is a qualifier keyword, not a place name. Splitting
        // such entries further would corrupt them, so they bypass the
        // group split and term stripping entirely.
        if let Some(caps) = LEVEL_1_RE.captures(&text) {
            let locality = caps[1].trim().to_string();
            let qualifier = caps[2].trim().to_string();
            if locality.is_empty() {
                return Vec::new();
            }
            return vec![MentionCandidate {
                locality,
                qualifier: (!qualifier.is_empty()).then_some(qualifier),
            }];
        }

        split_groups(&text)
            .into_iter()
            .map(|group| self.strip_terms(&group))
            .flat_map(|group| split_multi_bracket(&group))
            .flat_map(|candidate| extract_pairs(&candidate))
            .filter_map(|candidate| self.finalize(iso3, candidate))
            .collect()
    }

    /// Removes generic administrative nouns ("province", "district",
    /// ...) from a candidate, case-insensitively.
    fn strip_terms(&self, candidate: &str) -> String {
        let mut text = candidate.to_string();
        for term in self.corrections.stripped_terms() {
            text = replace_ignore_case(&text, term, " ");
        }
        collapse_spaces(&text)
    }

    /// Final cleanup and filtering of one extracted pair.
    fn finalize(&self, iso3: &str, candidate: MentionCandidate) -> Option<MentionCandidate> {
        let locality = candidate.locality.trim().trim_end_matches(',').trim();
        if locality.is_empty() || locality.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let locality = if iso3 == "USA" && locality.chars().count() == 2 {
            self.corrections
                .expand_us_state(locality)
                .unwrap_or(locality)
                .to_string()
        } else {
            locality.to_string()
        };

        let qualifier = candidate
            .qualifier
            .as_deref()
            .map(|q| q.trim().trim_end_matches(',').trim().to_string())
            .filter(|q| !q.is_empty());

        Some(MentionCandidate { locality, qualifier })
    }
}

/// Rewrites textual conjunctions to commas so that a flat
/// comma-separated list results wherever possible.
fn normalize_separators(text: &str) -> String {
    let text = PAREN_AND_RE.replace_all(text, "),");
    let text = CONJUNCTION_RE.replace_all(&text, ",");
    text.replace(['&', '+'], ",")
}

/// Splits text into independent groups: semicolons first, then commas
/// that sit outside any parenthesis pair. A group that carries its own
/// complete parenthesis pair is kept intact for later bracket
/// extraction.
fn split_groups(text: &str) -> Vec<String> {
    let mut groups = Vec::new();
    for part in text.split(';') {
        if part.contains('(') && part.contains(')') {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                groups.push(trimmed.to_string());
            }
        } else {
            for sub in split_top_level_commas(part) {
                groups.push(sub);
            }
        }
    }
    groups
}

/// Splits on commas at parenthesis depth zero.
fn split_top_level_commas(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth <= 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Re-splits a candidate holding more than one parenthesis group into
/// one candidate per group: a cut happens at any top-level comma that
/// follows a completed `(...)` pair.
fn split_multi_bracket(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut closed_group = false;

    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                if depth <= 0 {
                    closed_group = true;
                }
                current.push(c);
            }
            ',' if depth <= 0 && closed_group => {
                parts.push(std::mem::take(&mut current));
                closed_group = false;
            }
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Extracts locality/qualifier pairs from one candidate.
///
/// - `"A, B (C, D)"` emits the cross product `(A,C) (A,D) (B,C) (B,D)`.
/// - `"A/B"` emits each alternative with no qualifier.
/// - Anything else emits itself as a single pair.
///
/// An unmatched `(` degrades gracefully: the dangling content becomes
/// the qualifier.
fn extract_pairs(candidate: &str) -> Vec<MentionCandidate> {
    let mut pairs = Vec::new();

    if let Some(open) = candidate.find('(') {
        let before = &candidate[..open];
        let inside = candidate[open + 1..].replace(')', "");
        let qualifiers: Vec<&str> = inside.split(',').map(str::trim).collect();

        for locality in before.split(',') {
            for alternative in locality.split('/') {
                let alternative = alternative.trim();
                if alternative.is_empty() {
                    continue;
                }
                for qualifier in &qualifiers {
                    pairs.push(MentionCandidate {
                        locality: alternative.to_string(),
                        qualifier: (!qualifier.is_empty()).then(|| (*qualifier).to_string()),
                    });
                }
            }
        }
    } else if candidate.contains(',') {
        for part in candidate.split(',') {
            let part = part.trim();
            if !part.is_empty() {
                pairs.push(MentionCandidate {
                    locality: part.to_string(),
                    qualifier: None,
                });
            }
        }
    } else {
        for alternative in candidate.split('/') {
            let alternative = alternative.trim();
            if !alternative.is_empty() {
                pairs.push(MentionCandidate {
                    locality: alternative.to_string(),
                    qualifier: None,
                });
            }
        }
    }

    pairs
}

/// Case-insensitive literal replacement.
fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let lower_haystack = haystack.to_lowercase();
    let lower_needle = needle.to_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut rest = 0;
    let mut search = 0;
    while let Some(pos) = lower_haystack[search..].find(&lower_needle) {
        let start = search + pos;
        // Byte offsets in the lowercase string can drift from the
        // original for multi-byte case folds; skip such matches rather
        // than slice mid-character.
        if !haystack.is_char_boundary(start) || !haystack.is_char_boundary(start + needle.len()) {
            search = start + lower_needle.len();
            continue;
        }
        out.push_str(&haystack[rest..start]);
        out.push_str(replacement);
        rest = start + needle.len();
        search = rest;
    }
    out.push_str(&haystack[rest..]);
    out
}

/// Collapses runs of spaces left behind by term stripping.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(iso3: &str, text: &str) -> Vec<MentionCandidate> {
        Splitter::new(Corrections::embedded()).split(iso3, text)
    }

    fn pair(locality: &str, qualifier: Option<&str>) -> MentionCandidate {
        MentionCandidate {
            locality: locality.to_string(),
            qualifier: qualifier.map(String::from),
        }
    }

    #[test]
    fn atomic_input_is_returned_trimmed() {
        assert_eq!(split("AFG", "  Badakhshan "), vec![pair("badakhshan", None)]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split("AFG", "").is_empty());
        assert!(split("AFG", "   ").is_empty());
    }

    #[test]
    fn bracket_cross_product() {
        let mentions = split("PHL", "Tarlac, Pampanga (Luzon)");
        assert_eq!(
            mentions,
            vec![pair("tarlac", Some("luzon")), pair("pampanga", Some("luzon"))]
        );
    }

    #[test]
    fn full_cross_product_of_locality_and_qualifier() {
        let mentions = split("AFG", "a, b (c, d)");
        assert_eq!(
            mentions,
            vec![
                pair("a", Some("c")),
                pair("a", Some("d")),
                pair("b", Some("c")),
                pair("b", Some("d")),
            ]
        );
    }

    #[test]
    fn level_1_keyword_is_a_qualifier_not_a_place() {
        let mentions = split("KEN", "Central Province Level 1 North District");
        assert_eq!(
            mentions,
            vec![pair("central province", Some("north district"))]
        );
        assert_eq!(mentions[0].query_text(), "central province, north district");
    }

    #[test]
    fn semicolon_groups_are_independent() {
        let mentions = split("AFG", "kabul, herat; kandahar");
        assert_eq!(
            mentions,
            vec![pair("kabul", None), pair("herat", None), pair("kandahar", None)]
        );
    }

    #[test]
    fn conjunctions_become_commas() {
        let mentions = split("MOZ", "Sofala and Manica provinces");
        assert_eq!(mentions, vec![pair("sofala", None), pair("manica", None)]);
    }

    #[test]
    fn multiple_bracket_groups_split_apart() {
        let mentions = split("AFG", "kabul (north), herat (west)");
        assert_eq!(
            mentions,
            vec![pair("kabul", Some("north")), pair("herat", Some("west"))]
        );
    }

    #[test]
    fn slash_alternatives_emit_separately() {
        let mentions = split("IDN", "boven digoel/kouh");
        assert_eq!(mentions, vec![pair("boven digoel", None), pair("kouh", None)]);
    }

    #[test]
    fn strips_generic_admin_nouns() {
        let mentions = split("AFG", "Kabul province, Herat district");
        assert_eq!(mentions, vec![pair("kabul", None), pair("herat", None)]);
    }

    #[test]
    fn drops_digit_only_mentions() {
        let mentions = split("AFG", "kabul, 450");
        assert_eq!(mentions, vec![pair("kabul", None)]);
    }

    #[test]
    fn expands_usa_state_abbreviations() {
        let mentions = split("USA", "ri, tx");
        assert_eq!(
            mentions,
            vec![pair("rhode island", None), pair("texas", None)]
        );
    }

    #[test]
    fn two_letter_mentions_elsewhere_are_kept() {
        let mentions = split("CHN", "xi");
        assert_eq!(mentions, vec![pair("xi", None)]);
    }

    #[test]
    fn unmatched_paren_degrades_to_qualifier() {
        let mentions = split("PHL", "tarlac (luzon");
        assert_eq!(mentions, vec![pair("tarlac", Some("luzon"))]);
    }

    #[test]
    fn philippines_roman_numeral_regions_are_rewritten() {
        let mentions = split("PHL", "Region VII");
        assert_eq!(mentions, vec![pair("central visayas", None)]);
    }

    #[test]
    fn rhode_affected_area_scenario() {
        // The stray "area" noun is stripped, leaving the mention the
        // manual correction table is keyed on.
        let mentions = split("USA", "Rhode (affected area)");
        assert_eq!(mentions, vec![pair("rhode", Some("affected"))]);
        assert_eq!(mentions[0].query_text(), "rhode, affected");
    }
}
