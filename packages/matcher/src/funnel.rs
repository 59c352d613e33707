//! The sequential disambiguation funnel.
//!
//! Stages run in a fixed order. Boolean stages use [`partition`];
//! best-unit stages use [`take_matches`] so the chosen unit travels
//! with the claimed candidate. Thresholds are tuned constants from the
//! original calibration, not derived.

use geo_disasters_boundaries::{AdminLevel, BoundaryLayer};
use geo_disasters_catalog::EventKey;
use geo_disasters_catalog::corrections::Corrections;

use crate::similarity::similarity;

/// Floor for mention/containing-unit name agreement.
const NAME_AGREEMENT_FLOOR: f64 = 50.0;

/// Floor for mention/gazetteer-place-name agreement.
const PLACE_AGREEMENT_FLOOR: f64 = 60.0;

/// Floor for fuzzy matching against a country's unit name lists.
const FUZZY_UNIT_FLOOR: f64 = 80.0;

/// Weak corroboration floor used alongside the place-name test.
const WEAK_REGION_FLOOR: f64 = 41.0;

/// Placeholder name the boundary dataset uses where no level-1
/// subdivision exists.
const NO_ADMIN_NAME: &str = "Administrative unit not available";

/// A geocoded mention that landed inside a level-1 polygon.
///
/// `adm2_*` are absent when the point fell outside every level-2
/// polygon (coastal imprecision); candidates whose level-1 lookup
/// missed never reach the funnel.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Owning event key.
    pub dis_no: EventKey,
    /// Country the mention was resolved under.
    pub iso3: String,
    /// The mention text (lowercase, as the splitter produced it).
    pub mention: String,
    /// Canonical place name from the gazetteer.
    pub place_name: String,
    /// Gazetteer first-level admin name ("province").
    pub province: String,
    /// Containing level-1 unit.
    pub adm1_code: i64,
    /// Containing level-1 unit name.
    pub adm1_name: String,
    /// Containing level-2 unit, if any.
    pub adm2_code: Option<i64>,
    /// Containing level-2 unit name, if any.
    pub adm2_name: Option<String>,
}

/// Which funnel stage claimed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mention agrees with the containing level-1 name.
    RegionNameAgreement,
    /// Mention agrees with the containing level-2 name.
    SubRegionNameAgreement,
    /// No level-1 subdivision exists; kept at level 2, low confidence.
    NoAdminData,
    /// Mention agrees with the gazetteer place name.
    PlaceNameAgreement,
    /// Gazetteer province fuzzily matches a level-1 unit.
    ProvinceFuzzy,
    /// Mention is a substring of the containing level-1 name.
    RegionSubstring,
    /// Mention fuzzily matches a level-1 unit of the country.
    RegionFuzzy,
    /// Mention fuzzily matches a level-2 unit under the containing
    /// level-1 unit.
    SubRegionFuzzy,
}

/// A disambiguated mention: one admin unit at one level.
#[derive(Debug, Clone)]
pub struct NameMatch {
    /// Owning event key.
    pub dis_no: EventKey,
    /// Country code.
    pub iso3: String,
    /// The mention text.
    pub mention: String,
    /// Chosen administrative level.
    pub level: AdminLevel,
    /// Chosen unit code at that level.
    pub code: i64,
    /// Chosen unit name.
    pub name: String,
    /// Confidence flag, 2–4 (1 is reserved for explicit catalog codes).
    pub quality: u8,
    /// Which stage decided this candidate.
    pub stage: Stage,
}

/// Splits a pool into (claimed, remainder) on a boolean predicate.
fn partition<T>(pool: Vec<T>, pred: impl Fn(&T) -> bool) -> (Vec<T>, Vec<T>) {
    pool.into_iter().partition(pred)
}

/// Splits a pool into (claimed-with-payload, remainder); the payload is
/// whatever the stage computed to decide the claim (the chosen unit).
fn take_matches<T, M>(pool: Vec<T>, f: impl Fn(&T) -> Option<M>) -> (Vec<(T, M)>, Vec<T>) {
    let mut claimed = Vec::new();
    let mut remainder = Vec::new();
    for item in pool {
        match f(&item) {
            Some(payload) => claimed.push((item, payload)),
            None => remainder.push(item),
        }
    }
    (claimed, remainder)
}

/// Runs the full funnel over a candidate pool.
///
/// Candidates the funnel cannot decide are logged and dropped; the
/// output therefore may cover only a subset of the input events.
#[must_use]
pub fn disambiguate(
    candidates: Vec<Candidate>,
    level1: &BoundaryLayer,
    level2: &BoundaryLayer,
    corrections: &Corrections,
) -> Vec<NameMatch> {
    let total = candidates.len();
    let mut matches: Vec<NameMatch> = Vec::new();

    // Mention vs containing unit names. Exact ties go to level 1,
    // which is checked first.
    let (hits, pool) = partition(candidates, |c| {
        let region = similarity(&c.mention, &c.adm1_name);
        region >= NAME_AGREEMENT_FLOOR && region >= sub_region_similarity(c)
    });
    matches.extend(hits.into_iter().map(|c| {
        region_match(&c, c.adm1_code, c.adm1_name.clone(), 2, Stage::RegionNameAgreement)
    }));

    let (hits, pool) = partition(pool, |c| {
        let sub = sub_region_similarity(c);
        sub >= NAME_AGREEMENT_FLOOR && sub > similarity(&c.mention, &c.adm1_name)
    });
    matches.extend(hits.into_iter().filter_map(|c| sub_region_match(&c, 2, Stage::SubRegionNameAgreement)));

    // Points in territory with no level-1 subdivision: keep at level 2
    // with the lowest confidence rather than dropping coverage.
    let (hits, pool) = partition(pool, |c| c.adm1_name == NO_ADMIN_NAME);
    matches.extend(hits.into_iter().filter_map(|c| sub_region_match(&c, 4, Stage::NoAdminData)));

    // The gazetteer's own place name corroborates the mention, with a
    // weak check against the containing region name.
    let (hits, pool) = partition(pool, |c| {
        c.adm2_code.is_some()
            && similarity(&c.mention, &c.place_name) >= PLACE_AGREEMENT_FLOOR
            && similarity(&c.mention, &c.adm1_name) > WEAK_REGION_FLOOR
    });
    matches.extend(hits.into_iter().filter_map(|c| sub_region_match(&c, 3, Stage::PlaceNameAgreement)));

    // The gazetteer province names a region of the country outright.
    let (hits, pool) = take_matches(pool, |c| {
        if corrections.is_province_match_excluded(c.dis_no.as_str(), &c.mention) {
            return None;
        }
        best_unit(&c.province, level1.units_for_country(&c.iso3))
    });
    matches.extend(hits.into_iter().map(|(c, (code, name))| {
        region_match(&c, code, name, 2, Stage::ProvinceFuzzy)
    }));

    // e.g. mention "sofala" inside unit "Sofala Province".
    let (hits, pool) = partition(pool, |c| {
        c.adm1_name.to_lowercase().contains(&c.mention.to_lowercase())
    });
    matches.extend(hits.into_iter().map(|c| {
        region_match(&c, c.adm1_code, c.adm1_name.clone(), 2, Stage::RegionSubstring)
    }));

    let (hits, pool) = take_matches(pool, |c| {
        best_unit(&c.mention, level1.units_for_country(&c.iso3))
    });
    matches.extend(hits.into_iter().map(|(c, (code, name))| {
        region_match(&c, code, name, 2, Stage::RegionFuzzy)
    }));

    let (hits, pool) = take_matches(pool, |c| {
        let siblings = level2
            .units_for_country(&c.iso3)
            .filter(|u| u.adm1_code == Some(c.adm1_code));
        best_unit(&c.mention, siblings)
    });
    matches.extend(hits.into_iter().map(|(c, (code, name))| NameMatch {
        dis_no: c.dis_no.clone(),
        iso3: c.iso3.clone(),
        mention: c.mention.clone(),
        level: AdminLevel::Level2,
        code,
        name,
        quality: 2,
        stage: Stage::SubRegionFuzzy,
    }));

    for c in &pool {
        let reason = if similarity(&c.mention, &c.province) >= PLACE_AGREEMENT_FLOOR {
            "province agreement alone is too uncertain"
        } else {
            "no stage matched"
        };
        log::info!("{}: dropping mention '{}' ({reason})", c.dis_no, c.mention);
    }
    log::info!(
        "Disambiguated {} of {total} candidates ({} dropped)",
        matches.len(),
        pool.len()
    );

    matches
}

fn sub_region_similarity(c: &Candidate) -> f64 {
    c.adm2_name
        .as_deref()
        .map_or(0.0, |name| similarity(&c.mention, name))
}

fn region_match(c: &Candidate, code: i64, name: String, quality: u8, stage: Stage) -> NameMatch {
    NameMatch {
        dis_no: c.dis_no.clone(),
        iso3: c.iso3.clone(),
        mention: c.mention.clone(),
        level: AdminLevel::Level1,
        code,
        name,
        quality,
        stage,
    }
}

/// A level-2 assignment needs the containing level-2 unit; a candidate
/// without one is dropped with a log line.
fn sub_region_match(c: &Candidate, quality: u8, stage: Stage) -> Option<NameMatch> {
    let (Some(code), Some(name)) = (c.adm2_code, c.adm2_name.clone()) else {
        log::warn!(
            "{}: mention '{}' decided at level 2 but has no containing sub-region",
            c.dis_no,
            c.mention
        );
        return None;
    };
    Some(NameMatch {
        dis_no: c.dis_no.clone(),
        iso3: c.iso3.clone(),
        mention: c.mention.clone(),
        level: AdminLevel::Level2,
        code,
        name,
        quality,
        stage,
    })
}

/// Best-scoring unit from a name list, if any clears the fuzzy floor.
fn best_unit<'a>(
    query: &str,
    units: impl Iterator<Item = &'a geo_disasters_boundaries::AdminUnit>,
) -> Option<(i64, String)> {
    let mut best: Option<(f64, &'a geo_disasters_boundaries::AdminUnit)> = None;
    for unit in units {
        let score = similarity(query, &unit.name);
        if score >= FUZZY_UNIT_FLOOR && best.is_none_or(|(s, _)| score > s) {
            best = Some((score, unit));
        }
    }
    best.map(|(_, unit)| (unit.code, unit.name.clone()))
}
