//! Edit-distance similarity scoring.

/// Case-insensitive normalized Levenshtein similarity on a 0–100 scale.
///
/// 100 means identical (ignoring case), 0 means nothing in common. The
/// funnel thresholds are calibrated against this scale.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    (strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) * 100.0).round()
}
