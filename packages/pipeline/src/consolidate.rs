//! Merging the three resolution paths into finalized rows.

use std::collections::{BTreeMap, HashSet};

use geo_disasters_boundaries::{AdminLevel, BoundaryLayer, geometry};

use crate::{PendingLocation, ResolvedLocation};

/// Consolidation output with its data-quality counters.
#[derive(Debug)]
pub struct Consolidated {
    /// Finalized rows, in event-key order.
    pub locations: Vec<ResolvedLocation>,
    /// Rows dropped because their unit code had no boundary geometry.
    pub join_misses: usize,
    /// Rows dropped as redundant nested regions.
    pub redundant_dropped: usize,
}

/// Merges pending locations from all paths into finalized rows.
///
/// Deduplicates exact-duplicate rows, joins boundary geometry by unit
/// code (join misses are counted and dropped, never kept as null
/// geometry), simplifies and repairs each geometry, and drops rows
/// whose bounding box is fully covered by a same-level sibling of the
/// same event.
#[must_use]
pub fn consolidate(
    pending: Vec<PendingLocation>,
    level1: &BoundaryLayer,
    level2: &BoundaryLayer,
) -> Consolidated {
    let deduped = dedup(pending);

    let mut join_misses = 0_usize;
    let mut by_event: BTreeMap<_, Vec<ResolvedLocation>> = BTreeMap::new();
    for row in deduped {
        let layer = match row.level {
            AdminLevel::Level1 => level1,
            AdminLevel::Level2 => level2,
        };
        let Some(unit) = layer.unit(row.code) else {
            log::warn!(
                "{}: no level-{} boundary for code {}, dropping row",
                row.dis_no,
                row.level.as_number(),
                row.code
            );
            join_misses += 1;
            continue;
        };

        by_event
            .entry(row.dis_no.clone())
            .or_default()
            .push(ResolvedLocation {
                dis_no: row.dis_no,
                iso3: row.iso3,
                level: row.level,
                code: row.code,
                name: row.name,
                mention: row.mention,
                quality: row.quality,
                geometry: geometry::simplify_for_output(&unit.geometry),
            });
    }

    let mut redundant_dropped = 0_usize;
    let mut locations = Vec::new();
    for rows in by_event.into_values() {
        let (kept, dropped) = drop_nested(rows);
        redundant_dropped += dropped;
        locations.extend(kept);
    }

    log::info!(
        "Consolidated {} locations ({join_misses} join misses, {redundant_dropped} redundant)",
        locations.len()
    );
    Consolidated {
        locations,
        join_misses,
        redundant_dropped,
    }
}

fn dedup(pending: Vec<PendingLocation>) -> Vec<PendingLocation> {
    let mut seen: HashSet<(String, u8, i64, Option<String>, u8)> = HashSet::new();
    pending
        .into_iter()
        .filter(|row| {
            seen.insert((
                row.dis_no.as_str().to_string(),
                row.level.as_number(),
                row.code,
                row.mention.clone(),
                row.quality,
            ))
        })
        .collect()
}

/// Within one event, drops rows whose bounding box is fully inside
/// another same-level row's bounding box (duplicate or nested regions
/// would double-count area). Larger regions are kept in preference.
fn drop_nested(mut rows: Vec<ResolvedLocation>) -> (Vec<ResolvedLocation>, usize) {
    rows.sort_by(|a, b| {
        geometry::area_km2(&b.geometry)
            .partial_cmp(&geometry::area_km2(&a.geometry))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<ResolvedLocation> = Vec::new();
    let mut dropped = 0_usize;
    for row in rows {
        let covered = kept.iter().any(|k| {
            k.level == row.level && geometry::bbox_within(&row.geometry, &k.geometry)
        });
        if covered {
            log::debug!(
                "{}: dropping {} ({}) as redundant nested region",
                row.dis_no,
                row.name,
                row.code
            );
            dropped += 1;
        } else {
            kept.push(row);
        }
    }
    (kept, dropped)
}
