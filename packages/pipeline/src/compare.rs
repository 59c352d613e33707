//! Cross-dataset footprint comparison.
//!
//! Compares this pipeline's national footprints against a reference
//! dataset's footprints for the event keys both share. Area work is CPU
//! bound and independent per event, so rows are computed as a
//! task-parallel map over shared read-only inputs and re-ordered by
//! event key afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use geo_disasters_boundaries::geometry;
use geo_disasters_catalog::EventKey;
use serde::Serialize;

use crate::footprint::NationalFootprint;

/// Relative area mismatch above which a row is flagged.
pub const MISMATCH_THRESHOLD: f64 = 0.10;

/// One comparison-report row for an event key common to both datasets.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    /// Event key.
    pub dis_no: EventKey,
    /// This pipeline's footprint area, km².
    pub area_km2: f64,
    /// Reference dataset's footprint area, km².
    pub reference_area_km2: f64,
    /// Absolute area difference, km².
    pub absolute_mismatch_km2: f64,
    /// Mismatch relative to the larger of the two areas (0–1 scale).
    pub mismatch_fraction: f64,
    /// Whether the mismatch exceeds [`MISMATCH_THRESHOLD`].
    pub over_threshold: bool,
    /// Admin levels present in this pipeline's footprint.
    pub levels: String,
    /// Admin levels present in the reference footprint.
    pub reference_levels: String,
    /// This pipeline's event quality flag.
    pub quality: u8,
    /// Reference dataset's event quality flag.
    pub reference_quality: u8,
}

/// Compares two footprint sets over their common event keys.
///
/// Events present in only one dataset are skipped. Output is sorted by
/// event key.
pub async fn compare(
    ours: Arc<Vec<NationalFootprint>>,
    reference: Arc<Vec<NationalFootprint>>,
) -> Vec<ComparisonRow> {
    let by_key: HashMap<EventKey, usize> = reference
        .iter()
        .enumerate()
        .map(|(i, fp)| (fp.dis_no.clone(), i))
        .collect();
    let by_key = Arc::new(by_key);

    let tasks: Vec<_> = (0..ours.len())
        .map(|i| {
            let ours = Arc::clone(&ours);
            let reference = Arc::clone(&reference);
            let by_key = Arc::clone(&by_key);
            tokio::task::spawn_blocking(move || {
                let mine = &ours[i];
                by_key
                    .get(&mine.dis_no)
                    .map(|&j| comparison_row(mine, &reference[j]))
            })
        })
        .collect();

    let mut rows: Vec<ComparisonRow> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(|res| match res {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Comparison task failed: {e}");
                None
            }
        })
        .collect();

    rows.sort_by(|a, b| a.dis_no.cmp(&b.dis_no));
    log::info!("Compared {} common events", rows.len());
    rows
}

fn comparison_row(mine: &NationalFootprint, reference: &NationalFootprint) -> ComparisonRow {
    let area = geometry::area_km2(&mine.geometry);
    let reference_area = geometry::area_km2(&reference.geometry);
    let absolute = (area - reference_area).abs();
    let larger = area.max(reference_area);
    let fraction = if larger > 0.0 { absolute / larger } else { 0.0 };

    ComparisonRow {
        dis_no: mine.dis_no.clone(),
        area_km2: area,
        reference_area_km2: reference_area,
        absolute_mismatch_km2: absolute,
        mismatch_fraction: fraction,
        over_threshold: fraction > MISMATCH_THRESHOLD,
        levels: levels_string(&mine.levels),
        reference_levels: levels_string(&reference.levels),
        quality: mine.quality,
        reference_quality: reference.quality,
    }
}

fn levels_string(levels: &[u8]) -> String {
    levels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn footprint(event: &str, size: f64, quality: u8) -> NationalFootprint {
        NationalFootprint {
            dis_no: EventKey::parse(event).unwrap(),
            iso3: "AAA".to_string(),
            names: "Alpha".to_string(),
            codes: "10".to_string(),
            levels: vec![1],
            quality,
            regional_flags: vec![quality],
            geometry: MultiPolygon(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: size, y: 0.0),
                (x: size, y: size),
                (x: 0.0, y: size),
            ]]),
        }
    }

    #[tokio::test]
    async fn equal_footprints_are_not_flagged() {
        let ours = Arc::new(vec![footprint("2000-0001-AAA", 1.0, 2)]);
        let reference = Arc::new(vec![footprint("2000-0001-AAA", 1.0, 1)]);

        let rows = compare(ours, reference).await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].over_threshold);
        assert!(rows[0].mismatch_fraction < 1e-9);
        assert_eq!(rows[0].quality, 2);
        assert_eq!(rows[0].reference_quality, 1);
    }

    #[tokio::test]
    async fn large_mismatch_is_flagged() {
        let ours = Arc::new(vec![footprint("2000-0001-AAA", 2.0, 2)]);
        let reference = Arc::new(vec![footprint("2000-0001-AAA", 1.0, 2)]);

        let rows = compare(ours, reference).await;
        assert!(rows[0].over_threshold);
        // Normalized against the larger footprint: a 2°x2° square vs a
        // 1°x1° square differs by three quarters of the larger area.
        assert!(rows[0].mismatch_fraction <= 1.0);
        assert!((rows[0].mismatch_fraction - 0.75).abs() < 0.01);
    }

    #[tokio::test]
    async fn mismatch_direction_does_not_change_the_fraction() {
        let ours = Arc::new(vec![footprint("2000-0001-AAA", 1.0, 2)]);
        let reference = Arc::new(vec![footprint("2000-0001-AAA", 2.0, 2)]);

        let rows = compare(ours, reference).await;
        assert!(rows[0].mismatch_fraction <= 1.0);
        assert!((rows[0].mismatch_fraction - 0.75).abs() < 0.01);
    }

    #[tokio::test]
    async fn uncommon_events_are_skipped_and_output_is_ordered() {
        let ours = Arc::new(vec![
            footprint("2000-0002-AAA", 1.0, 2),
            footprint("2000-0001-AAA", 1.0, 2),
            footprint("2000-0009-AAA", 1.0, 2),
        ]);
        let reference = Arc::new(vec![
            footprint("2000-0001-AAA", 1.0, 2),
            footprint("2000-0002-AAA", 1.0, 2),
        ]);

        let rows = compare(ours, reference).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dis_no.as_str(), "2000-0001-AAA");
        assert_eq!(rows[1].dis_no.as_str(), "2000-0002-AAA");
    }
}
