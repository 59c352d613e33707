//! Per-event national footprint dissolve.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use geo_disasters_boundaries::geometry;
use geo_disasters_catalog::EventKey;

use crate::ResolvedLocation;

/// Separator for aggregated name and code strings.
const JOIN_SEPARATOR: &str = " - ";

/// One geometry per event: the union of its resolved locations.
#[derive(Debug, Clone)]
pub struct NationalFootprint {
    /// Event key.
    pub dis_no: EventKey,
    /// Country ISO3 code.
    pub iso3: String,
    /// Distinct constituent unit names, sorted, `" - "`-joined.
    pub names: String,
    /// Distinct constituent unit codes, sorted, `" - "`-joined.
    pub codes: String,
    /// Distinct admin levels present, ascending.
    pub levels: Vec<u8>,
    /// Worst (maximum) quality flag across constituents.
    pub quality: u8,
    /// Per-constituent quality flags, in constituent order.
    pub regional_flags: Vec<u8>,
    /// Unioned geometry.
    pub geometry: MultiPolygon<f64>,
}

/// Dissolves resolved locations into one footprint per event.
///
/// Aggregated strings are built from sorted, de-duplicated values so
/// the same input set always produces byte-identical output regardless
/// of row order.
#[must_use]
pub fn dissolve_national(locations: &[ResolvedLocation]) -> Vec<NationalFootprint> {
    let mut by_event: BTreeMap<&EventKey, Vec<&ResolvedLocation>> = BTreeMap::new();
    for location in locations {
        by_event.entry(&location.dis_no).or_default().push(location);
    }

    let mut footprints = Vec::with_capacity(by_event.len());
    for (dis_no, mut rows) in by_event {
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let geometries: Vec<MultiPolygon<f64>> =
            rows.iter().map(|r| r.geometry.clone()).collect();

        let mut names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        let mut codes: Vec<i64> = rows.iter().map(|r| r.code).collect();
        codes.sort_unstable();
        codes.dedup();

        let mut levels: Vec<u8> = rows.iter().map(|r| r.level.as_number()).collect();
        levels.sort_unstable();
        levels.dedup();

        footprints.push(NationalFootprint {
            dis_no: dis_no.clone(),
            iso3: rows[0].iso3.clone(),
            names: names.join(JOIN_SEPARATOR),
            codes: codes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(JOIN_SEPARATOR),
            levels,
            quality: rows.iter().map(|r| r.quality).max().unwrap_or(4),
            regional_flags: rows.iter().map(|r| r.quality).collect(),
            geometry: geometry::repair(&geometry::dissolve(&geometries)),
        });
    }

    log::info!(
        "Dissolved {} locations into {} national footprints",
        locations.len(),
        footprints.len()
    );
    footprints
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use geo_disasters_boundaries::AdminLevel;

    fn location(event: &str, code: i64, name: &str, quality: u8, origin: f64) -> ResolvedLocation {
        ResolvedLocation {
            dis_no: EventKey::parse(event).unwrap(),
            iso3: "AAA".to_string(),
            level: AdminLevel::Level1,
            code,
            name: name.to_string(),
            mention: None,
            quality,
            geometry: MultiPolygon(vec![polygon![
                (x: origin, y: 0.0),
                (x: origin + 1.0, y: 0.0),
                (x: origin + 1.0, y: 1.0),
                (x: origin, y: 1.0),
            ]]),
        }
    }

    #[test]
    fn aggregates_names_codes_and_worst_quality() {
        let rows = vec![
            location("2000-0001-AAA", 20, "Beta", 3, 5.0),
            location("2000-0001-AAA", 10, "Alpha", 1, 0.0),
        ];
        let out = dissolve_national(&rows);

        assert_eq!(out.len(), 1);
        let fp = &out[0];
        assert_eq!(fp.names, "Alpha - Beta");
        assert_eq!(fp.codes, "10 - 20");
        assert_eq!(fp.quality, 3);
        assert_eq!(fp.regional_flags, vec![1, 3]);
        assert_eq!(fp.levels, vec![1]);
    }

    #[test]
    fn output_is_order_independent() {
        let a = vec![
            location("2000-0001-AAA", 10, "Alpha", 1, 0.0),
            location("2000-0001-AAA", 20, "Beta", 2, 5.0),
        ];
        let b: Vec<_> = a.iter().rev().cloned().collect();

        let fa = dissolve_national(&a);
        let fb = dissolve_national(&b);
        assert_eq!(fa[0].names, fb[0].names);
        assert_eq!(fa[0].codes, fb[0].codes);
        assert_eq!(fa[0].regional_flags, fb[0].regional_flags);
    }

    #[test]
    fn union_covers_all_constituents() {
        let rows = vec![
            location("2000-0001-AAA", 10, "Alpha", 1, 0.0),
            location("2000-0001-AAA", 20, "Beta", 1, 5.0),
        ];
        let out = dissolve_national(&rows);
        let area = geometry::area_km2(&out[0].geometry);
        let parts: f64 = rows.iter().map(|r| geometry::area_km2(&r.geometry)).sum();
        assert!((area - parts).abs() / parts < 0.01);
    }

    #[test]
    fn events_dissolve_independently() {
        let rows = vec![
            location("2000-0001-AAA", 10, "Alpha", 1, 0.0),
            location("2000-0002-AAA", 20, "Beta", 2, 5.0),
        ];
        let out = dissolve_national(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].dis_no.as_str(), "2000-0001-AAA");
        assert_eq!(out[1].dis_no.as_str(), "2000-0002-AAA");
    }
}
