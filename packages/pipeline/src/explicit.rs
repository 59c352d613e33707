//! The explicit-code resolution path.
//!
//! Newer catalog records carry formal admin-unit codes directly, so no
//! geocoding is involved and the rows get the best quality flag. One
//! output row per referenced unit; level-1 and level-2 references
//! become separate rows.

use geo_disasters_boundaries::AdminLevel;
use geo_disasters_catalog::{DisasterEvent, admin_units};

use crate::PendingLocation;

/// Extracts explicit-coded locations from the catalog records.
///
/// Records whose embedded list fails the typed parse are logged and
/// skipped; one bad record must not abort the batch.
#[must_use]
pub fn explicit_locations(events: &[DisasterEvent]) -> Vec<PendingLocation> {
    let mut rows = Vec::new();
    let mut malformed = 0_usize;

    for event in events {
        let Some(raw) = event.admin_units.as_deref() else {
            continue;
        };
        let list = match admin_units::parse_admin_units(raw) {
            Ok(list) => list,
            Err(e) => {
                log::warn!("{}: skipping admin-unit list: {e}", event.dis_no);
                malformed += 1;
                continue;
            }
        };

        for unit in &list.adm1 {
            rows.push(row(event, AdminLevel::Level1, unit));
        }
        for unit in &list.adm2 {
            rows.push(row(event, AdminLevel::Level2, unit));
        }
    }

    log::info!(
        "Explicit-code path produced {} locations ({malformed} malformed lists skipped)",
        rows.len()
    );
    rows
}

fn row(event: &DisasterEvent, level: AdminLevel, unit: &admin_units::AdminUnitRef) -> PendingLocation {
    PendingLocation {
        dis_no: event.dis_no.clone(),
        iso3: event.iso3.clone(),
        level,
        code: unit.code,
        name: unit.name.clone(),
        mention: None,
        quality: 1,
    }
}
