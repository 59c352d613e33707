//! Event-level filters applied before the final dataset.

use geo_disasters_catalog::DisasterEvent;
use geo_disasters_catalog::corrections::Corrections;

/// Whether an event belongs in the final climate-disaster dataset.
///
/// Keeps climatological/hydrological/meteorological types from the
/// configured list, requires at least one impact figure, and honors the
/// manually-dropped event list.
#[must_use]
pub fn is_reportable(event: &DisasterEvent, corrections: &Corrections) -> bool {
    corrections.is_climate_type(&event.disaster_type)
        && event.has_impact_data()
        && !corrections.is_dropped_event(event.dis_no.as_str())
}

/// Applies [`is_reportable`] to a batch, logging what was removed.
#[must_use]
pub fn retain_reportable(
    events: Vec<DisasterEvent>,
    corrections: &Corrections,
) -> Vec<DisasterEvent> {
    let total = events.len();
    let kept: Vec<DisasterEvent> = events
        .into_iter()
        .filter(|event| {
            let keep = is_reportable(event, corrections);
            if !keep {
                log::debug!(
                    "{}: filtered out ({}, impact data: {})",
                    event.dis_no,
                    event.disaster_type,
                    event.has_impact_data()
                );
            }
            keep
        })
        .collect();
    log::info!("Retained {} of {total} events after filters", kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_disasters_catalog::EventKey;

    fn event(key: &str, disaster_type: &str, affected: Option<f64>) -> DisasterEvent {
        DisasterEvent {
            dis_no: EventKey::parse(key).unwrap(),
            iso3: key[key.len() - 3..].to_string(),
            disaster_group: "Natural".to_string(),
            disaster_type: disaster_type.to_string(),
            disaster_subtype: None,
            location: None,
            admin_units: None,
            total_deaths: None,
            total_affected: affected,
            total_damage: None,
        }
    }

    #[test]
    fn keeps_climate_events_with_impact() {
        let corrections = Corrections::embedded();
        assert!(is_reportable(
            &event("2001-0100-IND", "Flood", Some(500.0)),
            corrections
        ));
    }

    #[test]
    fn drops_non_climate_types() {
        let corrections = Corrections::embedded();
        assert!(!is_reportable(
            &event("2001-0101-IND", "Epidemic", Some(500.0)),
            corrections
        ));
    }

    #[test]
    fn drops_events_without_impact_figures() {
        let corrections = Corrections::embedded();
        assert!(!is_reportable(&event("2001-0102-IND", "Flood", None), corrections));
    }

    #[test]
    fn honors_the_manual_drop_list() {
        let corrections = Corrections::embedded();
        assert!(!is_reportable(
            &event("1993-0585-IRN", "Flood", Some(10.0)),
            corrections
        ));
    }

    #[test]
    fn batch_filter_counts_survivors() {
        let corrections = Corrections::embedded();
        let kept = retain_reportable(
            vec![
                event("2001-0100-IND", "Flood", Some(500.0)),
                event("2001-0101-IND", "Epidemic", Some(500.0)),
            ],
            corrections,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].dis_no.as_str(), "2001-0100-IND");
    }
}
