use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::tracker::{ClassLabel, TrackStatus, TrackedObject, TravelStatus};
use crate::zone::ObservationZone;

/// Running per-class counts and speed statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counter {
    counts: BTreeMap<ClassLabel, u64>,
    total_speed: f64,
    average_speed: f64,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            counts: ClassLabel::ALL.iter().map(|&label| (label, 0)).collect(),
            total_speed: 0.0,
            average_speed: 0.0,
        }
    }
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one object of `label` travelling at `speed` km/h.
    ///
    /// Every counted speed is added to the total, but the average is taken
    /// over the three vehicle classes only.
    pub fn record(&mut self, label: ClassLabel, speed: f32) {
        *self.counts.entry(label).or_insert(0) += 1;
        self.total_speed += f64::from(speed);

        let vehicles = self.vehicle_total();
        self.average_speed = if vehicles == 0 {
            0.0
        } else {
            self.total_speed / vehicles as f64
        };
    }

    pub fn count(&self, label: ClassLabel) -> u64 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Objects counted across every label.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Objects counted in the three vehicle classes.
    pub fn vehicle_total(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(label, _)| label.is_vehicle_class())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total_speed(&self) -> f64 {
        self.total_speed
    }

    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }
}

/// Apply zone rules to every `Ready` object with a zone: set its travel status
/// and count it once it reaches the counting band.
///
/// Returns the ids of objects counted in this call.
pub fn evaluate_and_count(
    tracked: &mut [TrackedObject],
    zones: &[ObservationZone],
    counter: &mut Counter,
) -> Vec<u64> {
    let mut counted = Vec::new();
    for object in tracked.iter_mut() {
        if object.status() != TrackStatus::Ready {
            continue;
        }
        let Some(zone) = object
            .zone_index
            .and_then(|index| zones.iter().find(|z| z.index == index))
        else {
            continue;
        };

        object.travel_status = if zone.is_violated(object) {
            TravelStatus::WrongWayDriving
        } else {
            TravelStatus::Normal
        };

        if zone.is_countable(object) && object.mark_counted() {
            counter.record(object.label, object.speed());
            info!(
                track_id = object.track_id,
                zone = zone.index,
                label = ?object.label,
                speed = object.speed(),
                wrong_way = object.travel_status == TravelStatus::WrongWayDriving,
                "object counted"
            );
            counted.push(object.track_id);
        } else {
            debug!(track_id = object.track_id, zone = zone.index, "object not in counting band");
        }
    }
    counted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_vehicle_classes() {
        let mut counter = Counter::new();
        counter.record(ClassLabel::Class1, 40.0);
        counter.record(ClassLabel::Class3, 60.0);
        assert_eq!(counter.vehicle_total(), 2);
        assert!((counter.average_speed() - 50.0).abs() < 1e-9);

        // Unclassified objects add speed but not to the denominator
        counter.record(ClassLabel::Unidentified, 30.0);
        assert_eq!(counter.total(), 3);
        assert!((counter.total_speed() - 130.0).abs() < 1e-9);
        assert!((counter.average_speed() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_without_vehicle_classes_is_zero() {
        let mut counter = Counter::new();
        counter.record(ClassLabel::Blocked, 25.0);
        assert_eq!(counter.count(ClassLabel::Blocked), 1);
        assert_eq!(counter.average_speed(), 0.0);
        assert_eq!(counter.total_speed(), 25.0);
    }

    #[test]
    fn test_default_has_all_labels() {
        let counter = Counter::default();
        for label in ClassLabel::ALL {
            assert_eq!(counter.count(label), 0);
        }
        assert_eq!(counter.total(), 0);
    }
}
