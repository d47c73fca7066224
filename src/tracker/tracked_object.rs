//! A persistent object identity built from matched candidates.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::tracker::candidate::{ObjectCandidate, Record};
use crate::tracker::geometry::Point;
use crate::tracker::track_state::{ClassLabel, Direction, TrackStatus, TravelStatus};

/// Global track ID counter for unique ID generation.
static TRACK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get the next unique track ID.
fn next_track_id() -> u64 {
    TRACK_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Per-camera constants used to turn pixel motion into km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub frame_rate: f32,
    pub meters_per_pixel: f32,
    /// Speeds below this (km/h) are reported as 0
    pub speed_noise_floor: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            meters_per_pixel: 0.14444,
            speed_noise_floor: 1.0,
        }
    }
}

/// Single tracked object.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Unique track identifier
    pub track_id: u64,
    history: Vec<Record>,
    status: TrackStatus,
    pub travel_status: TravelStatus,
    direction: Direction,
    pub zone_index: Option<usize>,
    pub label: ClassLabel,
    /// Classifier confidence, negative until classified
    pub confidence: f32,
    /// Estimated speed in km/h
    speed: f32,
}

impl TrackedObject {
    /// Start a new track from an unmatched candidate.
    pub fn from_candidate(candidate: ObjectCandidate) -> Self {
        Self {
            track_id: next_track_id(),
            history: vec![candidate.record],
            status: TrackStatus::Entering,
            travel_status: TravelStatus::Normal,
            direction: Direction::Downstream,
            zone_index: candidate.zone_index,
            label: candidate.label,
            confidence: candidate.confidence,
            speed: 0.0,
        }
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn history(&self) -> &[Record] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Most recent record. History is never empty for a constructed track.
    pub fn latest(&self) -> &Record {
        &self.history[self.history.len() - 1]
    }

    pub fn first(&self) -> &Record {
        &self.history[0]
    }

    /// Record `depth` frames back from the latest one.
    pub fn lookback(&self, depth: usize) -> Option<&Record> {
        self.history.iter().rev().nth(depth)
    }

    /// Centroids oldest first.
    pub fn trajectory(&self) -> impl Iterator<Item = Point> + '_ {
        self.history.iter().map(|r| r.position)
    }

    /// Extend the track with a matched candidate and refresh derived state.
    pub fn update(&mut self, candidate: ObjectCandidate, motion: &MotionConfig) {
        self.history.push(candidate.record);
        self.label = candidate.label;
        self.confidence = candidate.confidence;

        let previous = self.status;
        self.update_status();
        self.update_direction();

        if previous != TrackStatus::Ready && self.status == TrackStatus::Ready {
            self.speed = 0.0;
        } else {
            self.speed = self.estimate_speed(motion);
        }
    }

    fn update_status(&mut self) {
        let next = match self.history.len() {
            0 | 1 => TrackStatus::Entering,
            2 => TrackStatus::Validating,
            _ if self.status == TrackStatus::Validating => TrackStatus::Ready,
            _ => self.status,
        };
        self.status = self.status.max(next);
    }

    fn update_direction(&mut self) {
        if matches!(self.status, TrackStatus::Validating | TrackStatus::Ready) {
            let displacement = self.latest().position.y - self.first().position.y;
            self.direction = if displacement > 0.0 {
                Direction::Downstream
            } else {
                Direction::Upstream
            };
        }
    }

    /// Image-space speed averaged over the whole history.
    fn pixel_speed(&self, frame_rate: f32) -> f32 {
        let displacement = nalgebra::distance(&self.first().position, &self.latest().position);
        displacement * frame_rate * 3.6 / self.history.len() as f32
    }

    fn estimate_speed(&self, motion: &MotionConfig) -> f32 {
        let speed = self.pixel_speed(motion.frame_rate) * motion.meters_per_pixel;
        if speed < motion.speed_noise_floor { 0.0 } else { speed }
    }

    /// Write back a label from an external classifier.
    pub fn set_classification(&mut self, label: ClassLabel, confidence: f32) {
        self.label = label;
        self.confidence = confidence;
    }

    /// Promote a `Ready` object to `Counted`. Returns false for any other status.
    pub fn mark_counted(&mut self) -> bool {
        if self.status == TrackStatus::Ready {
            self.status = TrackStatus::Counted;
            true
        } else {
            false
        }
    }

    pub fn mark_retired(&mut self) {
        self.status = TrackStatus::Retired;
    }
}
