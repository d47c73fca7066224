//! Contour-based vehicle tracking with zone counting.
//!
//! Per-frame candidates produced by a foreground-mask detector are associated
//! with existing tracks by a gated, lookback-tolerant greedy matcher. Tracks
//! that mature inside an observation zone are checked for wrong-way driving
//! and counted once when they cross the zone's counting band.

pub mod integration;
pub mod tracker;
pub mod zone;

pub use integration::{CandidateBuilder, ContourFilter, Frame, FramePipeline};
pub use tracker::{
    Association, AssociationStrategy, ClassLabel, Direction, MotionConfig, ObjectCandidate,
    Rect, TrackStatus, TrackedObject, Tracker, TrackerConfig, TravelStatus,
};
pub use zone::{Counter, ObservationZone, load_zone_config};
