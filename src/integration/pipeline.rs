//! FramePipeline for combining detection, tracking and counting.

use thiserror::Error;
use tracing::debug;

use crate::integration::{CandidateSource, Classifier, Frame, OcclusionResolver, PassThrough};
use crate::tracker::{
    Association, CandidateState, MotionConfig, ObjectCandidate, TrackedObject, Tracker,
    TrackerConfig,
};
use crate::zone::{Counter, ObservationZone, assign_zone, evaluate_and_count};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no observation zones configured")]
    NoZones,
    #[error("candidate detection failed")]
    Detection(#[source] BoxError),
    #[error("classification failed")]
    Classification(#[source] BoxError),
    #[error("occlusion resolution failed")]
    Occlusion(#[source] BoxError),
}

/// What happened to the tracked set in one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub frame_id: u64,
    pub association: Association,
    /// Ids counted this frame
    pub counted: Vec<u64>,
    /// Candidates dropped for lying outside every zone
    pub discarded: Vec<ObjectCandidate>,
}

/// Runs detect → zone filter → classify → resolve occlusion → associate →
/// count, one frame at a time.
///
/// Collaborator failures surface before the tracker is touched, so an error
/// leaves tracks and counts as they were after the previous frame.
pub struct FramePipeline<D, C = PassThrough, O = PassThrough> {
    detector: D,
    classifier: C,
    resolver: O,
    tracker: Tracker,
    zones: Vec<ObservationZone>,
    counter: Counter,
}

impl<D> FramePipeline<D, PassThrough, PassThrough>
where
    D: CandidateSource,
    D::Error: std::error::Error + Send + Sync + 'static,
{
    /// Pipeline without classification or occlusion handling.
    pub fn with_default_config(detector: D, zones: Vec<ObservationZone>) -> Result<Self, PipelineError> {
        Self::new(
            detector,
            PassThrough,
            PassThrough,
            zones,
            TrackerConfig::default(),
            MotionConfig::default(),
        )
    }
}

impl<D, C, O> FramePipeline<D, C, O>
where
    D: CandidateSource,
    D::Error: std::error::Error + Send + Sync + 'static,
    C: Classifier,
    C::Error: std::error::Error + Send + Sync + 'static,
    O: OcclusionResolver,
    O::Error: std::error::Error + Send + Sync + 'static,
{
    /// Create a pipeline. At least one observation zone is required.
    pub fn new(
        detector: D,
        classifier: C,
        resolver: O,
        zones: Vec<ObservationZone>,
        config: TrackerConfig,
        motion: MotionConfig,
    ) -> Result<Self, PipelineError> {
        if zones.is_empty() {
            return Err(PipelineError::NoZones);
        }
        Ok(Self {
            detector,
            classifier,
            resolver,
            tracker: Tracker::new(config, motion),
            zones,
            counter: Counter::new(),
        })
    }

    /// Process a single frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, PipelineError> {
        let detected = self
            .detector
            .detect(frame)
            .map_err(|e| PipelineError::Detection(Box::new(e)))?;
        let (in_zone, mut discarded) = self.filter_by_zone(detected);

        let classified = self
            .classifier
            .classify(in_zone)
            .map_err(|e| PipelineError::Classification(Box::new(e)))?;

        let mut candidates = classified.objects;
        if !classified.occluded.is_empty() {
            let extracted = self
                .resolver
                .resolve(classified.occluded, frame)
                .map_err(|e| PipelineError::Occlusion(Box::new(e)))?;
            let (extracted, dropped) = self.filter_by_zone(extracted);
            discarded.extend(dropped);
            candidates.extend(extracted);
        }

        let association = self.tracker.update(candidates);
        let counted = evaluate_and_count(self.tracker.tracked_mut(), &self.zones, &mut self.counter);

        Ok(FrameReport {
            frame_id: self.tracker.frame_id(),
            association,
            counted,
            discarded,
        })
    }

    /// Keep candidates inside some zone, tagging them with its index.
    /// Candidates already carrying a zone index are kept as they are.
    fn filter_by_zone(&self, candidates: Vec<ObjectCandidate>) -> (Vec<ObjectCandidate>, Vec<ObjectCandidate>) {
        let mut kept = Vec::with_capacity(candidates.len());
        let mut discarded = Vec::new();
        for mut candidate in candidates {
            if candidate.zone_index.is_none() {
                candidate.zone_index = assign_zone(&candidate, &self.zones);
            }
            if candidate.zone_index.is_some() {
                kept.push(candidate);
            } else {
                candidate.state = CandidateState::Discarded;
                debug!(position = ?candidate.position(), "candidate outside every zone");
                discarded.push(candidate);
            }
        }
        (kept, discarded)
    }
}

impl<D, C, O> FramePipeline<D, C, O> {
    /// Tracked objects after the last processed frame, for rendering.
    pub fn tracked(&self) -> &[TrackedObject] {
        self.tracker.tracked()
    }

    pub fn zones(&self) -> &[ObservationZone] {
        &self.zones
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }
}
