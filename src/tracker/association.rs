//! Frame-by-frame association of candidates with tracked objects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tracker::candidate::ObjectCandidate;
use crate::tracker::matching;
use crate::tracker::track_state::CandidateState;
use crate::tracker::tracked_object::{MotionConfig, TrackedObject};

/// How candidates are assigned to tracks once they pass the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssociationStrategy {
    /// Tracks in creation order each take the first passing candidate.
    #[default]
    Greedy,
    /// Minimum-cost assignment over the same gate.
    Optimal,
}

/// Configuration for the association engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of history frames a candidate may be compared against
    pub lookback_limit: usize,
    /// Horizontal tolerance in pixels per frame of lookback
    pub max_horizontal_distance: f32,
    /// Vertical tolerance in pixels per frame of lookback
    pub max_vertical_distance: f32,
    /// Minimum smaller/larger size ratio
    pub min_size_ratio: f32,
    pub strategy: AssociationStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            lookback_limit: 6,
            max_horizontal_distance: 2.0,
            max_vertical_distance: 8.0,
            min_size_ratio: 0.6,
            strategy: AssociationStrategy::Greedy,
        }
    }
}

/// Outcome of associating one frame.
#[derive(Debug, Clone, Default)]
pub struct Association {
    /// Surviving tracks in creation order, followed by tracks spawned this frame
    pub tracked: Vec<TrackedObject>,
    /// (track id, candidate index) for every extended track
    pub matched: Vec<(u64, usize)>,
    /// Ids of tracks started from unmatched candidates
    pub spawned: Vec<u64>,
    /// Ids of tracks dropped this frame
    pub retired: Vec<u64>,
}

/// Associate one frame of candidates with the current tracks.
///
/// With no candidates every track is retired. Otherwise each track either
/// absorbs the candidate assigned to it or is retired, and every candidate
/// left unclaimed starts a new track.
pub fn associate(
    mut candidates: Vec<ObjectCandidate>,
    tracked: Vec<TrackedObject>,
    config: &TrackerConfig,
    motion: &MotionConfig,
) -> Association {
    if candidates.is_empty() {
        let retired: Vec<u64> = tracked.iter().map(|t| t.track_id).collect();
        if !retired.is_empty() {
            debug!(count = retired.len(), "no candidates this frame, retiring all tracks");
        }
        return Association {
            retired,
            ..Association::default()
        };
    }

    let assignment = match config.strategy {
        AssociationStrategy::Greedy => matching::greedy_assignment(&tracked, &candidates, config),
        AssociationStrategy::Optimal => matching::optimal_assignment(&tracked, &candidates, config),
    };

    for j in assignment.iter().flatten() {
        candidates[*j].state = CandidateState::Matched;
    }

    let mut result = Association::default();
    let mut candidates: Vec<Option<ObjectCandidate>> = candidates.into_iter().map(Some).collect();

    for (mut track, assigned) in tracked.into_iter().zip(assignment) {
        match assigned.and_then(|j| candidates[j].take().map(|c| (j, c))) {
            Some((j, candidate)) => {
                track.update(candidate, motion);
                result.matched.push((track.track_id, j));
                result.tracked.push(track);
            }
            None => {
                track.mark_retired();
                debug!(track_id = track.track_id, len = track.len(), "track retired");
                result.retired.push(track.track_id);
            }
        }
    }

    for candidate in candidates.into_iter().flatten() {
        if !candidate.is_new() {
            continue;
        }
        let track = TrackedObject::from_candidate(candidate);
        debug!(track_id = track.track_id, "track spawned");
        result.spawned.push(track.track_id);
        result.tracked.push(track);
    }

    result
}

/// Owns the tracked set across frames.
#[derive(Debug, Default)]
pub struct Tracker {
    tracked: Vec<TrackedObject>,
    frame_id: u64,
    config: TrackerConfig,
    motion: MotionConfig,
}

impl Tracker {
    pub fn new(config: TrackerConfig, motion: MotionConfig) -> Self {
        Self {
            tracked: Vec::new(),
            frame_id: 0,
            config,
            motion,
        }
    }

    /// Associate this frame's candidates and replace the tracked set.
    ///
    /// The returned report's `tracked` is empty; the tracks stay here.
    pub fn update(&mut self, candidates: Vec<ObjectCandidate>) -> Association {
        self.frame_id += 1;
        let tracked = std::mem::take(&mut self.tracked);
        let mut association = associate(candidates, tracked, &self.config, &self.motion);
        self.tracked = std::mem::take(&mut association.tracked);
        debug!(
            frame_id = self.frame_id,
            tracked = self.tracked.len(),
            spawned = association.spawned.len(),
            retired = association.retired.len(),
            "frame associated"
        );
        association
    }

    pub fn tracked(&self) -> &[TrackedObject] {
        &self.tracked
    }

    /// Mutable access for zone evaluation and classifier write-back.
    pub fn tracked_mut(&mut self) -> &mut [TrackedObject] {
        &mut self.tracked
    }

    pub fn get(&self, track_id: u64) -> Option<&TrackedObject> {
        self.tracked.iter().find(|t| t.track_id == track_id)
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }
}
