use serde::{Deserialize, Serialize};

/// Lifecycle of a per-frame candidate inside the association engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateState {
    /// Not yet consumed by any track
    #[default]
    New,
    /// Appended to an existing track this frame
    Matched,
    /// Dropped before association (outside every zone)
    Discarded,
}

/// Tracked object lifecycle.
///
/// Ordered: a live object only ever moves forward through
/// `Entering < Validating < Ready < Counted`. `Retired` is terminal and
/// reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TrackStatus {
    /// Seen in a single frame
    #[default]
    Entering,
    /// Seen in two frames
    Validating,
    /// Established track, eligible for zone evaluation
    Ready,
    /// Already applied to the counter
    Counted,
    /// Lost; removed at the end of the frame
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelStatus {
    #[default]
    Normal,
    WrongWayDriving,
}

/// Vertical travel direction in image space. Downstream means increasing y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Downstream,
    Upstream,
}

/// Vehicle class reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ClassLabel {
    #[default]
    Unidentified,
    Class1,
    Class2,
    Class3,
    /// Several vehicles merged into one blob
    Blocked,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; 5] = [
        ClassLabel::Unidentified,
        ClassLabel::Class1,
        ClassLabel::Class2,
        ClassLabel::Class3,
        ClassLabel::Blocked,
    ];

    /// Classes that contribute to the average speed denominator.
    pub fn is_vehicle_class(self) -> bool {
        matches!(self, ClassLabel::Class1 | ClassLabel::Class2 | ClassLabel::Class3)
    }
}
