mod association;
mod candidate;
pub mod geometry;
mod matching;
mod rect;
mod track_state;
mod tracked_object;

pub use association::{Association, AssociationStrategy, Tracker, TrackerConfig, associate};
pub use candidate::{CandidateError, ObjectCandidate, Record};
pub use matching::passes_gate;
pub use rect::Rect;
pub use track_state::{CandidateState, ClassLabel, Direction, TrackStatus, TravelStatus};
pub use tracked_object::{MotionConfig, TrackedObject};
