//! Integration module for connecting detection, classification and
//! occlusion-handling backends with the tracker and zone counter.
//!
//! This module provides the collaborator traits, candidate construction
//! helpers and a per-frame pipeline tying them together.

mod builder;
mod detector;
mod pipeline;

pub use builder::{CandidateBuilder, ContourFilter};
pub use detector::{CandidateSource, Classified, Classifier, Frame, OcclusionResolver, PassThrough};
pub use pipeline::{FramePipeline, FrameReport, PipelineError};
