//! Traits for the collaborators around the tracker.

use std::convert::Infallible;

use ndarray::{Array2, Array3};

use crate::tracker::ObjectCandidate;

/// One frame of input: foreground mask plus background and colour images.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Binary foreground mask, (rows, cols)
    pub foreground: Array2<u8>,
    /// Background model, (rows, cols, channels)
    pub background: Array3<u8>,
    /// Colour image, (rows, cols, channels)
    pub color: Array3<u8>,
}

impl Frame {
    pub fn new(foreground: Array2<u8>, background: Array3<u8>, color: Array3<u8>) -> Self {
        Self {
            foreground,
            background,
            color,
        }
    }

    /// (rows, cols) of the foreground mask.
    pub fn dim(&self) -> (usize, usize) {
        self.foreground.dim()
    }
}

/// Turns a frame into per-blob candidates.
///
/// Implementations segment the foreground mask into contours and build one
/// [`ObjectCandidate`] per valid contour, typically with
/// [`ContourFilter`](super::ContourFilter) and
/// [`CandidateBuilder`](super::CandidateBuilder).
pub trait CandidateSource {
    /// Error type for detection failures.
    type Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<ObjectCandidate>, Self::Error>;
}

/// Classifier output: labelled candidates, and blobs that look like several
/// merged vehicles.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub objects: Vec<ObjectCandidate>,
    pub occluded: Vec<ObjectCandidate>,
}

/// Assigns class labels and confidences to candidates.
pub trait Classifier {
    type Error;

    fn classify(&mut self, candidates: Vec<ObjectCandidate>) -> Result<Classified, Self::Error>;
}

/// Splits an occluded blob into the individual vehicles it contains.
pub trait OcclusionResolver {
    type Error;

    fn resolve(
        &mut self,
        occluded: Vec<ObjectCandidate>,
        frame: &Frame,
    ) -> Result<Vec<ObjectCandidate>, Self::Error>;
}

/// Leaves candidates untouched: nothing is labelled, nothing is split.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Classifier for PassThrough {
    type Error = Infallible;

    fn classify(&mut self, candidates: Vec<ObjectCandidate>) -> Result<Classified, Self::Error> {
        Ok(Classified {
            objects: candidates,
            occluded: Vec::new(),
        })
    }
}

impl OcclusionResolver for PassThrough {
    type Error = Infallible;

    fn resolve(
        &mut self,
        occluded: Vec<ObjectCandidate>,
        _frame: &Frame,
    ) -> Result<Vec<ObjectCandidate>, Self::Error> {
        Ok(occluded)
    }
}
