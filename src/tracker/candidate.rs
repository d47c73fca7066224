//! Per-frame detections and the record they contribute to a track's history.

use ndarray::{Array1, Array2, Array3};
use thiserror::Error;

use crate::tracker::geometry::{self, Contour, Ellipse, Point};
use crate::tracker::rect::Rect;
use crate::tracker::track_state::{CandidateState, ClassLabel};

/// Geometry that cannot describe a real object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateError {
    #[error("contour has no points")]
    EmptyContour,
    #[error("object size must be positive, got {0}")]
    NonPositiveSize(f32),
    #[error("minimum-area rectangle of the contour is degenerate")]
    DegenerateShape,
    #[error("occupancy mask is empty")]
    EmptyMask,
}

/// Everything observed about one object in one frame.
///
/// All per-frame fields live together so history entries are appended and
/// dropped as a unit.
#[derive(Debug, Clone)]
pub struct Record {
    /// Centroid in whole pixels (fitted ellipse centre, truncated)
    pub position: Point,
    pub bbox: Rect,
    pub ellipse: Ellipse,
    pub contour: Contour,
    /// Colour crop at `bbox`, shape (rows, cols, channels)
    pub crop: Array3<u8>,
    /// Foreground mask at `bbox`
    pub mask: Array2<u8>,
    /// Ellipse axis product
    pub size: f32,
    /// Minor / major edge of the minimum-area rectangle
    pub dimension_ratio: f32,
    /// Foreground pixels / mask pixels
    pub density_ratio: f32,
}

impl Record {
    /// Build a record and derive its shape descriptors.
    pub fn new(
        ellipse: Ellipse,
        contour: Contour,
        bbox: Rect,
        crop: Array3<u8>,
        mask: Array2<u8>,
    ) -> Result<Self, CandidateError> {
        if contour.is_empty() {
            return Err(CandidateError::EmptyContour);
        }
        let size = ellipse.axis_product();
        if size.is_nan() || size <= 0.0 {
            return Err(CandidateError::NonPositiveSize(size));
        }
        let dimension_ratio = geometry::min_area_rect(&contour)
            .map(|r| r.dimension_ratio())
            .filter(|ratio| *ratio > 0.0)
            .ok_or(CandidateError::DegenerateShape)?;
        if mask.is_empty() {
            return Err(CandidateError::EmptyMask);
        }
        let density_ratio = density_ratio(&mask);

        Ok(Self {
            position: Point::new(ellipse.center.x.trunc(), ellipse.center.y.trunc()),
            bbox,
            ellipse,
            contour,
            crop,
            mask,
            size,
            dimension_ratio,
            density_ratio,
        })
    }

    /// The ten classification features, in order: box height, box width,
    /// ellipse height, ellipse width, ellipse area, object size, convex hull
    /// area, perimeter, dimension ratio, density ratio.
    pub fn features(&self) -> Array1<f32> {
        let hull_area = geometry::contour_area(&geometry::convex_hull(&self.contour));
        Array1::from(vec![
            self.bbox.height,
            self.bbox.width,
            self.ellipse.height,
            self.ellipse.width,
            self.ellipse.area(),
            self.size,
            hull_area,
            geometry::perimeter(&self.contour),
            self.dimension_ratio,
            self.density_ratio,
        ])
    }
}

fn density_ratio(mask: &Array2<u8>) -> f32 {
    let occupied = mask.iter().filter(|&&px| px != 0).count();
    occupied as f32 / mask.len() as f32
}

/// One detection in the current frame, not yet linked to any track.
#[derive(Debug, Clone)]
pub struct ObjectCandidate {
    pub record: Record,
    /// Observation zone containing the centroid, if any
    pub zone_index: Option<usize>,
    pub state: CandidateState,
    pub label: ClassLabel,
    /// Classifier confidence, negative until classified
    pub confidence: f32,
}

impl ObjectCandidate {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            zone_index: None,
            state: CandidateState::New,
            label: ClassLabel::Unidentified,
            confidence: -1.0,
        }
    }

    pub fn position(&self) -> Point {
        self.record.position
    }

    pub fn size(&self) -> f32 {
        self.record.size
    }

    pub fn with_label(mut self, label: ClassLabel, confidence: f32) -> Self {
        self.label = label;
        self.confidence = confidence;
        self
    }

    pub fn is_new(&self) -> bool {
        self.state == CandidateState::New
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_contour(w: f32, h: f32) -> Contour {
        vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }

    #[test]
    fn test_record_descriptors() {
        let mut mask = Array2::<u8>::zeros((4, 5));
        mask.slice_mut(ndarray::s![0..2, ..]).fill(255);
        let record = Record::new(
            Ellipse::new(Point::new(10.7, 20.2), 8.0, 4.0, 0.0),
            rect_contour(8.0, 4.0),
            Rect::new(6.0, 18.0, 8.0, 4.0),
            Array3::zeros((4, 8, 3)),
            mask,
        )
        .unwrap();

        assert_eq!(record.position, Point::new(10.0, 20.0));
        assert_eq!(record.size, 32.0);
        assert!((record.dimension_ratio - 0.5).abs() < 1e-5);
        assert!((record.density_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_features_layout() {
        let record = Record::new(
            Ellipse::new(Point::new(5.0, 5.0), 10.0, 10.0, 0.0),
            rect_contour(10.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 12.0),
            Array3::zeros((12, 10, 3)),
            Array2::from_elem((12, 10), 1),
        )
        .unwrap();

        let features = record.features();
        assert_eq!(features.len(), 10);
        assert_eq!(features[0], 12.0);
        assert_eq!(features[1], 10.0);
        assert_eq!(features[5], 100.0);
        assert!((features[6] - 100.0).abs() < 1e-4);
        assert!((features[7] - 40.0).abs() < 1e-4);
        assert_eq!(features[9], 1.0);
    }

    #[test]
    fn test_rejects_degenerate_geometry() {
        let ellipse = Ellipse::new(Point::new(0.0, 0.0), 4.0, 4.0, 0.0);
        let mask = || Array2::from_elem((2, 2), 1u8);

        let err = Record::new(ellipse, vec![], Rect::default(), Array3::zeros((0, 0, 3)), mask());
        assert_eq!(err.unwrap_err(), CandidateError::EmptyContour);

        let flat = Ellipse::new(Point::new(0.0, 0.0), 0.0, 4.0, 0.0);
        let err = Record::new(flat, rect_contour(2.0, 2.0), Rect::default(), Array3::zeros((0, 0, 3)), mask());
        assert_eq!(err.unwrap_err(), CandidateError::NonPositiveSize(0.0));

        let line = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
        let err = Record::new(ellipse, line, Rect::default(), Array3::zeros((0, 0, 3)), mask());
        assert_eq!(err.unwrap_err(), CandidateError::DegenerateShape);

        let err = Record::new(
            ellipse,
            rect_contour(2.0, 2.0),
            Rect::default(),
            Array3::zeros((0, 0, 3)),
            Array2::zeros((0, 0)),
        );
        assert_eq!(err.unwrap_err(), CandidateError::EmptyMask);
    }
}
