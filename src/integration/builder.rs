//! Builder for creating candidates from detector contours.

use ndarray::{Array2, Array3, s};
use serde::{Deserialize, Serialize};

use crate::integration::Frame;
use crate::tracker::geometry::{self, Contour, Ellipse};
use crate::tracker::{CandidateError, ClassLabel, ObjectCandidate, Rect, Record};

/// Rejects contours too small or too large to be a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourFilter {
    /// Minimum number of contour points
    pub min_points: usize,
    pub min_area: f32,
    pub max_area: f32,
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self {
            min_points: 5,
            min_area: 100.0,
            max_area: 50000.0,
        }
    }
}

impl ContourFilter {
    pub fn accepts(&self, contour: &[geometry::Point]) -> bool {
        if contour.len() < self.min_points {
            return false;
        }
        let area = geometry::contour_area(contour);
        (self.min_area..=self.max_area).contains(&area)
    }
}

/// Builder for creating an `ObjectCandidate` from a contour and its fitted ellipse.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    contour: Contour,
    ellipse: Ellipse,
    bbox: Option<Rect>,
    crop: Array3<u8>,
    mask: Array2<u8>,
    label: ClassLabel,
    confidence: f32,
}

impl CandidateBuilder {
    /// Create a new candidate builder.
    pub fn new(contour: Contour, ellipse: Ellipse) -> Self {
        Self {
            contour,
            ellipse,
            bbox: None,
            crop: Array3::zeros((0, 0, 3)),
            mask: Array2::zeros((0, 0)),
            label: ClassLabel::Unidentified,
            confidence: -1.0,
        }
    }

    /// Set the bounding box. Defaults to the contour's upright bounds.
    pub fn bbox(mut self, bbox: Rect) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the colour crop.
    pub fn crop(mut self, crop: Array3<u8>) -> Self {
        self.crop = crop;
        self
    }

    /// Set the foreground mask crop.
    pub fn mask(mut self, mask: Array2<u8>) -> Self {
        self.mask = mask;
        self
    }

    /// Cut the colour crop and mask out of `frame` at the bounding box.
    pub fn crop_from(mut self, frame: &Frame) -> Self {
        let Some(bbox) = self.resolved_bbox() else {
            return self;
        };
        let (rows, cols) = frame.dim();
        let [x1, y1, x2, y2] = bbox.to_tlbr();
        // Bounds are clipped to the frame; negative and NaN coordinates become 0.
        // A box lying outside the frame yields an empty mask, which `build`
        // rejects as `CandidateError::EmptyMask`.
        let clamp = |v: f32, max: usize| (v.max(0.0) as usize).min(max);
        let (r0, c0) = (clamp(y1.floor(), rows), clamp(x1.floor(), cols));
        let (r1, c1) = (clamp(y2.ceil(), rows).max(r0), clamp(x2.ceil(), cols).max(c0));

        self.mask = frame.foreground.slice(s![r0..r1, c0..c1]).to_owned();
        self.crop = frame.color.slice(s![r0..r1, c0..c1, ..]).to_owned();
        self
    }

    /// Set the class label and confidence.
    pub fn label(mut self, label: ClassLabel, confidence: f32) -> Self {
        self.label = label;
        self.confidence = confidence;
        self
    }

    fn resolved_bbox(&self) -> Option<Rect> {
        self.bbox.or_else(|| Rect::bounding(&self.contour))
    }

    /// Build the final `ObjectCandidate`, rejecting degenerate geometry.
    pub fn build(self) -> Result<ObjectCandidate, CandidateError> {
        let bbox = self.resolved_bbox().ok_or(CandidateError::EmptyContour)?;
        let record = Record::new(self.ellipse, self.contour, bbox, self.crop, self.mask)?;
        Ok(ObjectCandidate::new(record).with_label(self.label, self.confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::geometry::Point;

    fn square(x: f32, y: f32, side: f32) -> Contour {
        vec![
            Point::new(x, y),
            Point::new(x + side / 2.0, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_contour_filter() {
        let filter = ContourFilter::default();
        assert!(filter.accepts(&square(0.0, 0.0, 20.0)));
        assert!(!filter.accepts(&square(0.0, 0.0, 5.0)));
        assert!(!filter.accepts(&square(0.0, 0.0, 300.0)));
        assert!(!filter.accepts(&square(0.0, 0.0, 20.0)[..4]));
    }

    #[test]
    fn test_candidate_builder_crops_frame() {
        let mut foreground = Array2::<u8>::zeros((40, 40));
        foreground.slice_mut(s![10..20, 10..30]).fill(255);
        let frame = Frame::new(foreground, Array3::zeros((40, 40, 3)), Array3::zeros((40, 40, 3)));

        let contour = vec![
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(30.0, 20.0),
            Point::new(10.0, 20.0),
        ];
        let candidate = CandidateBuilder::new(contour, Ellipse::new(Point::new(20.5, 15.5), 20.0, 10.0, 0.0))
            .crop_from(&frame)
            .label(ClassLabel::Class1, 0.9)
            .build()
            .unwrap();

        assert_eq!(candidate.position(), Point::new(20.0, 15.0));
        assert_eq!(candidate.record.bbox, Rect::new(10.0, 10.0, 20.0, 10.0));
        assert_eq!(candidate.record.mask.dim(), (10, 20));
        assert_eq!(candidate.record.crop.dim(), (10, 20, 3));
        assert!((candidate.record.density_ratio - 1.0).abs() < 1e-6);
        assert_eq!(candidate.label, ClassLabel::Class1);
        assert_eq!(candidate.size(), 200.0);
    }

    #[test]
    fn test_crop_outside_frame_is_rejected() {
        let frame = Frame::new(Array2::from_elem((40, 40), 255), Array3::zeros((40, 40, 3)), Array3::zeros((40, 40, 3)));
        let contour = square(60.0, 60.0, 20.0);
        let err = CandidateBuilder::new(contour, Ellipse::new(Point::new(70.0, 70.0), 20.0, 20.0, 0.0))
            .crop_from(&frame)
            .build()
            .unwrap_err();
        assert_eq!(err, CandidateError::EmptyMask);

        let inverted = CandidateBuilder::new(square(0.0, 0.0, 20.0), Ellipse::new(Point::new(10.0, 10.0), 20.0, 20.0, 0.0))
            .bbox(Rect::new(f32::NAN, 30.0, 10.0, -20.0))
            .crop_from(&frame)
            .build()
            .unwrap_err();
        assert_eq!(inverted, CandidateError::EmptyMask);
    }

    #[test]
    fn test_candidate_builder_requires_mask() {
        let contour = square(0.0, 0.0, 20.0);
        let err = CandidateBuilder::new(contour, Ellipse::new(Point::new(10.0, 10.0), 20.0, 20.0, 0.0))
            .build()
            .unwrap_err();
        assert_eq!(err, CandidateError::EmptyMask);
    }
}
