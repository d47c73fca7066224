use thiserror::Error;

use crate::tracker::geometry::{self, Point};
use crate::tracker::{Direction, ObjectCandidate, TrackedObject};

/// Half-height, in pixels, of the counting band beside the zone midline.
pub const COUNTING_BAND_PX: f32 = 30.0;

/// Index of the mid-left vertex in the canonical six-vertex region.
const MID_LEFT: usize = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    #[error("zone region needs 4 or at least 6 vertices, got {0}")]
    VertexCount(usize),
}

/// Polygonal region with an expected travel direction.
///
/// Regions are stored in the six-vertex layout
///
/// ```text
/// 0 ------------- 1
/// |               |
/// 5               2
/// |               |
/// 4 ------------- 3
/// ```
///
/// where vertex 5 marks the counting midline.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationZone {
    pub index: usize,
    pub direction: Direction,
    region: Vec<Point>,
}

impl ObservationZone {
    /// Build a zone. A four-vertex region (top-left, top-right, bottom-right,
    /// bottom-left) is expanded with the midpoints of its left and right edges.
    pub fn new(index: usize, direction: Direction, vertices: Vec<Point>) -> Result<Self, ZoneError> {
        let region = match vertices.len() {
            4 => {
                let midpoint = |a: &Point, b: &Point| {
                    Point::new(((a.x + b.x) / 2.0).trunc(), ((a.y + b.y) / 2.0).trunc())
                };
                let [tl, tr, br, bl] = [vertices[0], vertices[1], vertices[2], vertices[3]];
                vec![tl, tr, midpoint(&tr, &br), br, bl, midpoint(&tl, &bl)]
            }
            n if n > MID_LEFT => vertices,
            n => return Err(ZoneError::VertexCount(n)),
        };
        Ok(Self {
            index,
            direction,
            region,
        })
    }

    pub fn region(&self) -> &[Point] {
        &self.region
    }

    /// y of the counting midline.
    pub fn mid_left_y(&self) -> f32 {
        self.region[MID_LEFT].y
    }

    /// Whether the point lies inside the region, boundary included.
    pub fn contains(&self, point: &Point) -> bool {
        geometry::point_in_polygon(&self.region, point)
    }

    /// Wrong-way flag: an object moving in the zone's configured direction is
    /// reported as violating.
    // NOTE: reads inverted; kept as deployed pending product clarification.
    pub fn is_violated(&self, object: &TrackedObject) -> bool {
        object.direction() == self.direction
    }

    /// Whether the object's latest ellipse centre sits in the counting band
    /// just past the midline in the zone's direction.
    pub fn is_countable(&self, object: &TrackedObject) -> bool {
        self.in_counting_band(object.latest().ellipse.center.y)
    }

    fn in_counting_band(&self, y: f32) -> bool {
        let mid = self.mid_left_y();
        match self.direction {
            Direction::Downstream => y > mid && y < mid + COUNTING_BAND_PX,
            Direction::Upstream => y > mid - COUNTING_BAND_PX && y < mid,
        }
    }
}

/// Index of the first zone, in index order, containing the candidate's position.
pub fn assign_zone(candidate: &ObjectCandidate, zones: &[ObservationZone]) -> Option<usize> {
    let position = candidate.position();
    zones
        .iter()
        .find(|zone| zone.contains(&position))
        .map(|zone| zone.index)
}
