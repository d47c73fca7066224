//! Planar geometry over blob contours and zone polygons.
//!
//! Points use `nalgebra::Point2<f32>` in pixel coordinates with y growing
//! downwards, matching image space.

use nalgebra::{Point2, Vector2};

pub type Point = Point2<f32>;

/// Closed outline of a foreground blob, as produced by contour extraction.
pub type Contour = Vec<Point>;

/// Ellipse fitted to a contour. `width` and `height` are full axis lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees.
    pub angle: f32,
}

impl Ellipse {
    pub fn new(center: Point, width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            width,
            height,
            angle,
        }
    }

    /// Product of the axis lengths, used as the blob size measure.
    #[inline]
    pub fn axis_product(&self) -> f32 {
        self.width * self.height
    }

    /// True ellipse area.
    #[inline]
    pub fn area(&self) -> f32 {
        self.axis_product() * std::f32::consts::PI / 4.0
    }
}

/// Minimum-area bounding rectangle of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    /// Rotation of the `width` edge in radians.
    pub angle: f32,
}

impl RotatedRect {
    /// Minor edge over major edge, in `[0, 1]`. Zero for a degenerate rectangle.
    pub fn dimension_ratio(&self) -> f32 {
        let minor = self.width.min(self.height);
        let major = self.width.max(self.height);
        if major > 0.0 { minor / major } else { 0.0 }
    }
}

/// Absolute polygon area (shoelace formula).
pub fn contour_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

/// Length of the closed outline.
pub fn perimeter(points: &[Point]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| nalgebra::distance(a, b))
        .sum()
}

fn cross(o: &Point, a: &Point, b: &Point) -> f32 {
    (a - o).perp(&(b - o))
}

/// Convex hull in counter-clockwise order (monotone chain), collinear points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(sorted.len() * 2);
    for p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Minimum-area enclosing rectangle, searched over the hull edge directions.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle: 0.0,
            });
        }
        _ => {}
    }

    let mut best: Option<(f32, RotatedRect)> = None;
    for (i, a) in hull.iter().enumerate() {
        let b = &hull[(i + 1) % hull.len()];
        let edge: Vector2<f32> = b - a;
        let len = edge.norm();
        if len == 0.0 {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut min_u, mut max_u, mut min_v, mut max_v) =
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN);
        for p in &hull {
            let d = p - a;
            let pu = d.dot(&u);
            let pv = d.dot(&v);
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let center = a + u * ((min_u + max_u) / 2.0) + v * ((min_v + max_v) / 2.0);
            best = Some((
                area,
                RotatedRect {
                    center,
                    width,
                    height,
                    angle: u.y.atan2(u.x),
                },
            ));
        }
    }
    best.map(|(_, rect)| rect)
}

fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    const EPS: f32 = 1e-4;
    cross(a, b, p).abs() <= EPS * nalgebra::distance(a, b).max(1.0)
        && p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}

/// Whether `point` lies inside `polygon` or on its boundary.
pub fn point_in_polygon(polygon: &[Point], point: &Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        if on_segment(a, b, point) {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}
