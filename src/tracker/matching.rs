//! Gating and candidate-to-track assignment.

use ndarray::Array2;

use crate::tracker::association::TrackerConfig;
use crate::tracker::candidate::{ObjectCandidate, Record};
use crate::tracker::tracked_object::TrackedObject;

/// Cost assigned to track/candidate pairs that fail the gate.
const INFEASIBLE: f64 = 1e6;

/// Gating test between a historical record and a candidate record.
///
/// `depth` is how many frames back `reference` sits in the track history.
/// Distance tolerances grow linearly with `depth + 1`; the size ratio does not.
pub fn passes_gate(reference: &Record, candidate: &Record, depth: usize, config: &TrackerConfig) -> bool {
    let t = (depth + 1) as f32;
    let dx = (reference.position.x - candidate.position.x).abs();
    let dy = (reference.position.y - candidate.position.y).abs();
    dx <= config.max_horizontal_distance * t
        && dy <= config.max_vertical_distance * t
        && size_ratio(reference.size, candidate.size) >= config.min_size_ratio
}

fn size_ratio(a: f32, b: f32) -> f32 {
    a.min(b) / a.max(b)
}

/// Lookback depths available for a track, nearest frame first.
fn depths(track: &TrackedObject, config: &TrackerConfig) -> std::ops::Range<usize> {
    0..config.lookback_limit.min(track.len())
}

/// Smallest lookback depth at which `candidate` passes the gate for `track`.
pub(crate) fn first_passing_depth(
    track: &TrackedObject,
    candidate: &ObjectCandidate,
    config: &TrackerConfig,
) -> Option<usize> {
    depths(track, config).find(|&depth| {
        track
            .lookback(depth)
            .is_some_and(|reference| passes_gate(reference, &candidate.record, depth, config))
    })
}

/// First-match-wins assignment.
///
/// Tracks are visited in creation order; each takes the first still-unclaimed
/// candidate that passes the gate at any depth. Returns, per track, the index
/// of the candidate it took.
pub(crate) fn greedy_assignment(
    tracks: &[TrackedObject],
    candidates: &[ObjectCandidate],
    config: &TrackerConfig,
) -> Vec<Option<usize>> {
    let mut claimed = vec![false; candidates.len()];
    tracks
        .iter()
        .map(|track| {
            let found = candidates.iter().enumerate().position(|(j, candidate)| {
                !claimed[j]
                    && candidate.is_new()
                    && first_passing_depth(track, candidate, config).is_some()
            });
            if let Some(j) = found {
                claimed[j] = true;
            }
            found
        })
        .collect()
}

/// Gate-constrained cost matrix. Cost is the first passing depth plus a
/// normalised distance in `[0, 1]` as a tie-break.
fn gated_cost_matrix(
    tracks: &[TrackedObject],
    candidates: &[ObjectCandidate],
    config: &TrackerConfig,
) -> Array2<f64> {
    let mut costs = Array2::from_elem((tracks.len(), candidates.len()), INFEASIBLE);
    for (i, track) in tracks.iter().enumerate() {
        for (j, candidate) in candidates.iter().enumerate() {
            if !candidate.is_new() {
                continue;
            }
            let Some(depth) = first_passing_depth(track, candidate, config) else {
                continue;
            };
            let Some(reference) = track.lookback(depth) else {
                continue;
            };
            let t = (depth + 1) as f32;
            let dx = normalised(
                (reference.position.x - candidate.record.position.x).abs(),
                config.max_horizontal_distance * t,
            );
            let dy = normalised(
                (reference.position.y - candidate.record.position.y).abs(),
                config.max_vertical_distance * t,
            );
            costs[[i, j]] = depth as f64 + f64::from(dx + dy) / 2.0;
        }
    }
    costs
}

fn normalised(distance: f32, limit: f32) -> f32 {
    if limit > 0.0 { distance / limit } else { 0.0 }
}

/// Minimum-cost assignment over the same gate as [`greedy_assignment`].
pub(crate) fn optimal_assignment(
    tracks: &[TrackedObject],
    candidates: &[ObjectCandidate],
    config: &TrackerConfig,
) -> Vec<Option<usize>> {
    let costs = gated_cost_matrix(tracks, candidates, config);
    let result = linear_assignment(&costs, config.lookback_limit as f64 + 1.0);
    tracing::debug!(
        matched = result.matches.len(),
        unmatched_tracks = result.unmatched_tracks.len(),
        unmatched_candidates = result.unmatched_candidates.len(),
        "optimal assignment solved"
    );

    let mut assignment = vec![None; tracks.len()];
    for (i, j) in result.matches {
        assignment[i] = Some(j);
    }
    assignment
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_candidates: Vec<usize>,
}

pub fn linear_assignment(cost_matrix: &Array2<f64>, thresh: f64) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_candidates: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_candidates: vec![],
        };
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), INFEASIBLE);
    padded
        .slice_mut(ndarray::s![..num_rows, ..num_cols])
        .assign(cost_matrix);

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unclaimed_mask: Vec<bool> = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] <= thresh {
                    matches.push((row_idx, col_idx));
                    unclaimed_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(err) => {
            tracing::warn!(?err, "assignment solver failed; leaving all tracks unmatched");
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_candidates = unclaimed_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| u.then_some(i))
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::geometry::{Ellipse, Point};
    use crate::tracker::rect::Rect;
    use ndarray::Array3;

    /// Candidate whose ellipse axis product equals `size`.
    fn candidate(x: f32, y: f32, size: f32) -> ObjectCandidate {
        let w = size.sqrt();
        let contour = vec![
            Point::new(x - w / 2.0, y - w / 2.0),
            Point::new(x + w / 2.0, y - w / 2.0),
            Point::new(x + w / 2.0, y + w / 2.0),
            Point::new(x - w / 2.0, y + w / 2.0),
        ];
        let record = Record::new(
            Ellipse::new(Point::new(x, y), size / 10.0, 10.0, 0.0),
            contour,
            Rect::new(x - w / 2.0, y - w / 2.0, w, w),
            Array3::zeros((1, 1, 3)),
            Array2::from_elem((2, 2), 1),
        )
        .unwrap();
        ObjectCandidate::new(record)
    }

    #[test]
    fn test_gate_identical_records() {
        let config = TrackerConfig::default();
        let c = candidate(40.0, 40.0, 120.0);
        assert!(passes_gate(&c.record, &c.record, 0, &config));
    }

    #[test]
    fn test_gate_thresholds_scale_with_depth() {
        let config = TrackerConfig::default();
        let reference = candidate(100.0, 100.0, 50.0);
        let far = candidate(105.0, 100.0, 50.0);

        assert!(!passes_gate(&reference.record, &far.record, 0, &config));
        assert!(!passes_gate(&reference.record, &far.record, 1, &config));
        assert!(passes_gate(&reference.record, &far.record, 2, &config));
    }

    #[test]
    fn test_gate_size_ratio() {
        let config = TrackerConfig::default();
        let reference = candidate(10.0, 10.0, 100.0);
        assert!(passes_gate(&reference.record, &candidate(10.0, 10.0, 60.0).record, 0, &config));
        assert!(!passes_gate(&reference.record, &candidate(10.0, 10.0, 59.0).record, 5, &config));
    }

    #[test]
    fn test_loosening_thresholds_keeps_match() {
        let strict = TrackerConfig::default();
        let loose = TrackerConfig {
            max_horizontal_distance: 4.0,
            max_vertical_distance: 12.0,
            min_size_ratio: 0.4,
            ..strict.clone()
        };
        let reference = candidate(100.0, 100.0, 50.0);
        for (x, y, size) in [(101.0, 106.0, 48.0), (103.0, 90.0, 35.0), (100.0, 116.0, 31.0)] {
            let c = candidate(x, y, size);
            for depth in 0..6 {
                if passes_gate(&reference.record, &c.record, depth, &strict) {
                    assert!(passes_gate(&reference.record, &c.record, depth, &loose));
                }
            }
        }
    }

    #[test]
    fn test_greedy_first_match_wins() {
        let config = TrackerConfig::default();
        let tracks = vec![
            TrackedObject::from_candidate(candidate(100.0, 100.0, 50.0)),
            TrackedObject::from_candidate(candidate(101.0, 101.0, 50.0)),
        ];
        // The first candidate suits both tracks; the first track claims it.
        let candidates = vec![candidate(101.0, 101.0, 50.0), candidate(100.0, 107.0, 50.0)];
        let assignment = greedy_assignment(&tracks, &candidates, &config);
        assert_eq!(assignment, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_greedy_leaves_track_unmatched() {
        let config = TrackerConfig::default();
        let tracks = vec![
            TrackedObject::from_candidate(candidate(100.0, 100.0, 50.0)),
            TrackedObject::from_candidate(candidate(100.0, 102.0, 50.0)),
        ];
        let candidates = vec![candidate(100.0, 101.0, 50.0)];
        let assignment = greedy_assignment(&tracks, &candidates, &config);
        assert_eq!(assignment, vec![Some(0), None]);
    }

    #[test]
    fn test_optimal_prefers_closer_pairs() {
        let config = TrackerConfig::default();
        let tracks = vec![
            TrackedObject::from_candidate(candidate(100.0, 100.0, 50.0)),
            TrackedObject::from_candidate(candidate(100.0, 110.0, 50.0)),
        ];
        // Greedy gives track 0 the candidate at y=107 (it comes first), which
        // leaves track 1 without a gate-compatible candidate.
        let candidates = vec![candidate(100.0, 107.0, 50.0), candidate(100.0, 101.0, 50.0)];
        assert_eq!(greedy_assignment(&tracks, &candidates, &config), vec![Some(0), None]);
        assert_eq!(
            optimal_assignment(&tracks, &candidates, &config),
            vec![Some(1), Some(0)]
        );
    }

    #[test]
    fn test_linear_assignment_threshold() {
        let costs = ndarray::array![[0.2, INFEASIBLE], [INFEASIBLE, INFEASIBLE]];
        let result = linear_assignment(&costs, 7.0);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_candidates, vec![1]);
    }
}
