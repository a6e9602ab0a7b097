//! Finder and alignment pattern location.
//!
//! Both pattern shapes are rings, so their cross-sections are runs of
//! black and white in fixed ratios: 1:1:3:1:1 through a finder bullseye
//! and 1:3:1 through the alignment ring. One locator handles both, generic
//! over the ratio list. It sweeps every other row with a sliding window of
//! run lengths, validates the ratios whenever the window is full, confirms
//! candidates with a vertical scan through the proposed centre, recentres
//! them, and scores them by how far the runs in four directions deviate
//! from the ideal ratios.
use std::f64::consts::SQRT_2;

use arrayvec::ArrayVec;
use log::debug;

use crate::error::{IChingError, Result};
use crate::geometry::{cross, Point};
use crate::matrix::BitMatrix;

/// Run ratios across a finder bullseye.
const FINDER_RATIOS: [usize; 5] = [1, 1, 3, 1, 1];

/// Run ratios across the alignment ring.
const ALIGNMENT_RATIOS: [usize; 3] = [1, 3, 1];

/// Candidates closer together than this are the same pattern (pixels).
const MIN_PATTERN_DIST: f64 = 50.0;

/// A confirmed ring candidate.
#[derive(Clone, Copy, Debug)]
struct Pattern {
    center: Point,
    /// Average extent across the pattern, in pixels.
    size: f64,
    /// Mean squared deviation of the measured runs from the ideal ratios.
    error: f64,
}

/// The four pattern centres of a located code.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PatternsLocation {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
    /// Average extent of the three finder patterns, in pixels.
    pub finder_average_size: f64,
    /// Extent of the alignment ring, in pixels.
    pub alignment_size: f64,
}

struct PatternLocator<'a, const N: usize> {
    matrix: &'a BitMatrix,
    ratios: [usize; N],
    ratio_sum: usize,
    patterns: Vec<Pattern>,
}

impl<'a, const N: usize> PatternLocator<'a, N> {
    fn new(matrix: &'a BitMatrix, ratios: [usize; N]) -> Self {
        PatternLocator {
            matrix,
            ratios,
            ratio_sum: ratios.iter().sum(),
            patterns: Vec::new(),
        }
    }

    /// Sweep every other row of the given window and collect candidates.
    fn locate(mut self, x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<Pattern> {
        for y in (y0..y1).step_by(2) {
            self.scan_row(y, x0, x1);
        }
        self.patterns
    }

    fn black(&self, x: isize, y: isize) -> bool {
        self.matrix.get(x as usize, y as usize) == 1
    }

    fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && x < self.matrix.width() as isize && y < self.matrix.height() as isize
    }

    fn scan_row(&mut self, y: usize, x0: usize, x1: usize) {
        let mut runs = [0usize; N];
        let mut state = 0usize; // index into runs, even states are black
        for x in x0..x1 {
            if self.black(x as isize, y as isize) {
                if state % 2 == 1 {
                    state += 1;
                }
                runs[state] += 1;
            } else if state % 2 == 1 {
                runs[state] += 1;
            } else if state == N - 1 {
                // window complete at a black-to-white edge
                if self.check_ratios(&to_f64(&runs)) {
                    self.handle_candidate(x, y, &runs);
                }
                // recycle the window tail into the next window's head
                runs.copy_within(2.., 0);
                runs[N - 2] = 1;
                runs[N - 1] = 0;
                state = N - 2;
            } else if state > 0 || runs[0] > 0 {
                state += 1;
                runs[state] += 1;
            }
            // leading white before the first black run is skipped
        }
        if state == N - 1 && self.check_ratios(&to_f64(&runs)) {
            self.handle_candidate(x1, y, &runs);
        }
    }

    /// Each run must sit within half a unit (scaled by its ratio) of its
    /// expected length.
    fn check_ratios(&self, runs: &[f64; N]) -> bool {
        let total: f64 = runs.iter().sum();
        if total < self.ratio_sum as f64 {
            return false;
        }
        let unit = total / self.ratio_sum as f64;
        let max_variance = unit / 2.0;
        self.ratios
            .iter()
            .zip(runs)
            .all(|(&ratio, &run)| (run - ratio as f64 * unit).abs() <= ratio as f64 * max_variance)
    }

    fn handle_candidate(&mut self, x_end: usize, y: usize, runs: &[usize; N]) {
        let mid = N / 2;
        let trailing: usize = runs[mid + 1..].iter().sum();
        let cx = x_end as f64 - trailing as f64 - runs[mid] as f64 / 2.0;
        let cy = y as f64;
        if !self.cross_check_vertical(cx, cy) {
            return;
        }
        let (cx, cy) = self.refine_center(cx, cy);
        if let Some((size, error)) = self.measure(cx, cy) {
            self.patterns.push(Pattern {
                center: Point::new(cx, cy),
                size,
                error,
            });
        }
    }

    /// Validate the ratios along the vertical line through the candidate.
    fn cross_check_vertical(&self, cx: f64, cy: f64) -> bool {
        let down = self.half_states(cx, cy, 0, 1);
        let up = self.half_states(cx, cy, 0, -1);
        match (up, down) {
            (Some(up), Some(down)) => self.check_ratios(&merge_halves(&up, &down, 1.0)),
            _ => false,
        }
    }

    /// Walk from the centre outwards collecting the `mid + 1` run lengths
    /// in that direction, ordered middle first.
    ///
    /// Returns `None` when a run other than the middle one comes up empty,
    /// which happens when the walk leaves the matrix mid-pattern.
    fn half_states(&self, cx: f64, cy: f64, dx: isize, dy: isize) -> Option<ArrayVec<usize, N>> {
        let mid = N / 2;
        let mut x = cx.round() as isize;
        let mut y = cy.round() as isize;
        let mut states: ArrayVec<usize, N> = ArrayVec::new();
        for out in 0..=mid {
            let state = mid - out;
            let want_black = state % 2 == 0;
            let mut count = 0usize;
            while self.in_bounds(x, y) && self.black(x, y) == want_black {
                count += 1;
                x += dx;
                y += dy;
            }
            if count == 0 {
                return None;
            }
            states.push(count);
        }
        Some(states)
    }

    /// Shift the centre by half the difference of the outward half-runs.
    fn refine_center(&self, cx: f64, cy: f64) -> (f64, f64) {
        let sum = |states: Option<ArrayVec<usize, N>>| {
            states.map(|s| s.iter().sum::<usize>() as f64)
        };
        let left = sum(self.half_states(cx, cy, -1, 0));
        let right = sum(self.half_states(cx, cy, 1, 0));
        let up = sum(self.half_states(cx, cy, 0, -1));
        let down = sum(self.half_states(cx, cy, 0, 1));
        let cx = match (left, right) {
            (Some(l), Some(r)) => cx + (r - l) / 2.0,
            _ => cx,
        };
        let cy = match (up, down) {
            (Some(u), Some(d)) => cy + (d - u) / 2.0,
            _ => cy,
        };
        (cx, cy)
    }

    /// Average size over four directions and the mean squared ratio error
    /// over all their runs. Diagonal steps count sqrt(2) pixels.
    fn measure(&self, cx: f64, cy: f64) -> Option<(f64, f64)> {
        let directions: [(isize, isize, f64); 4] = [
            (1, 0, 1.0),
            (0, 1, 1.0),
            (1, 1, SQRT_2),
            (1, -1, SQRT_2),
        ];
        let mut total_size = 0.0;
        let mut squared_error = 0.0;
        for (dx, dy, weight) in directions {
            let pos = self.half_states(cx, cy, dx, dy)?;
            let neg = self.half_states(cx, cy, -dx, -dy)?;
            let full = merge_halves(&neg, &pos, weight);
            let size: f64 = full.iter().sum();
            total_size += size;
            let unit = size / self.ratio_sum as f64;
            for (&ratio, &run) in self.ratios.iter().zip(&full) {
                let factor = run / (unit * ratio as f64) - 1.0;
                squared_error += factor * factor;
            }
        }
        Some((total_size / 4.0, squared_error / (4 * N) as f64))
    }
}

fn to_f64<const N: usize>(runs: &[usize; N]) -> [f64; N] {
    let mut out = [0.0; N];
    for (o, r) in out.iter_mut().zip(runs) {
        *o = *r as f64;
    }
    out
}

/// Merge two centre-outward half windows into a full MSB-first run array.
///
/// The centre pixel is part of both halves, so the middle run subtracts
/// one.
fn merge_halves<const N: usize>(
    neg: &ArrayVec<usize, N>,
    pos: &ArrayVec<usize, N>,
    weight: f64,
) -> [f64; N] {
    let mid = N / 2;
    let mut full = [0.0; N];
    for i in 0..mid {
        full[i] = neg[mid - i] as f64 * weight;
    }
    full[mid] = (neg[0] + pos[0] - 1) as f64 * weight;
    for i in mid + 1..N {
        full[i] = pos[i - mid] as f64 * weight;
    }
    full
}

/// Pick the `n` lowest-error candidates that are pairwise distinct.
fn pick_distinct(sorted: &[Pattern], n: usize) -> Option<Vec<Pattern>> {
    let mut picked: Vec<Pattern> = Vec::new();
    for candidate in sorted {
        if picked
            .iter()
            .all(|p| p.center.distance(&candidate.center) >= MIN_PATTERN_DIST)
        {
            picked.push(*candidate);
            if picked.len() == n {
                return Some(picked);
            }
        }
    }
    None
}

/// Assign three finder centres to corners.
///
/// The two most distant centres span the diagonal (top-right and
/// bottom-left), the remaining one is the top-left. The diagonal pair is
/// ordered so that top-left, top-right, bottom-left turn clockwise on
/// screen.
fn assign_corners(patterns: &[Pattern]) -> (Point, Point, Point) {
    let (a, b, c) = (
        patterns[0].center,
        patterns[1].center,
        patterns[2].center,
    );
    let d_ab = a.distance(&b);
    let d_ac = a.distance(&c);
    let d_bc = b.distance(&c);
    let (top_left, mut top_right, mut bottom_left) = if d_ab >= d_ac && d_ab >= d_bc {
        (c, a, b)
    } else if d_ac >= d_ab && d_ac >= d_bc {
        (b, a, c)
    } else {
        (a, b, c)
    };
    if cross(&top_left, &top_right, &bottom_left) < 0.0 {
        std::mem::swap(&mut top_right, &mut bottom_left);
    }
    (top_left, top_right, bottom_left)
}

/// Locate the three finder patterns and the alignment ring.
pub fn locate_patterns(matrix: &BitMatrix) -> Result<PatternsLocation> {
    let mut candidates = PatternLocator::new(matrix, FINDER_RATIOS).locate(
        0,
        0,
        matrix.width(),
        matrix.height(),
    );
    debug!("{} finder candidates", candidates.len());
    candidates.sort_by(|a, b| a.error.total_cmp(&b.error));

    let first_pass =
        pick_distinct(&candidates, 3).ok_or(IChingError::FinderPatternsNotFound)?;

    // Second pass: drop candidates whose size disagrees wildly with the
    // first estimate, then pick again.
    let estimated_size = first_pass
        .iter()
        .map(|p| p.size)
        .fold(f64::MIN, f64::max);
    let filtered: Vec<Pattern> = candidates
        .iter()
        .filter(|c| c.size < 5.0 * estimated_size && 4.0 * c.size > estimated_size)
        .cloned()
        .collect();
    let finders = pick_distinct(&filtered, 3).ok_or(IChingError::NoValidFinderPatterns)?;

    let (top_left, top_right, bottom_left) = assign_corners(&finders);
    let finder_average_size = finders.iter().map(|p| p.size).sum::<f64>() / 3.0;

    let (bottom_right, alignment_size) = locate_alignment(
        matrix,
        top_left,
        top_right,
        bottom_left,
        finder_average_size,
    );

    Ok(PatternsLocation {
        top_left,
        top_right,
        bottom_left,
        bottom_right,
        finder_average_size,
        alignment_size,
    })
}

/// Search the estimated fourth corner for the alignment ring.
///
/// Falls back to the parallelogram estimate when no acceptable candidate
/// shows up, which keeps decoding alive on captures where the small ring
/// drowned in noise.
fn locate_alignment(
    matrix: &BitMatrix,
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    finder_average_size: f64,
) -> (Point, f64) {
    let estimate = Point::new(
        top_right.x - top_left.x + bottom_left.x,
        top_right.y - top_left.y + bottom_left.y,
    );
    let expected_size = finder_average_size * 5.0 / 7.0;
    let radius = (top_left.distance(&top_right) + top_left.distance(&bottom_left)) / 4.0;

    let x0 = (estimate.x - radius).max(0.0) as usize;
    let y0 = (estimate.y - radius).max(0.0) as usize;
    let x1 = ((estimate.x + radius) as usize).min(matrix.width());
    let y1 = ((estimate.y + radius) as usize).min(matrix.height());
    if x0 >= x1 || y0 >= y1 {
        debug!("alignment window outside the image, keeping the estimate");
        return (estimate, expected_size);
    }

    let mut candidates =
        PatternLocator::new(matrix, ALIGNMENT_RATIOS).locate(x0, y0, x1, y1);
    candidates.sort_by(|a, b| a.error.total_cmp(&b.error));
    let accepted = candidates
        .iter()
        .find(|c| c.size >= expected_size / 4.0 && c.size <= 5.0 * expected_size);
    match accepted {
        Some(p) => (p.center, p.size),
        None => {
            debug!("no alignment candidate accepted, keeping the estimate");
            (estimate, expected_size)
        }
    }
}
