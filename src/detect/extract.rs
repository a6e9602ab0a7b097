//! Reading symbols out of a rectified bit matrix.
//!
//! The rectified matrix has the three finder centres sitting exactly on
//! its top-left, top-right and bottom-left corners, so a quarter of each
//! bullseye is visible. Scanning outward from a corner crosses the black
//! core, the white ring and the black ring, and the length of that
//! sequence is the finder radius at the local scale. Averaging the
//! accepted measurements over three corners and three directions gives
//! the pixels-per-unit factor everything else derives from.
//!
//! Cells are then walked column by column, top to bottom. Inside a cell
//! every pixel row is classified as a solid bar line, a broken bar line
//! (the zero window shows through) or no bar at all, and runs of these
//! classes become the six bits of the symbol, most significant bit first.
use std::f64::consts::SQRT_2;

use arrayvec::ArrayVec;
use log::{debug, trace};

use crate::code::{EncodedIChing, MAX_SIZE};
use crate::error::{IChingError, Result};
use crate::matrix::BitMatrix;
use crate::render::{BITS_PER_SYMBOL, FINDER_RADIUS, GAP_DIM, SYMBOL_DIM, UNIT};

/// Relative tolerance when validating a finder radius slice.
const SLICE_TOLERANCE: f64 = 0.2;

/// Minimum black fraction for a column to count as a symbol border.
const VERTICAL_BORDER_BLACK_THRESHOLD: f64 = 0.25;

/// Minimum black fraction for a line to belong to a bar at all.
const LINE_BLACK_THRESHOLD: f64 = 0.5;

/// Black fraction inside the zero window above which a line is a solid
/// bar.
const ZERO_WINDOW_BLACK_THRESHOLD: f64 = 0.9;

/// A bar line run longer than this fraction of a unit records a bit.
const UNIT_DIM_THRESHOLD: f64 = 0.5;

/// A no-bar run longer than this fraction of the symbol gap is a missing
/// bar or the end of the cell.
const GAP_DIM_THRESHOLD: f64 = 0.5;

/// Classification of one pixel row inside a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LineState {
    /// Not enough black for a bar (a gap line).
    Invalid,
    /// A bar broken by the zero window.
    Zero,
    /// A solid bar.
    One,
}

/// Scaled cell geometry, all in rectified pixels.
struct Dimensions {
    unit: f64,
    symbol_dim: f64,
    gap_dim: f64,
    finder_radius: f64,
}

/// Read the symbol grid out of a rectified matrix.
pub fn extract(matrix: &BitMatrix) -> Result<EncodedIChing> {
    let scale = estimate_scale(matrix)?;
    let dims = Dimensions {
        unit: UNIT as f64 * scale,
        symbol_dim: SYMBOL_DIM as f64 * scale,
        gap_dim: GAP_DIM as f64 * scale,
        finder_radius: FINDER_RADIUS as f64 * scale,
    };

    let width = matrix.width() as f64;
    let height = matrix.height() as f64;
    let step = dims.symbol_dim + dims.gap_dim;
    let cells_x = ((width + dims.gap_dim - dims.symbol_dim) / step).round() as isize;
    let cells_y = ((height + dims.gap_dim - dims.symbol_dim) / step).round() as isize;
    if cells_x != cells_y {
        return Err(IChingError::NotSquare);
    }
    let cells = cells_x.max(0) as usize;
    if cells < 1 || cells * cells > MAX_SIZE {
        debug!("implausible grid of {} cells at scale {}", cells, scale);
        return Err(IChingError::InvalidCode);
    }
    trace!("extracting {0}x{0} cells at scale {1:.3}", cells, scale);

    let mut data = Vec::with_capacity(cells * cells);
    for col in 0..cells {
        for row in 0..cells {
            data.push(read_symbol(matrix, col, row, &dims));
        }
    }
    Ok(EncodedIChing {
        version: data[0],
        size: cells,
        data,
    })
}

/// Pixels per base unit, measured from the three visible finder quarters.
fn estimate_scale(matrix: &BitMatrix) -> Result<f64> {
    let last = matrix.width() as isize - 1;
    let scans: [(isize, isize, isize, isize); 9] = [
        (0, 0, 1, 0),
        (0, 0, 0, 1),
        (0, 0, 1, 1),
        (last, 0, -1, 0),
        (last, 0, 0, 1),
        (last, 0, -1, 1),
        (0, last, 1, 0),
        (0, last, 0, -1),
        (0, last, 1, -1),
    ];
    let mut radii: ArrayVec<f64, 9> = ArrayVec::new();
    for (x, y, dx, dy) in scans {
        if let Some(radius) = measure_radius(matrix, x, y, dx, dy) {
            radii.push(radius);
        }
    }
    if radii.is_empty() {
        debug!("no usable finder radius slice");
        return Err(IChingError::InvalidCode);
    }
    // every walk counts the centre pixel, which does not belong to the
    // radius; half a pixel keeps the estimate from creeping up, and the
    // cell walk tolerates an undershoot far better than an overshoot
    let average = radii.iter().sum::<f64>() / radii.len() as f64 - 0.5;
    Ok(average / FINDER_RADIUS as f64)
}

/// Walk from a finder centre outwards over black core, white ring, black
/// ring; the walked distance is one finder radius.
///
/// The three slices must show the 3:2:2 proportions of the bullseye,
/// within tolerance, otherwise the measurement is discarded.
fn measure_radius(
    matrix: &BitMatrix,
    x0: isize,
    y0: isize,
    dx: isize,
    dy: isize,
) -> Option<f64> {
    let (w, h) = (matrix.width() as isize, matrix.height() as isize);
    let mut runs = [0usize; 3];
    let (mut x, mut y) = (x0, y0);
    for (state, run) in runs.iter_mut().enumerate() {
        let want_black = state != 1;
        while x >= 0
            && y >= 0
            && x < w
            && y < h
            && (matrix.get(x as usize, y as usize) == 1) == want_black
        {
            *run += 1;
            x += dx;
            y += dy;
        }
        if *run == 0 {
            return None;
        }
    }
    let weight = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
    let radius = runs.iter().sum::<usize>() as f64 * weight;
    for (run, share) in runs.iter().zip([3.0, 2.0, 2.0]) {
        let expected = radius * share / 7.0;
        if (*run as f64 * weight - expected).abs() > expected * SLICE_TOLERANCE {
            return None;
        }
    }
    Some(radius)
}

fn read_symbol(matrix: &BitMatrix, col: usize, row: usize, dims: &Dimensions) -> u8 {
    let x_left = dims.finder_radius + col as f64 * (dims.symbol_dim + dims.gap_dim);
    let x_right = x_left + dims.symbol_dim;
    let y_top = dims.finder_radius + row as f64 * (dims.symbol_dim + dims.gap_dim);
    let y_bottom = y_top + dims.symbol_dim;

    let bound = dims.symbol_dim / 2.0;
    let left = refine_border(matrix, x_left, y_top, y_bottom, bound, -1);
    let right = refine_border(matrix, x_right, y_top, y_bottom, bound, 1);
    if left >= right {
        // degenerate cell, nothing readable
        return (1 << BITS_PER_SYMBOL) - 1;
    }

    // the zero window spans 3.5 to 5.5 units from the bar's left edge
    let zero_x0 = left as f64 + 3.5 * dims.unit;
    let zero_x1 = left as f64 + 5.5 * dims.unit;

    let y_start = y_top.max(0.0) as usize;
    let y_end = ((y_bottom + dims.gap_dim) as usize).min(matrix.height() - 1);
    let unit_run = UNIT_DIM_THRESHOLD * dims.unit;
    let gap_run = GAP_DIM_THRESHOLD * dims.gap_dim;

    let mut mask: u8 = (1 << BITS_PER_SYMBOL) - 1;
    let mut bit = 0usize;
    let mut run_state = LineState::Invalid;
    let mut run_len = 0usize;
    // bits already recorded for the current run
    let mut recorded = 0usize;
    for y in y_start..=y_end {
        let state = classify_line(matrix, y, left, right, zero_x0, zero_x1);
        if state == run_state {
            run_len += 1;
        } else {
            run_state = state;
            run_len = 1;
            recorded = 0;
        }
        match run_state {
            LineState::Invalid => {
                // a gap run swallows one bar position per bar-plus-gap
                // length beyond the plain inter-bar gap
                let due = if run_len as f64 > gap_run {
                    1 + ((run_len as f64 - gap_run) / (2.0 * dims.unit)) as usize
                } else {
                    0
                };
                if due > recorded {
                    if y as f64 > y_bottom {
                        break;
                    }
                    // missing bars keep their default one in the mask
                    bit += due - recorded;
                    recorded = due;
                }
            }
            LineState::Zero | LineState::One => {
                if recorded == 0 && run_len as f64 > unit_run {
                    if run_state == LineState::Zero {
                        mask &= !(1 << (BITS_PER_SYMBOL - 1 - bit));
                    }
                    bit += 1;
                    recorded = 1;
                }
            }
        }
        if bit >= BITS_PER_SYMBOL {
            break;
        }
    }
    mask
}

/// Snap an estimated border column onto the edge of the symbol's ink.
///
/// `outward` is -1 for the left border and 1 for the right one. When the
/// estimate already sees enough black the walk pushes outwards to the
/// last column that still does; otherwise it pulls inwards to the first
/// column that does. The walk never strays more than `bound` pixels.
fn refine_border(
    matrix: &BitMatrix,
    estimate: f64,
    y_top: f64,
    y_bottom: f64,
    bound: f64,
    outward: isize,
) -> usize {
    let w = matrix.width() as isize;
    let estimate = (estimate.round() as isize).clamp(0, w - 1);
    let bound = bound as usize;
    let black_enough = |x: isize| {
        column_black_fraction(matrix, x as usize, y_top, y_bottom)
            >= VERTICAL_BORDER_BLACK_THRESHOLD
    };
    let mut x = estimate;
    if black_enough(x) {
        let mut steps = 0;
        while steps < bound && x + outward >= 0 && x + outward < w && black_enough(x + outward) {
            x += outward;
            steps += 1;
        }
    } else {
        let inward = -outward;
        let mut steps = 0;
        while steps < bound && x + inward >= 0 && x + inward < w {
            x += inward;
            steps += 1;
            if black_enough(x) {
                break;
            }
        }
        if !black_enough(x) {
            return estimate as usize;
        }
    }
    x as usize
}

fn column_black_fraction(matrix: &BitMatrix, x: usize, y_top: f64, y_bottom: f64) -> f64 {
    let y0 = y_top.max(0.0) as usize;
    let y1 = (y_bottom as usize).min(matrix.height() - 1);
    if y1 < y0 {
        return 0.0;
    }
    let black = (y0..=y1).filter(|&y| matrix.get(x, y) == 1).count();
    black as f64 / (y1 - y0 + 1) as f64
}

/// Classify one pixel row of a cell.
fn classify_line(
    matrix: &BitMatrix,
    y: usize,
    left: usize,
    right: usize,
    zero_x0: f64,
    zero_x1: f64,
) -> LineState {
    let total = right - left + 1;
    let black = (left..=right).filter(|&x| matrix.get(x, y) == 1).count();
    if (black as f64) < LINE_BLACK_THRESHOLD * total as f64 {
        return LineState::Invalid;
    }
    let zx0 = (zero_x0.round() as usize).clamp(left, right);
    let zx1 = (zero_x1.round() as usize).clamp(left, right);
    let window_total = zx1 - zx0 + 1;
    let window_black = (zx0..=zx1).filter(|&x| matrix.get(x, y) == 1).count();
    if (window_black as f64) < ZERO_WINDOW_BLACK_THRESHOLD * window_total as f64 {
        LineState::Zero
    } else {
        LineState::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodation::{ec_level, encode_content};
    use pretty_assertions::assert_eq;

    /// Draw the rectified view of a code directly: finder quarters on
    /// three corners, the alignment quarter on the fourth, bars in
    /// between.
    fn synthetic_rectified(code: &EncodedIChing, scale: usize) -> BitMatrix {
        let cells = code.size;
        let dim = ((cells * (SYMBOL_DIM + GAP_DIM) - GAP_DIM) + 2 * FINDER_RADIUS) * scale;
        let mut bits = BitMatrix::new(dim, dim);
        let corners = [
            (0.0, 0.0, true),
            (dim as f64, 0.0, true),
            (0.0, dim as f64, true),
            (dim as f64, dim as f64, false),
        ];
        let fd = (FINDER_RADIUS * scale) as f64;
        for y in 0..dim {
            for x in 0..dim {
                for (cx, cy, finder) in corners {
                    let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
                    let black = if finder {
                        d <= fd * 3.0 / 7.0 || (d > fd * 5.0 / 7.0 && d <= fd)
                    } else {
                        d > fd * 3.0 / 7.0 && d <= fd * 5.0 / 7.0
                    };
                    if black {
                        bits.set(x, y, 1);
                    }
                }
            }
        }
        for (i, &value) in code.data.iter().enumerate() {
            let col = i / cells;
            let row = i % cells;
            let x0 = (FINDER_RADIUS + col * (SYMBOL_DIM + GAP_DIM)) * scale;
            let y0 = (FINDER_RADIUS + row * (SYMBOL_DIM + GAP_DIM)) * scale;
            for b in 0..BITS_PER_SYMBOL {
                let bar_y = y0 + 2 * b * UNIT * scale;
                for y in bar_y..bar_y + UNIT * scale {
                    for x in x0..x0 + SYMBOL_DIM * scale {
                        let u = (x - x0) as f64 / scale as f64;
                        let solid = (value >> (BITS_PER_SYMBOL - 1 - b)) & 1 == 1;
                        let in_window = (7.0..11.0).contains(&u);
                        if solid || !in_window {
                            bits.set(x, y, 1);
                        }
                    }
                }
            }
        }
        bits
    }

    #[test]
    fn recovers_the_codeword_grid() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        for scale in [3usize, 7] {
            let rectified = synthetic_rectified(&code, scale);
            let extracted = extract(&rectified).unwrap();
            assert_eq!(extracted.size, 3);
            assert_eq!(extracted.version, 1);
            assert_eq!(extracted.data, code.data);
        }
    }

    #[test]
    fn recovers_a_5x5_grid() {
        let code = encode_content("VALIDPAYLOAD", ec_level::HIGH).unwrap();
        let rectified = synthetic_rectified(&code, 5);
        let extracted = extract(&rectified).unwrap();
        assert_eq!(extracted.size, 5);
        assert_eq!(extracted.data, code.data);
    }

    #[test]
    fn scale_estimate_matches_the_drawing() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        let rectified = synthetic_rectified(&code, 7);
        let scale = estimate_scale(&rectified).unwrap();
        assert!((scale - 7.0).abs() < 0.35, "scale {}", scale);
    }

    #[test]
    fn blank_matrix_has_no_scale() {
        let blank = BitMatrix::new(300, 300);
        assert_eq!(extract(&blank), Err(IChingError::InvalidCode));
    }

    #[test]
    fn erased_bars_default_to_ones() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        let mut rectified = synthetic_rectified(&code, 7);
        // wipe the top two bars of the first cell (version symbol 0b000001,
        // so bits 0 and 1 flip from 0 to the default 1)
        let x0 = FINDER_RADIUS * 7;
        for y in x0..x0 + 3 * UNIT * 7 {
            for x in x0..x0 + SYMBOL_DIM * 7 {
                rectified.set(x, y, 0);
            }
        }
        let extracted = extract(&rectified).unwrap();
        assert_eq!(extracted.data[0], 0b110001);
        assert_eq!(&extracted.data[1..], &code.data[1..]);
    }
}
