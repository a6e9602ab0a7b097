//! Adaptive binarization of captured photographs.
//!
//! The threshold for a pixel is the mean of the 80x80 block around it,
//! computed for every block position with a sliding box filter: one pass
//! keeps per-row window sums and slides them down a column at a time, so
//! the whole table costs O(width * height) instead of a naive
//! O(width * height * block^2).
//!
//! Flat regions defeat a mean threshold (the mean sits on top of the
//! signal), so when a pixel sits closer than a variance floor to its
//! threshold the decision falls back to the neighbourhood: the average of
//! the three already-binarized neighbours above and to the left, or half
//! the luma at the image border. That turns featureless areas white
//! instead of speckling them.
use log::trace;

use crate::error::{IChingError, Result};
use crate::matrix::{BitMatrix, Matrix};

/// Side length of the averaging block.
pub const BLOCK_SIZE: usize = 80;

/// Subtracted from every block mean, biases ties towards white.
const MEAN_OFFSET: i32 = 2;

/// Minimum distance between luma and threshold for a direct decision.
const MIN_VARIANCE: i32 = 20;

/// Binarize an RGBA capture into a 0/1 matrix (1 is black).
///
/// With `inverted` set the colour channels are flipped before the luma
/// conversion, for codes rendered white-on-black.
pub fn binarize(rgba: &[u8], width: usize, height: usize, inverted: bool) -> Result<BitMatrix> {
    if width < BLOCK_SIZE || height < BLOCK_SIZE || rgba.len() != 4 * width * height {
        return Err(IChingError::InvalidImageSize);
    }
    let luma = to_luma(rgba, width, height, inverted);
    let thresholds = threshold_table(&luma);
    trace!(
        "binarizing {}x{} with a {}x{} threshold table",
        width,
        height,
        thresholds.width(),
        thresholds.height()
    );

    let mut bits = BitMatrix::new(width, height);
    let mut applied = Matrix::<i32>::new(width, height);
    let half = BLOCK_SIZE / 2;
    for y in 0..height {
        for x in 0..width {
            let bx = (x + half).clamp(BLOCK_SIZE - 1, width - 1) - (BLOCK_SIZE - 1);
            let by = (y + half).clamp(BLOCK_SIZE - 1, height - 1) - (BLOCK_SIZE - 1);
            let mut threshold = thresholds.get(bx, by);
            let l = luma.get(x, y) as i32;
            if (threshold - l).abs() < MIN_VARIANCE {
                threshold = if x > 0 && y > 0 {
                    (applied.get(x - 1, y) + applied.get(x, y - 1) + applied.get(x - 1, y - 1)) / 3
                } else {
                    l / 2 - MEAN_OFFSET
                };
            }
            applied.set(x, y, threshold);
            bits.set(x, y, (l < threshold) as u8);
        }
    }
    Ok(bits)
}

/// BT.709 luma conversion.
fn to_luma(rgba: &[u8], width: usize, height: usize, inverted: bool) -> Matrix<u8> {
    let mut luma = Matrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) * 4;
            let (mut r, mut g, mut b) = (rgba[i] as f32, rgba[i + 1] as f32, rgba[i + 2] as f32);
            if inverted {
                r = 255.0 - r;
                g = 255.0 - g;
                b = 255.0 - b;
            }
            luma.set(x, y, (0.2126 * r + 0.7152 * g + 0.0722 * b) as u8);
        }
    }
    luma
}

/// Block means for every block position, already offset by `MEAN_OFFSET`.
///
/// Entry (x, y) is the mean over the block whose top-left corner is
/// (x, y).
fn threshold_table(luma: &Matrix<u8>) -> Matrix<i32> {
    let (width, height) = (luma.width(), luma.height());
    let table_w = width - BLOCK_SIZE + 1;
    let table_h = height - BLOCK_SIZE + 1;
    let area = (BLOCK_SIZE * BLOCK_SIZE) as u32;
    let mut table = Matrix::<i32>::new(table_w, table_h);

    let mut row_sums: Vec<u32> = (0..height)
        .map(|y| (0..BLOCK_SIZE).map(|x| luma.get(x, y) as u32).sum())
        .collect();

    for x in 0..table_w {
        if x > 0 {
            for (y, sum) in row_sums.iter_mut().enumerate() {
                *sum += luma.get(x + BLOCK_SIZE - 1, y) as u32;
                *sum -= luma.get(x - 1, y) as u32;
            }
        }
        let mut col_sum: u32 = row_sums[..BLOCK_SIZE].iter().sum();
        table.set(x, 0, (col_sum / area) as i32 - MEAN_OFFSET);
        for y in 1..table_h {
            col_sum += row_sums[y + BLOCK_SIZE - 1];
            col_sum -= row_sums[y - 1];
            table.set(x, y, (col_sum / area) as i32 - MEAN_OFFSET);
        }
    }
    table
}
