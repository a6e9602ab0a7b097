//! Visual detection: from a captured RGBA image to a raw code matrix.
//!
//! The stages hand owned buffers down the chain: binarize the photograph,
//! locate the three finder bullseyes and the alignment ring, rectify the
//! quadrilateral they span into a canonical square, and read the symbol
//! grid out of it.
use log::debug;

pub mod binarize;
pub mod extract;
pub mod locate;
pub mod perspective;

use crate::code::EncodedIChing;
use crate::error::{IChingError, Result};
use crate::geometry::Point;
use crate::matrix::BitMatrix;
use locate::PatternsLocation;
use perspective::PerspectiveTransform;

/// Run the full detection chain on a captured image.
pub fn detect(
    rgba: &[u8],
    width: usize,
    height: usize,
    inverted: bool,
) -> Result<(EncodedIChing, PatternsLocation)> {
    let bits = binarize::binarize(rgba, width, height, inverted)?;
    let patterns = locate::locate_patterns(&bits)?;
    debug!(
        "patterns at ({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1})",
        patterns.top_left.x,
        patterns.top_left.y,
        patterns.top_right.x,
        patterns.top_right.y,
        patterns.bottom_left.x,
        patterns.bottom_left.y,
        patterns.bottom_right.x,
        patterns.bottom_right.y,
    );

    let dim = ((patterns.top_left.distance(&patterns.top_right)
        + patterns.top_left.distance(&patterns.bottom_left))
        / 2.0)
        .round() as usize;
    if dim == 0 {
        return Err(IChingError::InvalidCode);
    }

    let rectified = rectify(&bits, &patterns, dim);
    let code = extract::extract(&rectified)?;
    Ok((code, patterns))
}

/// Map the located quadrilateral into a `dim` x `dim` canonical view.
///
/// The transform goes from rectified coordinates back into the source
/// image; every destination pixel is filled with its nearest-neighbour
/// sample. Corner order on both quads is top-right, top-left, bottom-left,
/// bottom-right.
fn rectify(bits: &BitMatrix, patterns: &PatternsLocation, dim: usize) -> BitMatrix {
    let side = dim as f64;
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(
        [
            Point::new(side, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, side),
            Point::new(side, side),
        ],
        [
            patterns.top_right,
            patterns.top_left,
            patterns.bottom_left,
            patterns.bottom_right,
        ],
    );
    let mut rectified = BitMatrix::new(dim, dim);
    for y in 0..dim {
        for x in 0..dim {
            let src = transform.apply(Point::new(x as f64, y as f64));
            let sx = src.x.round();
            let sy = src.y.round();
            if sx >= 0.0
                && sy >= 0.0
                && (sx as usize) < bits.width()
                && (sy as usize) < bits.height()
                && bits.get(sx as usize, sy as usize) == 1
            {
                rectified.set(x, y, 1);
            }
        }
    }
    rectified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodation::{ec_level, encode_content};
    use crate::render::render;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_a_rendered_code_verbatim() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        let image = render(&code, 1250, false, false).unwrap();
        let (detected, patterns) = detect(&image.data, image.width, image.height, false).unwrap();
        assert_eq!(detected.size, 3);
        assert_eq!(detected.data, code.data);
        assert!((patterns.finder_average_size - 154.0).abs() < 10.0);
    }

    #[test]
    fn detects_at_an_uneven_resolution() {
        // resolution 1000 over base 222 leaves scale 4 plus heavy padding
        let code = encode_content("UNEVEN SCALE", ec_level::MEDIUM).unwrap();
        assert_eq!(code.size, 5);
        let image = render(&code, 1000, false, false).unwrap();
        let (detected, _) = detect(&image.data, image.width, image.height, false).unwrap();
        assert_eq!(detected.data, code.data);
    }

    #[test]
    fn detects_rounded_rendering() {
        let code = encode_content("ROUND", ec_level::LOW).unwrap();
        let image = render(&code, 1250, true, false).unwrap();
        let (detected, _) = detect(&image.data, image.width, image.height, false).unwrap();
        assert_eq!(detected.data, code.data);
    }

    #[test]
    fn blank_capture_has_no_patterns() {
        let blank = vec![255u8; 4 * 400 * 400];
        assert_eq!(
            detect(&blank, 400, 400, false).unwrap_err(),
            IChingError::FinderPatternsNotFound
        );
    }
}
