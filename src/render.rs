//! Rendering of code matrices into raster images.
//!
//! All drawing happens on a bit matrix first and is converted to RGBA at
//! the end. Geometry is fixed in unscaled base units and blown up by an
//! integer factor chosen from the requested resolution: a symbol is a
//! stack of six horizontal bars (most significant bit on top), a one bit
//! is a solid bar and a zero bit is a bar broken by a white window, three
//! finder bullseyes mark the top-left, top-right and bottom-left corners
//! and a single ring marks the bottom-right.
use crate::code::{EncodedIChing, ImageData};
use crate::error::{IChingError, Result};
use crate::matrix::BitMatrix;

/// Bits encoded by one symbol glyph.
pub const BITS_PER_SYMBOL: usize = 6;

/// Height of one bar (and of the gap between bars) in base units.
pub const UNIT: usize = 2;

/// Side length of one symbol glyph in base units.
pub const SYMBOL_DIM: usize = (2 * BITS_PER_SYMBOL - 1) * UNIT;

/// Gap between neighbouring glyphs in base units.
pub const GAP_DIM: usize = 3 * UNIT;

/// Outer radius of a finder pattern in base units.
pub const FINDER_RADIUS: usize = SYMBOL_DIM / 2;

/// Blank border around the code in base units.
pub const QUIET_ZONE: usize = SYMBOL_DIM;

/// Distance of the zero-window centre from a bar's left edge, base units.
const ZERO_CLEAR_CENTER: usize = 9;

/// Width of the zero window in base units.
const ZERO_CLEAR_WIDTH: usize = 2 * UNIT;

/// Image side length for a code of side `size`, in base units.
pub fn base_dimension(size: usize) -> usize {
    size * SYMBOL_DIM + (size - 1) * GAP_DIM + 2 * (2 * FINDER_RADIUS + QUIET_ZONE)
}

/// Render `code` as a square RGBA image of the given resolution.
///
/// The base drawing is scaled by the largest integer factor that fits the
/// resolution and centred with equal padding. `round_edges` rounds the bar
/// caps and `inverted` swaps black and white; neither changes which bits
/// the glyphs carry.
pub fn render(
    code: &EncodedIChing,
    resolution: usize,
    round_edges: bool,
    inverted: bool,
) -> Result<ImageData> {
    let base = base_dimension(code.size);
    let scale = resolution / base;
    if scale < 1 {
        return Err(IChingError::ResolutionTooSmall);
    }
    let pad = (resolution - base * scale) / 2;

    let mut bits = BitMatrix::new(resolution, resolution);

    let near = pad + (QUIET_ZONE + FINDER_RADIUS) * scale;
    let far = pad + (base - QUIET_ZONE - FINDER_RADIUS) * scale;
    draw_finder(&mut bits, near, near, scale);
    draw_finder(&mut bits, far, near, scale);
    draw_finder(&mut bits, near, far, scale);
    draw_alignment(&mut bits, far, far, scale);

    let origin = pad + (2 * FINDER_RADIUS + QUIET_ZONE) * scale;
    let step = (SYMBOL_DIM + GAP_DIM) * scale;
    for (i, &value) in code.data.iter().enumerate() {
        let col = i / code.size;
        let row = i % code.size;
        draw_symbol(
            &mut bits,
            origin + col * step,
            origin + row * step,
            scale,
            value,
            round_edges,
        );
    }

    Ok(to_rgba(&bits, inverted))
}

/// Concentric bullseye: filled black core, white ring, black ring.
fn draw_finder(bits: &mut BitMatrix, cx: usize, cy: usize, scale: usize) {
    let outer = FINDER_RADIUS * scale;
    let middle = 5 * FINDER_RADIUS * scale / 7;
    let inner = 3 * FINDER_RADIUS * scale / 7;
    fill_circle(bits, cx, cy, outer, 1);
    fill_circle(bits, cx, cy, middle, 0);
    fill_circle(bits, cx, cy, inner, 1);
}

/// Single black ring with a 1:3:1 cross-section.
fn draw_alignment(bits: &mut BitMatrix, cx: usize, cy: usize, scale: usize) {
    let outer = 5 * FINDER_RADIUS * scale / 7;
    let inner = 3 * FINDER_RADIUS * scale / 7;
    fill_circle(bits, cx, cy, outer, 1);
    fill_circle(bits, cx, cy, inner, 0);
}

fn draw_symbol(
    bits: &mut BitMatrix,
    x0: usize,
    y0: usize,
    scale: usize,
    value: u8,
    round_edges: bool,
) {
    let bar_w = SYMBOL_DIM * scale;
    let bar_h = UNIT * scale;
    for b in 0..BITS_PER_SYMBOL {
        let bar_y = y0 + 2 * b * UNIT * scale;
        if round_edges {
            // cap radius is half the bar height
            let r = bar_h / 2;
            let cy = bar_y + r;
            fill_rect(bits, x0 + r, bar_y, bar_w - 2 * r, bar_h, 1);
            fill_circle(bits, x0 + r, cy, r, 1);
            fill_circle(bits, x0 + bar_w - r, cy, r, 1);
        } else {
            fill_rect(bits, x0, bar_y, bar_w, bar_h, 1);
        }
        let solid = (value >> (BITS_PER_SYMBOL - 1 - b)) & 1 == 1;
        if !solid {
            let clear_x = x0 + (ZERO_CLEAR_CENTER - ZERO_CLEAR_WIDTH / 2) * scale;
            fill_rect(bits, clear_x, bar_y, ZERO_CLEAR_WIDTH * scale, bar_h, 0);
        }
    }
}

fn fill_rect(bits: &mut BitMatrix, x0: usize, y0: usize, w: usize, h: usize, value: u8) {
    for y in y0..(y0 + h).min(bits.height()) {
        for x in x0..(x0 + w).min(bits.width()) {
            bits.set(x, y, value);
        }
    }
}

/// Midpoint circle fill: walk one octant and paint the mirrored spans.
fn fill_circle(bits: &mut BitMatrix, cx: usize, cy: usize, r: usize, value: u8) {
    let (cx, cy) = (cx as isize, cy as isize);
    let mut x = r as isize;
    let mut y = 0isize;
    let mut decision = 1 - x;
    while y <= x {
        fill_span(bits, cx - x, cx + x, cy + y, value);
        fill_span(bits, cx - x, cx + x, cy - y, value);
        fill_span(bits, cx - y, cx + y, cy + x, value);
        fill_span(bits, cx - y, cx + y, cy - x, value);
        y += 1;
        if decision <= 0 {
            decision += 2 * y + 1;
        } else {
            x -= 1;
            decision += 2 * (y - x) + 1;
        }
    }
}

fn fill_span(bits: &mut BitMatrix, x0: isize, x1: isize, y: isize, value: u8) {
    if y < 0 || y >= bits.height() as isize {
        return;
    }
    let x0 = x0.max(0) as usize;
    let x1 = (x1.min(bits.width() as isize - 1)) as usize;
    for x in x0..=x1 {
        bits.set(x, y as usize, value);
    }
}

fn to_rgba(bits: &BitMatrix, inverted: bool) -> ImageData {
    let (black, white) = if inverted { (255u8, 0u8) } else { (0u8, 255u8) };
    let mut data = Vec::with_capacity(bits.width() * bits.height() * 4);
    for &bit in bits.data() {
        let v = if bit == 1 { black } else { white };
        data.extend_from_slice(&[v, v, v, 255]);
    }
    ImageData {
        width: bits.width(),
        height: bits.height(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodation::{ec_level, encode_content};

    fn luma_at(image: &ImageData, x: usize, y: usize) -> u8 {
        image.data[(y * image.width + x) * 4]
    }

    #[test]
    fn base_dimensions() {
        assert_eq!(base_dimension(1), 110);
        assert_eq!(base_dimension(3), 166);
        assert_eq!(base_dimension(5), 222);
        assert_eq!(base_dimension(8), 306);
    }

    #[test]
    fn resolution_must_fit_the_base() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        assert_eq!(
            render(&code, 165, false, false),
            Err(IChingError::ResolutionTooSmall)
        );
        assert!(render(&code, 166, false, false).is_ok());
    }

    #[test]
    fn patterns_land_on_the_corners() {
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        let image = render(&code, 1250, false, false).unwrap();
        assert_eq!(image.width, 1250);
        assert_eq!(image.height, 1250);
        assert_eq!(image.data.len(), 4 * 1250 * 1250);

        // scale 7, pad 44, finder centres 33 units in from the drawing edge
        let near = 44 + 33 * 7;
        let far = 44 + (166 - 33) * 7;
        // black finder cores
        assert_eq!(luma_at(&image, near, near), 0);
        assert_eq!(luma_at(&image, far, near), 0);
        assert_eq!(luma_at(&image, near, far), 0);
        // the white ring of a finder spans radii 33..55 px at scale 7
        assert_eq!(luma_at(&image, near + 40, near), 255);
        // and the outer black ring runs to 77 px
        assert_eq!(luma_at(&image, near + 60, near), 0);
        // alignment ring: white centre, black band 44 px out
        assert_eq!(luma_at(&image, far, far), 255);
        assert_eq!(luma_at(&image, far, far - 44), 0);
        // quiet zone
        assert_eq!(luma_at(&image, 50, 50), 255);
    }

    #[test]
    fn version_symbol_bars() {
        // data[0] is the version 1 = 0b000001: five broken bars over one
        // solid bar
        let code = encode_content("HELLO", ec_level::NONE).unwrap();
        let image = render(&code, 1250, false, false).unwrap();
        let origin = 44 + 44 * 7;
        // top bar, inside the zero window -> white
        assert_eq!(luma_at(&image, origin + 9 * 7, origin + 7), 255);
        // top bar, left of the window -> black
        assert_eq!(luma_at(&image, origin + 3 * 7, origin + 7), 0);
        // gap row between bar 0 and bar 1 -> white
        assert_eq!(luma_at(&image, origin + 3 * 7, origin + 3 * 7), 255);
        // bottom bar is solid, also through the window column
        assert_eq!(luma_at(&image, origin + 9 * 7, origin + 20 * 7 + 7), 0);
    }

    #[test]
    fn modifiers_do_not_move_the_bars() {
        let code = encode_content("XYZ", ec_level::LOW).unwrap();
        let plain = render(&code, 800, false, false).unwrap();
        let rounded = render(&code, 800, true, false).unwrap();
        let inverted = render(&code, 800, false, true).unwrap();
        let base = base_dimension(code.size);
        let scale = 800 / base;
        let pad = (800 - base * scale) / 2;
        let origin = pad + 44 * scale;
        let step = (SYMBOL_DIM + GAP_DIM) * scale;
        for (i, &value) in code.data.iter().enumerate() {
            let x0 = origin + (i / code.size) * step;
            let y0 = origin + (i % code.size) * step;
            for b in 0..BITS_PER_SYMBOL {
                let solid = (value >> (BITS_PER_SYMBOL - 1 - b)) & 1 == 1;
                let y = y0 + 2 * b * UNIT * scale + UNIT * scale / 2;
                let x = x0 + ZERO_CLEAR_CENTER * scale;
                let expect = if solid { 0 } else { 255 };
                assert_eq!(luma_at(&plain, x, y), expect);
                assert_eq!(luma_at(&rounded, x, y), expect);
                assert_eq!(luma_at(&inverted, x, y), 255 - expect);
            }
        }
    }
}
