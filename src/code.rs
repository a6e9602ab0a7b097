//! The IChing code types shared between the pipeline stages.

use crate::detect::locate::PatternsLocation;

/// Version written into the first symbol of every code.
pub const VERSION: u8 = 1;

/// Number of metadata symbols (version, payload length) before the payload.
pub const OFFSET: usize = 2;

/// Largest total number of symbols a code may hold.
pub const MAX_SIZE: usize = 64;

/// A logical IChing code: the square of GF(64) symbols.
///
/// `data` holds `size * size` symbols. The first two are version and
/// payload length, then the mapped payload, zero padding if the square
/// does not divide evenly, and finally an even number of Reed-Solomon
/// parity symbols. Symbols are placed in the rendered square with the row
/// index increasing fastest, so `data[i]` sits at column `i / size`,
/// row `i % size`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EncodedIChing {
    pub version: u8,
    pub size: usize,
    pub data: Vec<u8>,
}

/// An RGBA raster, 4 bytes per pixel, row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImageData {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// The result of decoding a captured image.
#[derive(Clone, PartialEq, Debug)]
pub struct DecodedIChing {
    pub version: u8,
    pub size: usize,
    /// The recovered payload.
    pub data: String,
    /// Where the finder and alignment patterns were seen in the image.
    pub patterns: PatternsLocation,
}
