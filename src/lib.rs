//! IChing two-dimensional barcode encoding and decoding.
//!
//! An IChing code stores an alphanumeric payload as a square grid of
//! hexagram-like glyphs: each glyph carries six bits as horizontal bars, a
//! solid bar for a one and a broken bar for a zero. Three bullseye finder
//! patterns and one alignment ring mark the corners so that a captured
//! photograph can be located, rectified and read back.
//!
//! # Usage example
//!
//! ```rust
//! use iching::{DecodeOptions, EncodeOptions};
//!
//! let (code, image) = iching::encode("HELLO", &EncodeOptions::default()).unwrap();
//! assert_eq!(code.size, 3);
//!
//! let decoded =
//!     iching::decode(&image.data, image.width, image.height, &DecodeOptions::default()).unwrap();
//! assert_eq!(decoded.data, "HELLO");
//! ```
//!
//! Payloads are restricted to a 64-character alphabet (upper-case letters,
//! digits and common punctuation, see [alphabet::ALPHABET]) and are
//! upper-cased on the way in. The `ec_level` option trades capacity for
//! robustness: it is the fraction of payload symbols that may be damaged
//! in the captured image and still recovered, backed by Reed-Solomon
//! parity over GF(64).
//!
//! Both entry points are pure synchronous functions. Apart from the field
//! tables and the cached Reed-Solomon generator polynomials, which are
//! immutable once built, no state outlives a call, so concurrent use is
//! safe.
pub mod alphabet;
pub mod code;
pub mod decodation;
pub mod detect;
pub mod encodation;
pub mod error;
pub mod errorcode;
pub mod geometry;
pub mod matrix;
pub mod render;

pub use code::{DecodedIChing, EncodedIChing, ImageData, MAX_SIZE, OFFSET, VERSION};
pub use detect::locate::PatternsLocation;
pub use encodation::ec_level;
pub use error::{IChingError, Result};

/// Options for [encode].
#[derive(Clone, Copy, Debug)]
pub struct EncodeOptions {
    /// Fraction of payload symbols that may be damaged and still
    /// recovered; any value in [0, 1], canonical presets in [ec_level].
    pub ec_level: f64,
    /// Side length of the rendered image in pixels.
    pub resolution: usize,
    /// Round the bar caps. Purely visual.
    pub round_edges: bool,
    /// Render white-on-black. Purely visual.
    pub inverted: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            ec_level: ec_level::MEDIUM,
            resolution: 1250,
            round_edges: false,
            inverted: false,
        }
    }
}

/// Options for [decode].
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeOptions {
    /// Flip the colour channels before binarization, for white-on-black
    /// captures.
    pub inverted: bool,
}

/// Encode `payload` into an IChing code and render it.
///
/// Returns the logical code matrix together with the rendered RGBA image.
pub fn encode(payload: &str, options: &EncodeOptions) -> Result<(EncodedIChing, ImageData)> {
    let code = encodation::encode_content(payload, options.ec_level)?;
    let image = render::render(
        &code,
        options.resolution,
        options.round_edges,
        options.inverted,
    )?;
    Ok((code, image))
}

/// Decode an IChing code from a captured RGBA image.
///
/// `rgba` must hold `4 * width * height` bytes. On success the payload
/// string is returned along with the pattern locations that anchored the
/// detection.
pub fn decode(
    rgba: &[u8],
    width: usize,
    height: usize,
    options: &DecodeOptions,
) -> Result<DecodedIChing> {
    let (code, patterns) = detect::detect(rgba, width, height, options.inverted)?;
    let payload = decodation::decode_content(&code)?;
    Ok(DecodedIChing {
        version: VERSION,
        size: code.size,
        data: payload,
        patterns,
    })
}
