//! The common error type.

use std::fmt;

/// Everything that can go wrong while encoding or decoding an IChing code.
///
/// The variants group into bad user input (payload, ecLevel, resolution),
/// capacity limits, and decode failures on captured images. All of them
/// are fatal for the call that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IChingError {
    /// The payload contains no characters.
    EmptyPayload,
    /// A payload character has no alphabet entry.
    InvalidCharacter,
    /// The requested error correction level is outside [0, 1].
    InvalidErrorCorrectionLevel,
    /// Payload plus parity does not fit the largest code.
    PayloadTooBig,
    /// The requested resolution cannot hold the code at integer scale.
    ResolutionTooSmall,
    /// The captured image is smaller than a threshold block or its buffer
    /// length does not match the stated dimensions.
    InvalidImageSize,
    /// The extracted code fails validation or error correction.
    InvalidCode,
    /// Fewer than three finder candidates were detected.
    FinderPatternsNotFound,
    /// Finder candidates were detected but none survive the size filter.
    NoValidFinderPatterns,
    /// The codeword array length is not a perfect square of the stated size.
    NotSquare,
}

impl fmt::Display for IChingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            IChingError::EmptyPayload => "Empty payload!",
            IChingError::InvalidCharacter => "Invalid character in payload!",
            IChingError::InvalidErrorCorrectionLevel => {
                "Error correction percentage must be a value between 0 - 1!"
            }
            IChingError::PayloadTooBig => {
                "Payload and error correction level combination is too big!"
            }
            IChingError::ResolutionTooSmall => "Resolution is too small!",
            IChingError::InvalidImageSize => "Invalid image size!",
            IChingError::InvalidCode => "Invalid IChing code!",
            IChingError::FinderPatternsNotFound => "Couldn't Locate Finder Patterns!",
            IChingError::NoValidFinderPatterns => "No valid finder patterns found!",
            IChingError::NotSquare => "IChing code must be a square!",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for IChingError {}

pub type Result<T> = std::result::Result<T, IChingError>;

#[test]
fn messages_are_stable() {
    assert_eq!(IChingError::EmptyPayload.to_string(), "Empty payload!");
    assert_eq!(
        IChingError::InvalidCode.to_string(),
        "Invalid IChing code!"
    );
    assert_eq!(
        IChingError::FinderPatternsNotFound.to_string(),
        "Couldn't Locate Finder Patterns!"
    );
    assert_eq!(
        IChingError::NotSquare.to_string(),
        "IChing code must be a square!"
    );
}
