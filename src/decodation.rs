//! Code matrix to payload decoding. This comes after visual detection and
//! performs the inverse of the `encodation` module.
use log::debug;

use crate::alphabet;
use crate::code::{EncodedIChing, OFFSET, VERSION};
use crate::error::{IChingError, Result};
use crate::errorcode;

/// Recover the payload string from an extracted code matrix.
///
/// The parity count is recomputed from the stored payload length, errors
/// are corrected in a working copy, and the metadata is validated again
/// afterwards: a word that error correction forced towards a different
/// (for example all-zero) codeword fails here instead of producing
/// garbage.
pub fn decode_content(code: &EncodedIChing) -> Result<String> {
    let len = code.data.len();
    if code.size * code.size != len {
        return Err(IChingError::NotSquare);
    }
    if len <= OFFSET {
        return Err(IChingError::InvalidCode);
    }
    let payload_len = code.data[1] as usize;
    if payload_len < 1 || payload_len > len - OFFSET {
        return Err(IChingError::InvalidCode);
    }

    let parity = (len - OFFSET - payload_len) & !1;
    let mut corrected = code.data.clone();
    if parity > 0 {
        errorcode::decode_error(&mut corrected, parity).map_err(|e| {
            debug!("error correction failed: {:?}", e);
            IChingError::InvalidCode
        })?;
    }

    if corrected[0] != VERSION || corrected[1] as usize != payload_len {
        return Err(IChingError::InvalidCode);
    }

    let mut payload = String::with_capacity(payload_len);
    for &symbol in &corrected[OFFSET..OFFSET + payload_len] {
        let ch = alphabet::char_at(symbol).ok_or(IChingError::InvalidCode)?;
        payload.push(ch as char);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodation::{ec_level, encode_content};
    use pretty_assertions::assert_eq;

    #[test]
    fn inverts_the_encoder() {
        for (payload, ec) in [
            ("HELLO", ec_level::NONE),
            ("VALIDPAYLOAD", ec_level::HIGH),
            ("A", ec_level::NONE),
            ("MIXED 0.5% {BRACES}?", ec_level::MEDIUM),
            ("\"QUOTED\" <TEXT>", ec_level::LOW),
        ] {
            let code = encode_content(payload, ec).unwrap();
            assert_eq!(decode_content(&code).unwrap(), payload.to_uppercase());
        }
    }

    #[test]
    fn corrects_a_flipped_parity_symbol() {
        let mut code = encode_content("HELLO", ec_level::NONE).unwrap();
        // index 7 is the first of the two top-up parity symbols
        code.data[7] ^= 0x2A;
        assert_eq!(decode_content(&code).unwrap(), "HELLO");
    }

    #[test]
    fn corrects_a_flipped_version_symbol() {
        let mut code = encode_content("HELLO", ec_level::NONE).unwrap();
        code.data[0] ^= 0x04;
        assert_eq!(decode_content(&code).unwrap(), "HELLO");
    }

    #[test]
    fn corrects_payload_symbols_up_to_capacity() {
        let code = encode_content("VALIDPAYLOAD", ec_level::HIGH).unwrap();
        // 10 parity symbols correct up to 5 errors
        let mut received = code.clone();
        for idx in [0usize, 3, 8, 14, 20] {
            received.data[idx] ^= 0x19;
        }
        assert_eq!(decode_content(&received).unwrap(), "VALIDPAYLOAD");
    }

    #[test]
    fn overloaded_word_never_decodes_wrong() {
        let code = encode_content("VALIDPAYLOAD", ec_level::HIGH).unwrap();
        for shift in 0..18 {
            let mut received = code.clone();
            for k in 0..7usize {
                let idx = (shift + k * 3) % received.data.len();
                received.data[idx] ^= 0x13 + k as u8;
            }
            match decode_content(&received) {
                Ok(payload) => assert_eq!(payload, "VALIDPAYLOAD"),
                Err(e) => assert_eq!(e, IChingError::InvalidCode),
            }
        }
    }

    #[test]
    fn non_square_data_is_rejected() {
        let mut code = encode_content("HELLO", ec_level::NONE).unwrap();
        code.data.pop();
        assert_eq!(decode_content(&code), Err(IChingError::NotSquare));
    }

    #[test]
    fn bad_length_symbol_is_rejected() {
        let mut code = encode_content("HI", ec_level::NONE).unwrap();
        // no parity fits in the 2x2 square (2 + 2 fills it), so a broken
        // length byte must be caught by validation alone
        assert_eq!(code.size, 2);
        code.data[1] = 9;
        assert_eq!(decode_content(&code), Err(IChingError::InvalidCode));
    }

    #[test]
    fn bad_version_without_parity_is_rejected() {
        let mut code = encode_content("HI", ec_level::NONE).unwrap();
        code.data[0] = 3;
        assert_eq!(decode_content(&code), Err(IChingError::InvalidCode));
    }

    #[test]
    fn all_zero_word_is_rejected() {
        let code = EncodedIChing {
            version: VERSION,
            size: 3,
            data: vec![0; 9],
        };
        assert_eq!(decode_content(&code), Err(IChingError::InvalidCode));
    }
}
