//! Syndrome-based decoding of the IChing Reed-Solomon code.
//!
//! The decoder follows the classic four steps:
//!
//! 1. Evaluate the received word at a^0 .. a^(k-1) to get the syndromes.
//! 2. Solve the key equation with the extended Euclidean algorithm to get
//!    the error locator polynomial sigma and error evaluator omega.
//! 3. Find the zeros of sigma by testing all 63 non-zero field elements;
//!    their inverses are the error locations.
//! 4. Compute the error magnitudes from omega and XOR them onto the
//!    affected codewords.
use super::galois::GF;
use super::poly::Poly;

/// Ways the error correction can fail.
///
/// All of them mean the received word holds more corruption than the
/// parity symbols can express; callers fold them into one domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDecodingError {
    /// The Euclidean iteration ended in a degenerate state.
    KeyEquation,
    /// The locator polynomial does not split into distinct roots.
    RootCountMismatch,
    /// An error location points outside the codeword.
    LocationOutOfRange,
}

/// Correct up to `parity / 2` corrupted symbols of `codeword` in place.
///
/// `parity` is the number of Reed-Solomon symbols at the tail of the
/// codeword. A word with all-zero syndromes is returned unchanged.
pub fn decode_error(codeword: &mut [u8], parity: usize) -> Result<(), ErrorDecodingError> {
    assert!(parity >= 1, "degree of generator polynomial must be >= 1");
    assert!(
        codeword.len() > parity,
        "codeword shorter than its parity suffix"
    );

    let received = Poly::from_codewords(codeword);
    let mut syndromes = vec![GF(0); parity];
    let mut have_non_zero = false;
    for (i, s) in syndromes.iter_mut().enumerate() {
        *s = received.evaluate(GF::primitive_power((parity - 1 - i) as u8));
        have_non_zero = have_non_zero || *s != GF(0);
    }
    if !have_non_zero {
        return Ok(());
    }
    let syndrome_poly = Poly::new(syndromes);

    let (sigma, omega) = solve_key_equation(Poly::monomial(parity, GF(1)), syndrome_poly, parity)?;

    let locations = find_error_locations(&sigma)?;
    let magnitudes = find_error_magnitudes(&omega, &locations);

    let n = codeword.len();
    for (x, e) in locations.iter().zip(magnitudes.iter()) {
        let power = x.log();
        if power >= n {
            return Err(ErrorDecodingError::LocationOutOfRange);
        }
        let idx = n - 1 - power;
        codeword[idx] = (GF(codeword[idx]) + *e).into();
    }

    // With more errors than the code can express the Euclidean step may
    // still produce a locator whose roots all check out. Re-evaluating the
    // syndromes rejects every such word instead of passing corruption on.
    let corrected = Poly::from_codewords(codeword);
    for i in 0..parity {
        if corrected.evaluate(GF::primitive_power(i as u8)) != GF(0) {
            return Err(ErrorDecodingError::RootCountMismatch);
        }
    }
    Ok(())
}

/// Run the extended Euclidean algorithm on x^k and the syndrome
/// polynomial until the remainder degree drops below k / 2.
///
/// Returns the error locator sigma and error evaluator omega, both
/// normalised so that sigma(0) = 1.
fn solve_key_equation(
    r_prev: Poly,
    r_cur: Poly,
    parity: usize,
) -> Result<(Poly, Poly), ErrorDecodingError> {
    let mut r_last = r_prev;
    let mut r = r_cur;
    let mut a_last = Poly::zero();
    let mut a = Poly::one();

    while 2 * r.degree() >= parity {
        if r.is_zero() {
            return Err(ErrorDecodingError::KeyEquation);
        }
        let (q, r_next) = r_last.divide(&r);
        let a_next = q.multiply(&a).add(&a_last);
        r_last = r;
        a_last = a;
        r = r_next;
        a = a_next;
    }

    let constant = a.coefficient(0);
    if constant == GF(0) {
        return Err(ErrorDecodingError::KeyEquation);
    }
    let inv = constant.inverse();
    Ok((a.multiply_scalar(inv), r.multiply_scalar(inv)))
}

/// Exhaustive root search over the non-zero field elements.
///
/// The inverses of the roots of sigma are the error locations X_i. The
/// number of distinct roots must match the locator degree, otherwise the
/// word is uncorrectable.
fn find_error_locations(sigma: &Poly) -> Result<Vec<GF>, ErrorDecodingError> {
    let expected = sigma.degree();
    let mut locations = Vec::with_capacity(expected);
    for beta in 1..64u8 {
        if sigma.evaluate(GF(beta)) == GF(0) {
            locations.push(GF(beta).inverse());
        }
    }
    if locations.len() != expected {
        return Err(ErrorDecodingError::RootCountMismatch);
    }
    Ok(locations)
}

/// Forney magnitudes: e_i = omega(X_i^-1) * prod_{j != i} (1 + X_i^-1 X_j)^-1.
///
/// The product is never zero because the locations are distinct.
fn find_error_magnitudes(omega: &Poly, locations: &[GF]) -> Vec<GF> {
    let mut magnitudes = Vec::with_capacity(locations.len());
    for (i, x) in locations.iter().enumerate() {
        let xi_inv = x.inverse();
        let mut denominator = GF(1);
        for (j, other) in locations.iter().enumerate() {
            if i != j {
                denominator *= GF(1) + xi_inv * *other;
            }
        }
        magnitudes.push(omega.evaluate(xi_inv) / denominator);
    }
    magnitudes
}

#[cfg(test)]
mod tests {
    use super::super::encode_error;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_word_is_untouched() {
        let encoded = encode_error(&[1, 5, 7, 4, 11, 11, 14], 2);
        let mut received = encoded.clone();
        decode_error(&mut received, 2).unwrap();
        assert_eq!(received, encoded);
    }

    #[test]
    fn corrects_single_error_anywhere() {
        let encoded = encode_error(&[1, 5, 7, 4, 11, 11, 14], 2);
        for idx in 0..encoded.len() {
            for wrong in [0x2A, 0x01, 0x3F] {
                let mut received = encoded.clone();
                received[idx] ^= wrong;
                decode_error(&mut received, 2).unwrap();
                assert_eq!(received, encoded, "error at index {}", idx);
            }
        }
    }

    #[test]
    fn corrects_metadata_symbols() {
        let encoded = encode_error(&[1, 12, 33, 33, 8, 0, 60, 44, 17, 21, 9, 2, 5, 61, 3], 10);
        let mut received = encoded.clone();
        received[0] ^= 0x17; // version symbol
        received[1] ^= 0x08; // length symbol
        decode_error(&mut received, 10).unwrap();
        assert_eq!(received, encoded);
    }

    #[test]
    fn corrects_up_to_half_parity_errors() {
        let data = [1, 12, 7, 4, 11, 11, 14, 30, 30, 30, 12, 0, 0, 25];
        let parity = 6;
        let encoded = encode_error(&data, parity);
        assert_eq!(encoded.len(), 20);
        // every 3-subset over a spread of positions, deterministic
        let positions = [0usize, 1, 4, 7, 13, 14, 16, 19];
        for (ai, &a) in positions.iter().enumerate() {
            for (bi, &b) in positions.iter().enumerate().skip(ai + 1) {
                for &c in positions.iter().skip(bi + 1) {
                    let mut received = encoded.clone();
                    received[a] ^= 0x15;
                    received[b] ^= 0x3A;
                    received[c] ^= 0x06;
                    decode_error(&mut received, parity).unwrap();
                    assert_eq!(received, encoded, "errors at {} {} {}", a, b, c);
                }
            }
        }
    }

    #[test]
    fn too_many_errors_never_pass_silently() {
        let data: Vec<u8> = (0..19u8).map(|i| (i * 7 + 3) % 64).collect();
        let parity = 6;
        let encoded = encode_error(&data, parity);
        assert_eq!(encoded.len(), 25);
        // four errors against a distance-7 code: either the decoder
        // reports failure or it lands on some codeword, but it must never
        // return a non-codeword.
        for start in 0..encoded.len() - 9 {
            let mut received = encoded.clone();
            for (k, idx) in (start..start + 12).step_by(3).enumerate() {
                received[idx] ^= [0x11, 0x2C, 0x05, 0x3E][k];
            }
            if decode_error(&mut received, parity).is_ok() {
                let as_poly = Poly::from_codewords(&received);
                for i in 0..parity {
                    assert_eq!(
                        as_poly.evaluate(GF::primitive_power(i as u8)),
                        GF(0),
                        "silent mis-decode starting at {}",
                        start
                    );
                }
            }
        }
    }

    #[test]
    fn erased_word_fails() {
        let encoded = encode_error(&[1, 5, 7, 4, 11, 11, 14], 2);
        let mut received = encoded.clone();
        for r in received.iter_mut() {
            *r ^= 0x2B;
        }
        assert!(decode_error(&mut received, 2).is_err());
    }
}
