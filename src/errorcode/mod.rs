//! Reed-Solomon error correction for IChing codes.
//!
//! The tail of every IChing code holds parity symbols computed over the
//! metadata and payload symbols. With `k` parity symbols up to `k / 2`
//! corrupted codewords can be repaired, no matter whether the corruption
//! hits payload, metadata or the parity itself.
//!
//! Encoding appends the remainder of the data polynomial (shifted up by
//! `k`) divided by a generator polynomial of degree `k`. The generators
//! are built on demand from G_0 = 1 via G_k = G_{k-1} * (x + a^(k-1)) and
//! cached for the lifetime of the process; together with the field tables
//! in [galois] this is the only process-wide state, and it is immutable
//! once grown.
//!
//! Decoding is the classic syndrome-based chain: syndrome evaluation, the
//! extended Euclidean key equation, an exhaustive root search over the 63
//! non-zero field elements and Forney error magnitudes. The field is tiny,
//! so the exhaustive search is cheaper than anything clever.
pub mod galois;
pub mod poly;

mod decoding;

use std::sync::Mutex;

use galois::GF;
use poly::Poly;

pub use decoding::{decode_error, ErrorDecodingError};

/// Cache of generator polynomials, indexed by degree.
static GENERATORS: Mutex<Vec<Poly>> = Mutex::new(Vec::new());

/// The degree `k` generator polynomial (x + a^0)(x + a^1)...(x + a^(k-1)).
fn generator(degree: usize) -> Poly {
    let mut cache = GENERATORS.lock().unwrap();
    if cache.is_empty() {
        cache.push(Poly::one());
    }
    while cache.len() <= degree {
        let k = cache.len();
        let factor = Poly::new(vec![GF(1), GF::primitive_power((k - 1) as u8)]);
        let next = cache[k - 1].multiply(&factor);
        cache.push(next);
    }
    cache[degree].clone()
}

/// Append `parity` Reed-Solomon parity symbols to `data`.
///
/// The returned vector holds the unchanged data symbols followed by the
/// parity symbols. A parity count of zero returns the data as is.
pub fn encode_error(data: &[u8], parity: usize) -> Vec<u8> {
    assert!(!data.is_empty(), "cannot encode an empty message");
    let mut encoded = data.to_vec();
    if parity == 0 {
        return encoded;
    }
    encoded.resize(data.len() + parity, 0);

    let shifted = Poly::from_codewords(&encoded);
    let (_, remainder) = shifted.divide(&generator(parity));

    // Right-align the remainder coefficients in the parity tail; degrees
    // lost to leading-zero stripping stay zero.
    let tail_start = encoded.len() - remainder.coefficients().len();
    for (slot, c) in encoded[tail_start..].iter_mut().zip(remainder.coefficients()) {
        *slot = (*c).into();
    }
    encoded
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[test]
fn generator_polynomials() {
    assert_eq!(generator(0), Poly::one());
    // (x + 1)
    assert_eq!(generator(1), Poly::new(vec![GF(1), GF(1)]));
    // (x + 1)(x + 2) = x^2 + 3x + 2
    assert_eq!(generator(2), Poly::new(vec![GF(1), GF(3), GF(2)]));
    for k in 1..=16 {
        let g = generator(k);
        assert_eq!(g.degree(), k);
        // every a^i for i < k is a root
        for i in 0..k {
            assert_eq!(g.evaluate(GF::primitive_power(i as u8)), GF(0));
        }
    }
}

#[test]
fn no_parity_is_identity() {
    let data = [1, 5, 7, 4];
    assert_eq!(encode_error(&data, 0), data.to_vec());
}

#[test]
fn hello_parity_block() {
    // "HELLO" mapped through the alphabet, with version and length in
    // front; the two parity symbols were computed by hand.
    let data = [1, 5, 7, 4, 11, 11, 14];
    let encoded = encode_error(&data, 2);
    assert_eq!(encoded, vec![1, 5, 7, 4, 11, 11, 14, 62, 55]);
}

#[test]
fn encoded_block_has_zero_syndromes() {
    let data = [1, 9, 31, 0, 44, 63, 17, 2];
    for parity in [2usize, 4, 6, 8] {
        let encoded = encode_error(&data, parity);
        assert_eq!(encoded.len(), data.len() + parity);
        assert_eq!(&encoded[..data.len()], &data);
        let as_poly = Poly::from_codewords(&encoded);
        for i in 0..parity {
            assert_eq!(as_poly.evaluate(GF::primitive_power(i as u8)), GF(0));
        }
    }
}
