//! Polynomials with coefficients in GF(64).
//!
//! Coefficients are stored most significant first, so `coefficients[0]` is
//! the coefficient of the highest power of x. Leading zeros are stripped on
//! construction; the zero polynomial is the single coefficient `[0]`.
//!
//! Both the generator construction in the Reed-Solomon encoder and the key
//! equation in the decoder are phrased in terms of this algebra.
use super::galois::GF;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Poly {
    coefficients: Vec<GF>,
}

impl Poly {
    /// Build a polynomial from MSB-first coefficients, stripping leading
    /// zeros.
    pub fn new(coefficients: Vec<GF>) -> Self {
        let first_non_zero = coefficients.iter().position(|c| *c != GF(0));
        match first_non_zero {
            Some(0) => Poly { coefficients },
            Some(i) => Poly {
                coefficients: coefficients[i..].to_vec(),
            },
            None => Poly::zero(),
        }
    }

    /// Build a polynomial from raw codeword bytes.
    pub fn from_codewords(data: &[u8]) -> Self {
        Poly::new(data.iter().map(|c| GF(*c)).collect())
    }

    pub fn zero() -> Self {
        Poly {
            coefficients: vec![GF(0)],
        }
    }

    pub fn one() -> Self {
        Poly {
            coefficients: vec![GF(1)],
        }
    }

    /// The polynomial `coefficient * x^degree`.
    pub fn monomial(degree: usize, coefficient: GF) -> Self {
        if coefficient == GF(0) {
            return Poly::zero();
        }
        let mut coefficients = vec![GF(0); degree + 1];
        coefficients[0] = coefficient;
        Poly { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == GF(0)
    }

    /// MSB-first coefficients.
    pub fn coefficients(&self) -> &[GF] {
        &self.coefficients
    }

    /// The coefficient of `x^degree`, zero above the leading term.
    pub fn coefficient(&self, degree: usize) -> GF {
        if degree > self.degree() {
            return GF(0);
        }
        self.coefficients[self.degree() - degree]
    }

    /// Evaluate at `x` with Horner's scheme.
    pub fn evaluate(&self, x: GF) -> GF {
        let mut acc = GF(0);
        for c in &self.coefficients {
            acc = acc * x + *c;
        }
        acc
    }

    pub fn add(&self, rhs: &Poly) -> Poly {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        let (longer, shorter) = if self.coefficients.len() >= rhs.coefficients.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut sum = longer.coefficients.clone();
        let offset = longer.coefficients.len() - shorter.coefficients.len();
        for (s, c) in sum[offset..].iter_mut().zip(&shorter.coefficients) {
            *s += *c;
        }
        Poly::new(sum)
    }

    pub fn multiply(&self, rhs: &Poly) -> Poly {
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero();
        }
        let mut product = vec![GF(0); self.coefficients.len() + rhs.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in rhs.coefficients.iter().enumerate() {
                product[i + j] += *a * *b;
            }
        }
        Poly::new(product)
    }

    pub fn multiply_scalar(&self, scalar: GF) -> Poly {
        if scalar == GF(0) {
            return Poly::zero();
        }
        Poly::new(self.coefficients.iter().map(|c| *c * scalar).collect())
    }

    /// Divide by `divisor`, returning quotient and remainder.
    ///
    /// Extended synthetic division on a working copy of the coefficients:
    /// after the loop the head of the buffer holds the quotient and the
    /// last `divisor.degree()` entries hold the remainder.
    pub fn divide(&self, divisor: &Poly) -> (Poly, Poly) {
        assert!(!divisor.is_zero(), "division by the zero polynomial");
        if self.degree() < divisor.degree() {
            return (Poly::zero(), self.clone());
        }
        let mut buf = self.coefficients.clone();
        let lead = divisor.coefficients[0];
        let quotient_len = buf.len() + 1 - divisor.coefficients.len();
        for i in 0..quotient_len {
            let coef = buf[i] / lead;
            buf[i] = coef;
            if coef != GF(0) {
                for (j, d) in divisor.coefficients.iter().enumerate().skip(1) {
                    buf[i + j] += coef * *d;
                }
            }
        }
        let remainder = Poly::new(buf[quotient_len..].to_vec());
        let quotient = Poly::new(buf[..quotient_len].to_vec());
        (quotient, remainder)
    }
}

#[test]
fn strips_leading_zeros() {
    let p = Poly::new(vec![GF(0), GF(0), GF(5), GF(1)]);
    assert_eq!(p.coefficients(), &[GF(5), GF(1)]);
    assert_eq!(p.degree(), 1);

    let z = Poly::new(vec![GF(0), GF(0)]);
    assert!(z.is_zero());
    assert_eq!(z.coefficients(), &[GF(0)]);
    assert_eq!(z, Poly::zero());
}

#[test]
fn coefficient_by_degree() {
    // x^3 + 9x + 7
    let p = Poly::new(vec![GF(1), GF(0), GF(9), GF(7)]);
    assert_eq!(p.coefficient(0), GF(7));
    assert_eq!(p.coefficient(1), GF(9));
    assert_eq!(p.coefficient(2), GF(0));
    assert_eq!(p.coefficient(3), GF(1));
    assert_eq!(p.coefficient(9), GF(0));
}

#[test]
fn evaluate_matches_power_sum() {
    let p = Poly::new(vec![GF(3), GF(0), GF(11), GF(40)]);
    for x in 0..64 {
        let x = GF(x);
        let direct = GF(3) * x * x * x + GF(11) * x + GF(40);
        assert_eq!(p.evaluate(x), direct);
    }
}

#[test]
fn add_is_xor_by_degree() {
    let p = Poly::new(vec![GF(1), GF(2), GF(3)]);
    let q = Poly::new(vec![GF(5), GF(1)]);
    assert_eq!(p.add(&q), Poly::new(vec![GF(1), GF(7), GF(2)]));
    assert_eq!(p.add(&Poly::zero()), p);
    assert!(p.add(&p).is_zero());
}

#[test]
fn multiply_by_one_and_zero() {
    let p = Poly::new(vec![GF(9), GF(0), GF(21)]);
    assert_eq!(p.multiply(&Poly::one()), p);
    assert!(p.multiply(&Poly::zero()).is_zero());
}

#[test]
fn product_evaluation_is_evaluation_product() {
    let p = Poly::new(vec![GF(7), GF(13), GF(1)]);
    let q = Poly::new(vec![GF(2), GF(0), GF(61), GF(5)]);
    let pq = p.multiply(&q);
    for x in 0..64 {
        let x = GF(x);
        assert_eq!(pq.evaluate(x), p.evaluate(x) * q.evaluate(x));
    }
}

#[test]
fn monomial_shape() {
    let m = Poly::monomial(3, GF(6));
    assert_eq!(m.degree(), 3);
    assert_eq!(m.coefficient(3), GF(6));
    assert_eq!(m.coefficient(0), GF(0));
    assert!(Poly::monomial(5, GF(0)).is_zero());
}

#[test]
fn division_identity() {
    let p = Poly::new(vec![GF(12), GF(5), GF(0), GF(47), GF(9), GF(1)]);
    let d = Poly::new(vec![GF(1), GF(3), GF(2)]);
    let (q, r) = p.divide(&d);
    assert!(r.degree() < d.degree() || r.is_zero());
    assert_eq!(q.multiply(&d).add(&r), p);
}

#[test]
fn division_by_larger_degree() {
    let p = Poly::new(vec![GF(4), GF(2)]);
    let d = Poly::new(vec![GF(1), GF(0), GF(0)]);
    let (q, r) = p.divide(&d);
    assert!(q.is_zero());
    assert_eq!(r, p);
}

#[test]
fn division_exact() {
    let d = Poly::new(vec![GF(1), GF(3), GF(2)]);
    let q = Poly::new(vec![GF(17), GF(0), GF(4)]);
    let p = d.multiply(&q);
    let (quot, rem) = p.divide(&d);
    assert_eq!(quot, q);
    assert!(rem.is_zero());
}
