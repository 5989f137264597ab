//! Sparse integer polynomials in `q`.
//!
//! Coefficients are exact `i64`s and exponents are `u32`s; a zero coefficient is never
//! stored, so the zero polynomial is the empty map and equality is structural.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A polynomial `sum c_e q^e` with non-zero integer coefficients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Polynomial {
    terms: BTreeMap<u32, i64>,
}

impl Polynomial {
    /// `0`.
    pub fn zero() -> Self {
        Self::default()
    }

    /// `1`.
    pub fn one() -> Self {
        Self::monomial(0, 1)
    }

    /// `coefficient * q^exponent`.
    pub fn monomial(exponent: u32, coefficient: i64) -> Self {
        let mut out = Self::zero();
        out.add_term(exponent, coefficient);
        out
    }

    /// Sums the given `(exponent, coefficient)` pairs; repeated exponents accumulate.
    pub fn from_terms(terms: impl IntoIterator<Item = (u32, i64)>) -> Self {
        let mut out = Self::zero();
        for (e, c) in terms {
            out.add_term(e, c);
        }
        out
    }

    /// Adds `coefficient * q^exponent` in place, dropping the entry if it cancels.
    pub fn add_term(&mut self, exponent: u32, coefficient: i64) {
        if coefficient == 0 {
            return;
        }
        let entry = self.terms.entry(exponent).or_insert(0);
        *entry += coefficient;
        if *entry == 0 {
            self.terms.remove(&exponent);
        }
    }

    /// `true` for the zero polynomial.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `q^exponent` (`0` if absent).
    #[inline]
    pub fn coefficient(&self, exponent: u32) -> i64 {
        self.terms.get(&exponent).copied().unwrap_or(0)
    }

    /// Highest exponent, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<u32> {
        self.terms.keys().next_back().copied()
    }

    /// Non-zero terms in ascending exponent order.
    pub fn terms(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
        self.terms.iter().map(|(&e, &c)| (e, c))
    }

    /// Number of non-zero terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// `q^k * self`.
    pub fn shift(&self, k: u32) -> Self {
        Self {
            terms: self.terms.iter().map(|(&e, &c)| (e + k, c)).collect(),
        }
    }

    /// `c * self`.
    pub fn scale(&self, c: i64) -> Self {
        if c == 0 {
            return Self::zero();
        }
        Self {
            terms: self.terms.iter().map(|(&e, &v)| (e, v * c)).collect(),
        }
    }

    /// Value at `q`.
    pub fn evaluate(&self, q: i64) -> i64 {
        self.terms
            .iter()
            .map(|(&e, &c)| c * q.pow(e))
            .sum()
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        for (e, c) in rhs.terms() {
            self.add_term(e, c);
        }
    }
}

impl SubAssign<&Polynomial> for Polynomial {
    fn sub_assign(&mut self, rhs: &Polynomial) {
        for (e, c) in rhs.terms() {
            self.add_term(e, -c);
        }
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: Polynomial) -> Polynomial {
        self += &rhs;
        self
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(mut self, rhs: Polynomial) -> Polynomial {
        self -= &rhs;
        self
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut out = Polynomial::zero();
        for (e1, c1) in self.terms() {
            for (e2, c2) in rhs.terms() {
                out.add_term(e1 + e2, c1 * c2);
            }
        }
        out
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1)
    }
}

/// Renders `c0 q^e0 + c1 q^e1 + ...` in ascending exponent order; `0` when empty.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        for (k, (e, c)) in self.terms().enumerate() {
            match (k, c < 0) {
                (0, _) => write!(f, "{c} q^{e}")?,
                (_, true) => write!(f, " - {} q^{e}", c.unsigned_abs())?,
                (_, false) => write!(f, " + {c} q^{e}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(terms: &[(u32, i64)]) -> Polynomial {
        Polynomial::from_terms(terms.iter().copied())
    }

    #[test]
    fn zero_coefficients_are_never_stored() {
        assert!(Polynomial::monomial(3, 0).is_zero());
        assert!(poly(&[(1, 2), (1, -2)]).is_zero());
        let a = poly(&[(0, 1), (1, 2), (2, 1)]);
        assert!((&a - &a).is_zero());
        assert_eq!((&a - &a), Polynomial::zero());
    }

    #[test]
    fn add_sub_mul() {
        let a = poly(&[(0, 1), (1, 2), (2, 1)]);
        let b = poly(&[(0, 1), (1, -2), (2, 1)]);
        assert_eq!(&a + &b, poly(&[(0, 2), (2, 2)]));
        assert_eq!(&a - &b, poly(&[(1, 4)]));
        // (1+q)^2 (1-q)^2 = (1-q^2)^2
        assert_eq!(&a * &b, poly(&[(0, 1), (2, -2), (4, 1)]));
        assert_eq!(&a * &Polynomial::zero(), Polynomial::zero());
        assert_eq!(&a * &Polynomial::one(), a);
    }

    #[test]
    fn shift_and_scale() {
        let a = poly(&[(0, 1), (1, 1)]);
        assert_eq!(a.shift(2), poly(&[(2, 1), (3, 1)]));
        assert_eq!(a.scale(-3), poly(&[(0, -3), (1, -3)]));
        assert!(a.scale(0).is_zero());
        assert_eq!(-a.clone(), a.scale(-1));
    }

    #[test]
    fn accessors() {
        let a = poly(&[(0, 1), (3, -4)]);
        assert_eq!(a.coefficient(3), -4);
        assert_eq!(a.coefficient(1), 0);
        assert_eq!(a.degree(), Some(3));
        assert_eq!(Polynomial::zero().degree(), None);
        assert_eq!(a.term_count(), 2);
        assert_eq!(a.evaluate(1), -3);
        assert_eq!(a.evaluate(2), 1 - 32);
    }

    #[test]
    fn display() {
        assert_eq!(Polynomial::zero().to_string(), "0");
        assert_eq!(Polynomial::one().to_string(), "1 q^0");
        assert_eq!(poly(&[(0, 1), (1, 1)]).to_string(), "1 q^0 + 1 q^1");
        assert_eq!(poly(&[(0, -1), (2, -3)]).to_string(), "-1 q^0 - 3 q^2");
    }
}
