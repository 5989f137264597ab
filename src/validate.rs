//! Fast deterministic self-checks against independent reference results.

use crate::bruhat::BruhatOrder;
use crate::database::KlDatabase;
use crate::engine::KlEngine;
use crate::group::GroupContext;
use crate::matrix::BruhatMatrix;
use crate::permutation::{inversion_count_naive, Permutation};
use crate::polynomial::Polynomial;

/// Known K-L polynomials of `S_4` other than `1`, as `(u, v, coefficients)`.
const S4_NONTRIVIAL: [(&str, &str, &[i64]); 6] = [
    ("1234", "3412", &[1, 1]),
    ("1324", "3412", &[1, 1]),
    ("1234", "4231", &[1, 1]),
    ("2134", "4231", &[1, 1]),
    ("1243", "4231", &[1, 1]),
    ("2143", "4231", &[1, 1]),
];

// ============================================================================
// Public API
// ============================================================================

/// Runs every bundled check: the comparator and matrix on `S_3` and `S_4`, then the
/// known polynomials.
///
/// # Errors
/// Returns a message describing the first failed check.
pub fn validate_known_results() -> Result<(), String> {
    validate_group(3)?;
    validate_group(4)?;
    validate_known_polynomials()?;
    Ok(())
}

/// `u < v` by the rank-matrix criterion: for every prefix `u[..k]` and threshold `t`,
/// `u` has no more entries `>= t` than `v` does. Shares no code with the fast comparator.
pub fn brute_force_is_less(u: &Permutation, v: &Permutation) -> bool {
    let (u, v) = (u.values(), v.values());
    if u.len() != v.len() || u == v {
        return false;
    }
    let n = u.len();
    for k in 1..=n {
        for t in 1..=n as u8 {
            let count_u = u[..k].iter().filter(|&&x| x >= t).count();
            let count_v = v[..k].iter().filter(|&&x| x >= t).count();
            if count_u > count_v {
                return false;
            }
        }
    }
    true
}

/// Checks the matrix of `S_n` against [`brute_force_is_less`], the diagonal, lengths
/// and intervals.
///
/// # Errors
/// Returns a message describing the first mismatch.
pub fn validate_group(n: usize) -> Result<(), String> {
    let group = GroupContext::new(n).map_err(|e| e.to_string())?;
    let matrix = BruhatMatrix::build(&group, 0).map_err(|e| e.to_string())?;
    let perms = group.permutations();

    for (i, u) in perms.iter().enumerate() {
        if group.len_at(i) != inversion_count_naive(u.values()) {
            return Err(format!("S_{n}: length of {u} disagrees with the naive count"));
        }
        if matrix.get(i, i) {
            return Err(format!("S_{n}: diagonal entry set for {u}"));
        }
        for (j, v) in perms.iter().enumerate() {
            if matrix.get(i, j) != brute_force_is_less(u, v) {
                return Err(format!("S_{n}: matrix and rank criterion disagree on {u} < {v}"));
            }
        }
    }

    for u in 0..group.order() {
        for v in matrix.above(u) {
            let interval = matrix.interval(u, v);
            let interior_ok = interval
                .iter()
                .all(|&z| z == u || z == v || (matrix.get(u, z) && matrix.get(z, v)));
            if !interval.contains(&u) || !interval.contains(&v) || !interior_ok {
                return Err(format!(
                    "S_{n}: interval [{}, {}] is inconsistent",
                    perms[u], perms[v]
                ));
            }
        }
    }
    Ok(())
}

/// Checks `S_3` values and every K-L polynomial of `S_4` against the known table.
///
/// # Errors
/// Returns a message naming the first wrong polynomial.
pub fn validate_known_polynomials() -> Result<(), String> {
    let s3 = GroupContext::new(3).map_err(|e| e.to_string())?;
    let m3 = BruhatMatrix::build_serial(&s3);
    let db3 = KlDatabase::new();
    let engine = KlEngine::new(&s3, &m3, &db3);
    for (u, v) in [("123", "123"), ("123", "321"), ("132", "231")] {
        expect_polynomial(&engine, u, v, &Polynomial::one())?;
    }

    let s4 = GroupContext::new(4).map_err(|e| e.to_string())?;
    let m4 = BruhatMatrix::build_serial(&s4);
    let db4 = KlDatabase::new();
    let engine = KlEngine::new(&s4, &m4, &db4);
    for (u, v, coefficients) in S4_NONTRIVIAL {
        let expected = Polynomial::from_terms((0u32..).zip(coefficients.iter().copied()));
        expect_polynomial(&engine, u, v, &expected)?;
    }

    let mut nontrivial = 0;
    for u in 0..s4.order() {
        for v in 0..s4.order() {
            let poly = engine.compute_indices(u, v);
            if !m4.is_less_or_equal(u, v) {
                if !poly.is_zero() {
                    return Err(format!("S_4: P({u}, {v}) = {poly} for incomparable indices"));
                }
            } else if poly != Polynomial::one() {
                nontrivial += 1;
            }
        }
    }
    if nontrivial != S4_NONTRIVIAL.len() {
        return Err(format!(
            "S_4: found {nontrivial} polynomials other than 1, expected {}",
            S4_NONTRIVIAL.len()
        ));
    }
    Ok(())
}

// ============================================================================
// Internal
// ============================================================================

fn expect_polynomial<O: BruhatOrder>(
    engine: &KlEngine<'_, O>,
    u: &str,
    v: &str,
    expected: &Polynomial,
) -> Result<(), String> {
    let pu: Permutation = u.parse().map_err(|e| format!("{u}: {e}"))?;
    let pv: Permutation = v.parse().map_err(|e| format!("{v}: {e}"))?;
    let got = engine.compute(&pu, &pv).map_err(|e| e.to_string())?;
    if &got != expected {
        return Err(format!("P({u}, {v}) = {got}, expected {expected}"));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
