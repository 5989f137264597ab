//! Permutations of `{1..n}` in one-line notation and the elementary operations on them.
//!
//! Positions are 0-based throughout: a descent "at `i`" means `p[i] > p[i + 1]`, and the
//! simple transposition `s_i` swaps positions `i` and `i + 1`.

use std::fmt;
use std::str::FromStr;

use crate::error::KlError;

/// Largest `n` for which `n!` fits in a 64-bit `usize`.
pub const MAX_DEGREE: usize = 20;

// ============================================================================
// Counting helpers
// ============================================================================

/// Returns `n!`, or `None` on overflow.
pub const fn factorial(n: usize) -> Option<usize> {
    let mut acc = 1usize;
    let mut i = 2;
    while i <= n {
        match acc.checked_mul(i) {
            Some(v) => acc = v,
            None => return None,
        }
        i += 1;
    }
    Some(acc)
}

/// Length of the reverse identity in `S_n`, i.e. `n(n-1)/2`.
#[inline]
pub const fn max_length(n: usize) -> u32 {
    (n * n.saturating_sub(1) / 2) as u32
}

/// Counts inversions with a merge sort in `O(n log n)`.
pub fn inversion_count(values: &[u8]) -> u32 {
    let mut work = values.to_vec();
    let mut scratch = vec![0u8; values.len()];
    sort_and_count(&mut work, &mut scratch)
}

/// Counts inversions pair by pair. Reference for [`inversion_count`].
pub fn inversion_count_naive(values: &[u8]) -> u32 {
    let mut count = 0;
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            if values[i] > values[j] {
                count += 1;
            }
        }
    }
    count
}

fn sort_and_count(work: &mut [u8], scratch: &mut [u8]) -> u32 {
    let len = work.len();
    if len < 2 {
        return 0;
    }
    let mid = len / 2;
    let mut count = {
        let (left, right) = work.split_at_mut(mid);
        let (scratch_left, scratch_right) = scratch.split_at_mut(mid);
        sort_and_count(left, scratch_left) + sort_and_count(right, scratch_right)
    };

    // Both halves are sorted; every time the right head wins, it jumps over the whole
    // remainder of the left half.
    let (mut i, mut j, mut k) = (0, mid, 0);
    while i < mid && j < len {
        if work[i] > work[j] {
            scratch[k] = work[j];
            count += (mid - i) as u32;
            j += 1;
        } else {
            scratch[k] = work[i];
            i += 1;
        }
        k += 1;
    }
    while i < mid {
        scratch[k] = work[i];
        i += 1;
        k += 1;
    }
    while j < len {
        scratch[k] = work[j];
        j += 1;
        k += 1;
    }
    work.copy_from_slice(&scratch[..len]);
    count
}

/// Every transposition of `S_n` as a position pair `(i, j)` with `i < j`.
pub fn all_transpositions(n: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push((i, j));
        }
    }
    out
}

/// Advances `values` to its lexicographic successor. Returns `false` (leaving the slice
/// untouched) when it is already the last arrangement.
pub fn next_permutation(values: &mut [u8]) -> bool {
    let n = values.len();
    if n < 2 {
        return false;
    }
    let mut pivot = n - 1;
    while pivot > 0 && values[pivot - 1] >= values[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }
    let mut successor = n - 1;
    while values[successor] <= values[pivot - 1] {
        successor -= 1;
    }
    values.swap(pivot - 1, successor);
    values[pivot..].reverse();
    true
}

// ============================================================================
// Permutation
// ============================================================================

/// A permutation of `{1..n}` in one-line notation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permutation(Vec<u8>);

impl Permutation {
    /// Validates and wraps a one-line sequence.
    ///
    /// # Errors
    /// Returns an error if the sequence is empty, longer than [`MAX_DEGREE`], or is not a
    /// rearrangement of `1..=n`.
    pub fn new(values: Vec<u8>) -> Result<Self, KlError> {
        let n = values.len();
        if n == 0 {
            return Err(KlError::invalid_permutation("empty sequence"));
        }
        if n > MAX_DEGREE {
            return Err(KlError::invalid_permutation(format!(
                "{n} entries; at most {MAX_DEGREE} are supported"
            )));
        }
        let mut seen = 0u32;
        for &v in &values {
            if v == 0 || usize::from(v) > n {
                return Err(KlError::invalid_permutation(format!(
                    "value {v} is outside 1..={n}"
                )));
            }
            let mask = 1u32 << (v - 1);
            if seen & mask != 0 {
                return Err(KlError::invalid_permutation(format!("value {v} repeats")));
            }
            seen |= mask;
        }
        Ok(Self(values))
    }

    /// `1 2 ... n`.
    pub fn identity(n: usize) -> Self {
        Self((1..=n as u8).collect())
    }

    /// `n n-1 ... 1`.
    pub fn reverse_identity(n: usize) -> Self {
        Self((1..=n as u8).rev().collect())
    }

    /// The `n` of the `S_n` this permutation lives in.
    #[inline]
    pub fn degree(&self) -> usize {
        self.0.len()
    }

    /// One-line values.
    #[inline]
    pub fn values(&self) -> &[u8] {
        &self.0
    }

    /// Bruhat length (inversion count).
    pub fn length(&self) -> u32 {
        inversion_count(&self.0)
    }

    /// `true` for `1 2 ... n`.
    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &v)| usize::from(v) == i + 1)
    }

    /// `true` for `n ... 2 1`.
    pub fn is_reverse_identity(&self) -> bool {
        let n = self.0.len();
        self.0.iter().enumerate().all(|(i, &v)| usize::from(v) == n - i)
    }

    /// The inverse permutation.
    pub fn inverse(&self) -> Self {
        let mut out = vec![0u8; self.0.len()];
        for (i, &v) in self.0.iter().enumerate() {
            out[usize::from(v) - 1] = (i + 1) as u8;
        }
        Self(out)
    }

    /// Right multiplication by the transposition of positions `i` and `j`.
    pub fn swap_positions(&self, i: usize, j: usize) -> Self {
        let mut out = self.0.clone();
        out.swap(i, j);
        Self(out)
    }

    /// Left multiplication by the transposition of values `a` and `b`.
    pub fn swap_values(&self, a: u8, b: u8) -> Self {
        let out = self
            .0
            .iter()
            .map(|&v| match v {
                _ if v == a => b,
                _ if v == b => a,
                _ => v,
            })
            .collect();
        Self(out)
    }

    /// `true` iff `p[i] > p[i + 1]`. Out-of-range positions are never descents.
    #[inline]
    pub fn has_descent_at(&self, i: usize) -> bool {
        i + 1 < self.0.len() && self.0[i] > self.0[i + 1]
    }

    /// All right descent positions, ascending.
    pub fn right_descents(&self) -> Vec<usize> {
        (0..self.0.len().saturating_sub(1))
            .filter(|&i| self.has_descent_at(i))
            .collect()
    }

    /// First right descent, or `None` for the identity.
    pub fn first_right_descent(&self) -> Option<usize> {
        (0..self.0.len().saturating_sub(1)).find(|&i| self.has_descent_at(i))
    }

    /// Position pairs `(i, j)` whose swap raises the length by exactly one, i.e. the
    /// upward Bruhat covers of this permutation.
    ///
    /// `(i, j)` qualifies iff `p[i] < p[j]` and no position strictly between them holds a
    /// value in `(p[i], p[j])`.
    pub fn up_covers(&self) -> Vec<(usize, usize)> {
        let p = &self.0;
        let mut out = Vec::new();
        for i in 0..p.len() {
            let mut bound = u8::MAX;
            for j in (i + 1)..p.len() {
                if p[j] > p[i] && p[j] < bound {
                    out.push((i, j));
                    bound = p[j];
                }
            }
        }
        out
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Accepts `"1 3 2"`, `"1,3,2"`, or the compact `"132"` (single digits only).
impl FromStr for Permutation {
    type Err = KlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();

        let values: Result<Vec<u8>, _> = match tokens.as_slice() {
            [compact] if compact.len() > 1 && compact.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(compact.bytes().map(|b| b - b'0').collect())
            }
            _ => tokens.iter().map(|t| t.parse::<u8>()).collect(),
        };
        let values =
            values.map_err(|e| KlError::invalid_permutation(format!("{s:?}: {e}")))?;
        Self::new(values)
    }
}

// ============================================================================
// Enumeration
// ============================================================================

/// Lexicographic iterator over `S_n`, starting at the identity.
#[derive(Clone, Debug)]
pub struct LexPermutations {
    next: Option<Vec<u8>>,
}

impl Iterator for LexPermutations {
    type Item = Permutation;

    fn next(&mut self) -> Option<Permutation> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        if next_permutation(&mut successor) {
            self.next = Some(successor);
        }
        Some(Permutation(current))
    }
}

/// All `n!` permutations in lexicographic order; the position of each is its index.
pub fn enumerate(n: usize) -> LexPermutations {
    LexPermutations {
        next: (n > 0).then(|| (1..=n as u8).collect()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn p(s: &str) -> Permutation {
        s.parse().unwrap()
    }

    // -------------------------------------------------------------------------
    // Enumeration
    // -------------------------------------------------------------------------

    #[test]
    fn enumerate_s3_is_lexicographic() {
        let all: Vec<String> = enumerate(3).map(|p| p.to_string()).collect();
        assert_eq!(
            all,
            ["1 2 3", "1 3 2", "2 1 3", "2 3 1", "3 1 2", "3 2 1"]
        );
    }

    #[test]
    fn enumerate_yields_n_factorial_sorted_items() {
        for n in 1..=6 {
            let all: Vec<Permutation> = enumerate(n).collect();
            assert_eq!(Some(all.len()), factorial(n));
            assert!(all.windows(2).all(|w| w[0] < w[1]));
            assert!(all[0].is_identity());
            assert!(all[all.len() - 1].is_reverse_identity());
        }
    }

    #[test]
    fn enumerate_zero_is_empty() {
        assert_eq!(enumerate(0).count(), 0);
    }

    #[test]
    fn factorial_overflow_is_detected() {
        assert_eq!(factorial(0), Some(1));
        assert_eq!(factorial(5), Some(120));
        assert!(factorial(MAX_DEGREE).is_some());
        assert!(factorial(MAX_DEGREE + 1).is_none());
    }

    // -------------------------------------------------------------------------
    // Inversions
    // -------------------------------------------------------------------------

    #[test]
    fn merge_count_matches_naive_on_all_of_s6() {
        for perm in enumerate(6) {
            assert_eq!(
                inversion_count(perm.values()),
                inversion_count_naive(perm.values()),
                "mismatch on {perm}"
            );
        }
    }

    #[test]
    fn merge_count_matches_naive_on_random_large_permutations() {
        let mut rng = XorShiftRng::seed_from_u64(0x5EED);
        let mut values: Vec<u8> = (1..=MAX_DEGREE as u8).collect();
        for _ in 0..500 {
            values.shuffle(&mut rng);
            assert_eq!(inversion_count(&values), inversion_count_naive(&values));
        }
    }

    proptest! {
        #[test]
        fn merge_count_matches_naive(values in Just((1..=12u8).collect::<Vec<_>>()).prop_shuffle()) {
            prop_assert_eq!(inversion_count(&values), inversion_count_naive(&values));
        }

        #[test]
        fn inverse_is_an_involution(values in Just((1..=9u8).collect::<Vec<_>>()).prop_shuffle()) {
            let perm = Permutation::new(values).unwrap();
            prop_assert_eq!(perm.inverse().inverse(), perm.clone());
            prop_assert_eq!(perm.inverse().length(), perm.length());
        }
    }

    #[test]
    fn extreme_lengths() {
        assert_eq!(Permutation::identity(7).length(), 0);
        assert_eq!(Permutation::reverse_identity(7).length(), max_length(7));
        assert_eq!(max_length(1), 0);
        assert_eq!(max_length(4), 6);
    }

    // -------------------------------------------------------------------------
    // Parsing and validation
    // -------------------------------------------------------------------------

    #[test]
    fn parses_all_notations() {
        assert_eq!(p("1 3 2"), p("1,3,2"));
        assert_eq!(p("132"), p(" 1, 3 ,2 "));
        assert_eq!(p("10 9 8 7 6 5 4 3 2 1").degree(), 10);
    }

    #[test]
    fn rejects_non_permutations() {
        assert!("".parse::<Permutation>().is_err());
        assert!("1 1 2".parse::<Permutation>().is_err());
        assert!("0 1 2".parse::<Permutation>().is_err());
        assert!("1 2 4".parse::<Permutation>().is_err());
        assert!("1 x 2".parse::<Permutation>().is_err());
        assert!(Permutation::new((1..=21).collect()).is_err());
    }

    #[test]
    fn display_round_trips() {
        let perm = p("4 1 3 2");
        assert_eq!(perm.to_string().parse::<Permutation>().unwrap(), perm);
    }

    // -------------------------------------------------------------------------
    // Group operations
    // -------------------------------------------------------------------------

    #[test]
    fn multiplication_by_transpositions() {
        let perm = p("3 1 4 2");
        assert_eq!(perm.swap_positions(0, 1), p("1 3 4 2"));
        assert_eq!(perm.swap_values(1, 2), p("3 2 4 1"));
        assert_eq!(p("2 3 1").inverse(), p("3 1 2"));
    }

    #[test]
    fn descents() {
        let perm = p("3 1 4 2");
        assert_eq!(perm.right_descents(), vec![0, 2]);
        assert_eq!(perm.first_right_descent(), Some(0));
        assert_eq!(p("1 2 4 3").first_right_descent(), Some(2));
        assert_eq!(Permutation::identity(5).first_right_descent(), None);
        assert!(!perm.has_descent_at(3));
    }

    #[test]
    fn up_covers_raise_length_by_one() {
        for perm in enumerate(5) {
            let len = perm.length();
            for (i, j) in perm.up_covers() {
                assert_eq!(perm.swap_positions(i, j).length(), len + 1, "{perm} ({i},{j})");
            }
        }
    }

    #[test]
    fn up_covers_are_complete() {
        // Every transposition that raises length by exactly one must be listed.
        for perm in enumerate(5) {
            let len = perm.length();
            let covers = perm.up_covers();
            for (i, j) in all_transpositions(5) {
                if perm.swap_positions(i, j).length() == len + 1 {
                    assert!(covers.contains(&(i, j)), "{perm} missing ({i},{j})");
                }
            }
        }
        assert!(Permutation::reverse_identity(4).up_covers().is_empty());
    }

    #[test]
    fn transposition_list_has_all_pairs() {
        assert_eq!(all_transpositions(4).len(), 6);
        assert!(all_transpositions(1).is_empty());
    }
}
