//! The active symmetric group: every permutation of `S_n`, its index and its length.
//!
//! A [`GroupContext`] is built once per `n` and passed by reference to everything that
//! needs to translate between permutations and indices. Indices are lexicographic ranks,
//! so index `0` is the identity and index `n! - 1` the reverse identity.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::KlError;
use crate::permutation::{enumerate, factorial, max_length, Permutation, MAX_DEGREE};

/// Length and index of one permutation inside its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PermutationRecord {
    /// Inversion count.
    pub length: u32,
    /// Lexicographic rank.
    pub index: usize,
}

/// Builds the permutation → `{length, index}` table for an enumerated list.
pub fn build_index_table(permutations: &[Permutation]) -> HashMap<Permutation, PermutationRecord> {
    permutations
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let record = PermutationRecord {
                length: p.length(),
                index,
            };
            (p.clone(), record)
        })
        .collect()
}

/// Everything derived from the choice of `n`.
#[derive(Clone, Debug)]
pub struct GroupContext {
    n: usize,
    permutations: Vec<Permutation>,
    lengths: Vec<u32>,
    records: HashMap<Permutation, PermutationRecord>,
    /// `reflections[idx * (n - 1) + i]` is the index of `permutations[idx] * s_i`.
    reflections: Vec<usize>,
}

impl GroupContext {
    /// Enumerates `S_n` and precomputes lengths and simple-reflection neighbours.
    ///
    /// # Errors
    /// Returns an error for `n == 0` or when `n!` would overflow.
    pub fn new(n: usize) -> Result<Self, KlError> {
        if n == 0 {
            return Err(KlError::EmptyGroup);
        }
        let order = match factorial(n) {
            Some(order) if n <= MAX_DEGREE => order,
            _ => {
                return Err(KlError::GroupTooLarge {
                    n,
                    max: MAX_DEGREE,
                })
            }
        };
        info!(n, order, "enumerating symmetric group");

        let permutations: Vec<Permutation> = enumerate(n).collect();
        debug_assert_eq!(permutations.len(), order);
        let records = build_index_table(&permutations);
        let lengths = permutations.iter().map(|p| records[p].length).collect();

        let mut reflections = Vec::with_capacity(order * (n - 1));
        for p in &permutations {
            for i in 0..n - 1 {
                reflections.push(records[&p.swap_positions(i, i + 1)].index);
            }
        }
        debug!(n, "simple reflection table ready");

        Ok(Self {
            n,
            permutations,
            lengths,
            records,
            reflections,
        })
    }

    /// The `n` of `S_n`.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// `n!`.
    #[inline]
    pub fn order(&self) -> usize {
        self.permutations.len()
    }

    /// Length of the reverse identity.
    #[inline]
    pub fn max_length(&self) -> u32 {
        max_length(self.n)
    }

    /// Index of the identity.
    #[inline]
    pub fn identity_index(&self) -> usize {
        0
    }

    /// Index of the reverse identity.
    #[inline]
    pub fn reverse_identity_index(&self) -> usize {
        self.order() - 1
    }

    /// All permutations in index order.
    pub fn permutations(&self) -> &[Permutation] {
        &self.permutations
    }

    /// All lengths in index order.
    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    /// Permutation at `index`, if in range.
    pub fn permutation(&self, index: usize) -> Option<&Permutation> {
        self.permutations.get(index)
    }

    /// Length of the permutation at `index`, if in range.
    pub fn length(&self, index: usize) -> Option<u32> {
        self.lengths.get(index).copied()
    }

    /// Record for `p`, or `None` if it is not in this group.
    pub fn record(&self, p: &Permutation) -> Option<PermutationRecord> {
        self.records.get(p).copied()
    }

    /// Index of `p`, or `None` if it is not in this group.
    pub fn index_of(&self, p: &Permutation) -> Option<usize> {
        self.records.get(p).map(|r| r.index)
    }

    /// Index of `permutation(index) * s_i`, i.e. the permutation with positions `i` and
    /// `i + 1` swapped.
    #[inline]
    pub fn right_multiply(&self, index: usize, i: usize) -> usize {
        debug_assert!(i + 1 < self.n);
        self.reflections[index * (self.n - 1) + i]
    }

    /// Resolves a caller-supplied permutation to its index, rejecting other groups.
    ///
    /// # Errors
    /// Returns [`KlError::GroupMismatch`] if `p` has the wrong degree.
    pub fn resolve(&self, p: &Permutation) -> Result<usize, KlError> {
        if p.degree() != self.n {
            return Err(KlError::GroupMismatch {
                expected: self.n,
                actual: p.degree(),
            });
        }
        // A validated permutation of the right degree is always enumerated.
        self.index_of(p).ok_or_else(|| {
            KlError::invalid_permutation(format!("{p} is not an element of S_{}", self.n))
        })
    }

    /// Indices ordered by `(length, lexicographic)`.
    pub fn sorted_by_length(&self) -> Vec<usize> {
        let mut out: Vec<usize> = (0..self.order()).collect();
        // Index order is already lexicographic, so a stable sort keeps ties in that order.
        out.sort_by_key(|&i| self.lengths[i]);
        out
    }

    /// Shorthand for `self.permutations[index]` on indices known to be valid.
    #[inline]
    pub(crate) fn at(&self, index: usize) -> &Permutation {
        &self.permutations[index]
    }

    /// Shorthand for `self.lengths[index]` on indices known to be valid.
    #[inline]
    pub(crate) fn len_at(&self, index: usize) -> u32 {
        self.lengths[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Permutation {
        s.parse().unwrap()
    }

    #[test]
    fn s3_indices_and_lengths() {
        let g = GroupContext::new(3).unwrap();
        assert_eq!(g.order(), 6);
        assert_eq!(g.lengths(), &[0, 1, 1, 2, 2, 3]);
        assert_eq!(g.index_of(&p("231")), Some(3));
        assert_eq!(
            g.record(&p("321")),
            Some(PermutationRecord {
                length: 3,
                index: 5
            })
        );
        assert!(g.permutation(g.identity_index()).unwrap().is_identity());
        assert!(g
            .permutation(g.reverse_identity_index())
            .unwrap()
            .is_reverse_identity());
    }

    #[test]
    fn records_match_enumeration_order() {
        let g = GroupContext::new(5).unwrap();
        for (i, perm) in g.permutations().iter().enumerate() {
            let rec = g.record(perm).unwrap();
            assert_eq!(rec.index, i);
            assert_eq!(rec.length, perm.length());
        }
    }

    #[test]
    fn right_multiply_matches_swap() {
        let g = GroupContext::new(4).unwrap();
        for idx in 0..g.order() {
            for i in 0..3 {
                let expected = g.index_of(&g.at(idx).swap_positions(i, i + 1)).unwrap();
                assert_eq!(g.right_multiply(idx, i), expected);
            }
        }
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let g = GroupContext::new(3).unwrap();
        assert!(g.permutation(6).is_none());
        assert!(g.length(100).is_none());
        assert!(g.index_of(&p("1234")).is_none());
    }

    #[test]
    fn resolve_rejects_other_groups() {
        let g = GroupContext::new(4).unwrap();
        assert_eq!(g.resolve(&p("2143")).unwrap(), g.index_of(&p("2143")).unwrap());
        assert!(matches!(
            g.resolve(&p("213")),
            Err(KlError::GroupMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn invalid_group_sizes() {
        assert!(matches!(GroupContext::new(0), Err(KlError::EmptyGroup)));
        assert!(matches!(
            GroupContext::new(21),
            Err(KlError::GroupTooLarge { n: 21, .. })
        ));
    }

    #[test]
    fn sorted_by_length_is_graded_then_lexicographic() {
        let g = GroupContext::new(4).unwrap();
        let order = g.sorted_by_length();
        assert_eq!(order.len(), 24);
        for w in order.windows(2) {
            let (a, b) = (w[0], w[1]);
            assert!(g.len_at(a) < g.len_at(b) || (g.len_at(a) == g.len_at(b) && a < b));
        }
    }

    #[test]
    fn s1_is_trivial() {
        let g = GroupContext::new(1).unwrap();
        assert_eq!(g.order(), 1);
        assert_eq!(g.max_length(), 0);
        assert!(g.sorted_by_length() == vec![0]);
    }
}
