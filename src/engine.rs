//! Kazhdan–Lusztig polynomials by the standard descent recursion.
//!
//! For `u < v` pick the first right descent `i` of `v`, write `s = s_i`, and let
//! `c = 1` if `u` also descends at `i`:
//!
//! ```text
//! P(u, v) = q^(1-c) P(us, vs) + q^c P(u, vs)
//!           - sum_{z in [u, v], z descends at i} mu(z, vs) q^((l(v) - l(z)) / 2) P(u, z)
//! ```
//!
//! `mu(a, b)` is the coefficient of `q^((l(b) - l(a) - 1) / 2)` in `P(a, b)` when `a < b`
//! and the length difference is odd, otherwise `0`.
//!
//! The engine is generic over [`BruhatOrder`], so the same recursion runs on the
//! precomputed matrix or on the lazy cover walk.

use rayon::prelude::*;
use tracing::debug;

use crate::bruhat::BruhatOrder;
use crate::database::KlDatabase;
use crate::error::KlError;
use crate::group::GroupContext;
use crate::permutation::Permutation;
use crate::polynomial::Polynomial;

/// Recursion state: a group, an order oracle over it, and the memo table.
#[derive(Debug)]
pub struct KlEngine<'a, O> {
    group: &'a GroupContext,
    order: O,
    db: &'a KlDatabase,
}

impl<'a, O: BruhatOrder> KlEngine<'a, O> {
    /// Creates an engine; `order` must describe `group`.
    pub fn new(group: &'a GroupContext, order: O, db: &'a KlDatabase) -> Self {
        Self { group, order, db }
    }

    /// The order oracle.
    pub fn order(&self) -> &O {
        &self.order
    }

    /// `P(u, v)` for permutations of the active group.
    ///
    /// # Errors
    /// Returns [`KlError::GroupMismatch`] if either permutation has the wrong degree.
    pub fn compute(&self, u: &Permutation, v: &Permutation) -> Result<Polynomial, KlError> {
        let u = self.group.resolve(u)?;
        let v = self.group.resolve(v)?;
        Ok(self.compute_indices(u, v))
    }

    /// `P(u, v)` by index. Out-of-range indices give `0`.
    pub fn compute_indices(&self, u: usize, v: usize) -> Polynomial {
        let order = self.group.order();
        if u >= order || v >= order {
            return Polynomial::zero();
        }
        if u == v {
            return Polynomial::one();
        }
        if !self.order.is_less(u, v) {
            return Polynomial::zero();
        }
        if v == self.group.reverse_identity_index() {
            return Polynomial::one();
        }
        if let Some(hit) = self.db.lookup(u, v) {
            return hit;
        }

        let result = self.recurse(u, v);
        self.db.record(u, v, result.clone());
        result
    }

    fn recurse(&self, u: usize, v: usize) -> Polynomial {
        // `v > u` rules out the identity, so a descent exists.
        let Some(i) = self.group.at(v).first_right_descent() else {
            return Polynomial::one();
        };
        let us = self.group.right_multiply(u, i);
        let vs = self.group.right_multiply(v, i);
        let (a, b) = if self.group.at(u).has_descent_at(i) {
            (0, 1)
        } else {
            (1, 0)
        };

        let mut result = self.compute_indices(us, vs).shift(a);
        result += &self.compute_indices(u, vs).shift(b);

        let len_v = self.group.len_at(v);
        for z in self.order.interval(u, v) {
            if !self.group.at(z).has_descent_at(i) {
                continue;
            }
            let weight = self.mu(z, vs);
            if weight == 0 {
                continue;
            }
            // mu != 0 forces l(vs) - l(z) odd, so l(v) - l(z) is even.
            let shift = (len_v - self.group.len_at(z)) / 2;
            result -= &self.compute_indices(u, z).shift(shift).scale(weight);
        }
        result
    }

    /// `mu(a, b)` by index.
    pub fn mu(&self, a: usize, b: usize) -> i64 {
        if !self.order.is_less(a, b) {
            return 0;
        }
        let diff = self.group.len_at(b) - self.group.len_at(a);
        if diff % 2 == 0 {
            return 0;
        }
        self.compute_indices(a, b).coefficient((diff - 1) / 2)
    }

    /// Computes every pair on the current rayon pool, sharing the memo table.
    pub fn compute_batch(&self, pairs: &[(usize, usize)]) -> Vec<Polynomial>
    where
        O: Sync,
    {
        let out: Vec<Polynomial> = pairs
            .par_iter()
            .map(|&(u, v)| self.compute_indices(u, v))
            .collect();
        debug!(
            pairs = pairs.len(),
            confirmed = self.db.confirmed_len(),
            pending = self.db.pending_len(),
            "batch finished"
        );
        out
    }
}
