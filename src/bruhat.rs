//! Bruhat order on `S_n`.
//!
//! [`is_less`] is the pure pairwise comparator (prefix-domination / tableau criterion).
//! [`BruhatOrder`] is the index-level oracle the K-L engine consumes; it is implemented by
//! the precomputed [`BruhatMatrix`](crate::matrix::BruhatMatrix) and by the on-demand
//! [`LazyBruhatOrder`](crate::lazy::LazyBruhatOrder).

use crate::permutation::{max_length, Permutation, MAX_DEGREE};

/// Index-level Bruhat order queries over one [`GroupContext`](crate::group::GroupContext).
///
/// Indices outside the group are never related and have empty intervals.
pub trait BruhatOrder {
    /// Strict order: `u < v`.
    fn is_less(&self, u: usize, v: usize) -> bool;

    /// All `z` with `u <= z <= v`, sorted ascending. Always contains `u` and `v` when both
    /// are in range.
    fn interval(&self, u: usize, v: usize) -> Vec<usize>;

    /// `u <= v`.
    #[inline]
    fn is_less_or_equal(&self, u: usize, v: usize) -> bool {
        u == v || self.is_less(u, v)
    }
}

impl<T: BruhatOrder + ?Sized> BruhatOrder for &T {
    #[inline]
    fn is_less(&self, u: usize, v: usize) -> bool {
        (**self).is_less(u, v)
    }

    fn interval(&self, u: usize, v: usize) -> Vec<usize> {
        (**self).interval(u, v)
    }
}

/// Inserts `value` into the sorted prefix `buf[..len]`.
#[inline(always)]
fn insert_sorted(buf: &mut [u8; MAX_DEGREE], len: usize, value: u8) {
    let mut k = len;
    while k > 0 && buf[k - 1] > value {
        buf[k] = buf[k - 1];
        k -= 1;
    }
    buf[k] = value;
}

/// Decides `u < v` in Bruhat order given both lengths.
///
/// For every prefix length `k`, the sorted values of `u[..k]` must be dominated entry by
/// entry by the sorted values of `v[..k]`. A prefix whose newest entries satisfy
/// `v[k-1] >= u[k-1]` cannot break domination, so only the other prefixes are scanned.
///
/// Permutations of different degree are never related.
pub fn is_less(u: &Permutation, v: &Permutation, len_u: u32, len_v: u32) -> bool {
    let (u, v) = (u.values(), v.values());
    let n = v.len();
    if u.len() != n || u == v {
        return false;
    }
    if v[0] < u[0] {
        return false;
    }
    let top = max_length(n);
    if len_u == 0 || len_v == top {
        return true;
    }
    if len_u == top || len_v == 0 || len_u >= len_v {
        return false;
    }

    let mut seen_u = [0u8; MAX_DEGREE];
    let mut seen_v = [0u8; MAX_DEGREE];
    for k in 0..n {
        insert_sorted(&mut seen_u, k, u[k]);
        insert_sorted(&mut seen_v, k, v[k]);
        if v[k] >= u[k] {
            continue;
        }
        if seen_u[..=k].iter().zip(&seen_v[..=k]).any(|(a, b)| a > b) {
            return false;
        }
    }
    true
}

/// [`is_less`] with lengths computed on the spot.
pub fn compare(u: &Permutation, v: &Permutation) -> bool {
    is_less(u, v, u.length(), v.length())
}
