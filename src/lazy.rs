//! On-demand Bruhat order for single computations.
//!
//! Building the full matrix costs `(n!)^2` comparisons. When only a handful of
//! polynomials are wanted, [`LazyBruhatOrder`] answers the same queries by calling the
//! pure comparator directly and by walking upward covers from the bottom of each
//! interval, caching covers as they are discovered.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::bruhat::{self, BruhatOrder};
use crate::group::GroupContext;

/// Upward covers discovered so far, keyed by group index.
///
/// Shared between [`LazyBruhatOrder`] values over the same group so that repeated queries
/// reuse earlier exploration.
#[derive(Debug, Default)]
pub struct CoverCache {
    covers: RwLock<HashMap<usize, Arc<[usize]>>>,
}

impl CoverCache {
    /// Number of elements whose covers are cached.
    pub fn len(&self) -> usize {
        self.covers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// `true` before anything has been explored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, z: usize) -> Option<Arc<[usize]>> {
        self.covers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&z)
            .cloned()
    }

    fn insert(&self, z: usize, found: Arc<[usize]>) {
        self.covers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(z, found);
    }
}

/// Bruhat order explored lazily through cover relations.
#[derive(Debug)]
pub struct LazyBruhatOrder<'g> {
    group: &'g GroupContext,
    covers: Arc<CoverCache>,
}

impl<'g> LazyBruhatOrder<'g> {
    /// Creates an order over `group` with a fresh cache.
    pub fn new(group: &'g GroupContext) -> Self {
        Self::with_cache(group, Arc::default())
    }

    /// Creates an order over `group` that reads and extends `covers`. The cache must
    /// belong to the same group.
    pub fn with_cache(group: &'g GroupContext, covers: Arc<CoverCache>) -> Self {
        Self { group, covers }
    }

    /// Number of elements whose covers have been explored so far.
    pub fn explored(&self) -> usize {
        self.covers.len()
    }

    /// Indices covering `z` (one length above it).
    fn covers_of(&self, z: usize) -> Arc<[usize]> {
        if let Some(hit) = self.covers.get(z) {
            return hit;
        }
        let perm = self.group.at(z);
        let found: Arc<[usize]> = perm
            .up_covers()
            .into_iter()
            .filter_map(|(i, j)| self.group.index_of(&perm.swap_positions(i, j)))
            .collect();
        self.covers.insert(z, Arc::clone(&found));
        found
    }
}

impl BruhatOrder for LazyBruhatOrder<'_> {
    fn is_less(&self, u: usize, v: usize) -> bool {
        let order = self.group.order();
        if u >= order || v >= order {
            return false;
        }
        bruhat::is_less(
            self.group.at(u),
            self.group.at(v),
            self.group.len_at(u),
            self.group.len_at(v),
        )
    }

    /// Every element of `[u, v]` lies on a saturated chain from `u`, so a walk over covers
    /// that stays below `v` reaches the whole interval.
    fn interval(&self, u: usize, v: usize) -> Vec<usize> {
        let order = self.group.order();
        if u >= order || v >= order {
            return Vec::new();
        }
        let mut seen: HashSet<usize> = HashSet::from([u, v]);
        if u != v && self.is_less(u, v) {
            let len_v = self.group.len_at(v);
            let mut stack = vec![u];
            while let Some(z) = stack.pop() {
                for &c in self.covers_of(z).iter() {
                    if seen.contains(&c) || self.group.len_at(c) >= len_v {
                        continue;
                    }
                    if self.is_less(c, v) {
                        seen.insert(c);
                        stack.push(c);
                    }
                }
            }
        }
        let mut out: Vec<usize> = seen.into_iter().collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::BruhatMatrix;

    #[test]
    fn agrees_with_matrix_on_s4() {
        let g = GroupContext::new(4).unwrap();
        let m = BruhatMatrix::build_serial(&g);
        let lazy = LazyBruhatOrder::new(&g);
        for u in 0..g.order() {
            for v in 0..g.order() {
                assert_eq!(lazy.is_less(u, v), m.get(u, v));
                assert_eq!(lazy.interval(u, v), m.interval(u, v), "[{u}, {v}]");
            }
        }
    }

    #[test]
    fn explores_only_what_it_needs() {
        let g = GroupContext::new(5).unwrap();
        let lazy = LazyBruhatOrder::new(&g);
        let u = g.index_of(&"12345".parse().unwrap()).unwrap();
        let v = g.index_of(&"21435".parse().unwrap()).unwrap();
        assert_eq!(lazy.interval(u, v).len(), 4);
        assert!(lazy.explored() < g.order());
    }

    #[test]
    fn shared_cache_outlives_the_order() {
        let g = GroupContext::new(4).unwrap();
        let cache = Arc::new(CoverCache::default());
        let top = g.reverse_identity_index();
        let full = LazyBruhatOrder::with_cache(&g, Arc::clone(&cache)).interval(0, top);
        assert_eq!(full.len(), 24);
        let explored = cache.len();
        assert!(explored > 0);

        let again = LazyBruhatOrder::with_cache(&g, Arc::clone(&cache));
        assert_eq!(again.interval(0, top), full);
        assert_eq!(again.explored(), explored);
        assert!(LazyBruhatOrder::new(&g).explored() == 0);
    }

    #[test]
    fn out_of_range_is_not_found() {
        let g = GroupContext::new(3).unwrap();
        let lazy = LazyBruhatOrder::new(&g);
        assert!(!lazy.is_less(0, 6));
        assert!(lazy.interval(7, 0).is_empty());
    }

    #[test]
    fn degenerate_intervals() {
        let g = GroupContext::new(3).unwrap();
        let lazy = LazyBruhatOrder::new(&g);
        assert_eq!(lazy.interval(2, 2), vec![2]);
        // 231 and 312 are incomparable; only the endpoints come back, as with the matrix.
        assert_eq!(lazy.interval(3, 4), vec![3, 4]);
    }
}
