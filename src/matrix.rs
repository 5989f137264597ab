//! Precomputed Bruhat comparability matrix for a whole group.
//!
//! Representation:
//! - one `u64` bitset row per permutation index, `words_per_row = ceil(n! / 64)` words;
//! - bit `j` of row `i` is set iff `p_i < p_j` (strict), so the diagonal is always clear.
//!
//! Construction applies [`crate::bruhat::is_less`] to all `n!²` pairs and is the dominant
//! cost of a session. Rows are split into contiguous blocks, one per worker, and every
//! worker writes only its own block.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bruhat::{self, BruhatOrder};
use crate::config::default_workers;
use crate::error::KlError;
use crate::group::GroupContext;

/// Groups above this size get a memory warning before the matrix is built.
const LARGE_GROUP: usize = 8;

#[inline(always)]
const fn bit(j: usize) -> u64 {
    1u64 << (j % 64)
}

// ============================================================================
// BruhatMatrix
// ============================================================================

/// Dense bitset matrix of the strict Bruhat order of one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BruhatMatrix {
    order: usize,
    words_per_row: usize,
    rows: Vec<u64>,
}

impl BruhatMatrix {
    fn zeroed(order: usize) -> Self {
        let words_per_row = order.div_ceil(64).max(1);
        Self {
            order,
            words_per_row,
            rows: vec![0u64; order * words_per_row],
        }
    }

    /// Builds the matrix on a pool of `workers` threads (`0` = one per hardware thread).
    ///
    /// # Errors
    /// Returns an error if the worker pool cannot be started.
    pub fn build(group: &GroupContext, workers: usize) -> Result<Self, KlError> {
        let workers = if workers == 0 { default_workers() } else { workers };
        let mut matrix = Self::zeroed(group.order());
        if group.n() > LARGE_GROUP {
            warn!(
                n = group.n(),
                bytes = matrix.rows.len() * 8,
                "bruhat matrix grows as (n!)^2; this group is past the practical ceiling"
            );
        }
        info!(n = group.n(), order = matrix.order, workers, "building bruhat matrix");

        let wpr = matrix.words_per_row;
        let rows_per_block = matrix.order.div_ceil(workers).max(1);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        pool.install(|| {
            matrix
                .rows
                .par_chunks_mut(rows_per_block * wpr)
                .enumerate()
                .for_each(|(block, words)| {
                    let first = block * rows_per_block;
                    for (offset, row) in words.chunks_mut(wpr).enumerate() {
                        fill_row(group, first + offset, row);
                    }
                    debug!(block, first, rows = words.len() / wpr, "row block done");
                });
        });
        Ok(matrix)
    }

    /// Single-threaded construction.
    pub fn build_serial(group: &GroupContext) -> Self {
        let mut matrix = Self::zeroed(group.order());
        let wpr = matrix.words_per_row;
        for (i, row) in matrix.rows.chunks_mut(wpr).enumerate() {
            fill_row(group, i, row);
        }
        matrix
    }

    /// Number of rows (= columns) = `n!`.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline(always)]
    fn row(&self, i: usize) -> &[u64] {
        &self.rows[i * self.words_per_row..(i + 1) * self.words_per_row]
    }

    /// `B[i][j]`; `false` for out-of-range indices.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        if i >= self.order || j >= self.order {
            return false;
        }
        self.rows[i * self.words_per_row + j / 64] & bit(j) != 0
    }

    /// Indices strictly above `u`, ascending.
    pub fn above(&self, u: usize) -> Vec<usize> {
        if u >= self.order {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (w, &word) in self.row(u).iter().enumerate() {
            let mut t = word;
            while t != 0 {
                let j = t.trailing_zeros() as usize;
                t &= t - 1;
                out.push(w * 64 + j);
            }
        }
        out
    }

    /// Indices strictly below `v`, ascending (a column scan).
    pub fn below(&self, v: usize) -> Vec<usize> {
        if v >= self.order {
            return Vec::new();
        }
        (0..self.order).filter(|&i| self.get(i, v)).collect()
    }

    /// Total number of strictly comparable pairs.
    pub fn count_ones(&self) -> usize {
        self.rows.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// All `z` with `u <= z <= v`, including both endpoints, sorted.
    ///
    /// Row `u` supplies the candidates above `u`; each is kept if it lies below `v`.
    pub fn interval(&self, u: usize, v: usize) -> Vec<usize> {
        if u >= self.order || v >= self.order {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .above(u)
            .into_iter()
            .filter(|&z| self.get(z, v))
            .collect();
        out.push(u);
        out.push(v);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Saves the matrix as `n!` lines of `n!` `0/1` characters.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, filename: impl AsRef<Path>) -> io::Result<()> {
        let f = File::create(filename)?;
        self.write_to(BufWriter::new(f))
    }

    /// Writes the matrix to a writer as `0/1` rows.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        let mut line = Vec::with_capacity(self.order + 1);
        for i in 0..self.order {
            line.clear();
            line.extend((0..self.order).map(|j| if self.get(i, j) { b'1' } else { b'0' }));
            line.push(b'\n');
            w.write_all(&line)?;
        }
        w.flush()
    }

    /// Loads a matrix for a group of `expected_order` elements.
    ///
    /// Returns `Ok(None)` if the file does not exist, so the caller can rebuild.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is malformed, or covers a different
    /// group.
    pub fn load_from_file(
        filename: impl AsRef<Path>,
        expected_order: usize,
    ) -> Result<Option<Self>, KlError> {
        let text = match fs::read_to_string(filename) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let matrix = parse_matrix(&text)?;
        if matrix.order != expected_order {
            return Err(KlError::MatrixOrderMismatch {
                expected: expected_order,
                actual: matrix.order,
            });
        }
        Ok(Some(matrix))
    }
}

impl BruhatOrder for BruhatMatrix {
    #[inline]
    fn is_less(&self, u: usize, v: usize) -> bool {
        self.get(u, v)
    }

    fn interval(&self, u: usize, v: usize) -> Vec<usize> {
        BruhatMatrix::interval(self, u, v)
    }
}

/// Computes row `i` of the matrix into `row`.
fn fill_row(group: &GroupContext, i: usize, row: &mut [u64]) {
    let u = group.at(i);
    let len_u = group.len_at(i);
    for (j, v) in group.permutations().iter().enumerate() {
        if bruhat::is_less(u, v, len_u, group.len_at(j)) {
            row[j / 64] |= bit(j);
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Errors encountered while parsing a `0/1` matrix file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatrixParseError {
    /// No non-empty rows were found.
    #[error("matrix is empty")]
    Empty,

    /// A row has the wrong number of columns.
    #[error("matrix is not square: row {row} has length {got}, expected {expected}")]
    NonSquare {
        /// Row index.
        row: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Encountered a non `0/1` character.
    #[error("invalid character at ({row}, {col}): {ch:?} (expected '0' or '1')")]
    InvalidChar {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The invalid character.
        ch: char,
    },
}

/// Parses a square `0/1` matrix. Blank lines and trailing whitespace are ignored; the
/// contents are otherwise trusted.
///
/// # Errors
/// Returns an error if the input is empty, non-square, or contains other characters.
pub fn parse_matrix(text: &str) -> Result<BruhatMatrix, MatrixParseError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(MatrixParseError::Empty);
    }

    let mut matrix = BruhatMatrix::zeroed(lines.len());
    let (n, wpr) = (matrix.order, matrix.words_per_row);
    for (i, line) in lines.iter().enumerate() {
        let bytes = line.as_bytes();
        if bytes.len() != n {
            return Err(MatrixParseError::NonSquare {
                row: i,
                expected: n,
                got: bytes.len(),
            });
        }
        let row = &mut matrix.rows[i * wpr..(i + 1) * wpr];
        for (j, &b) in bytes.iter().enumerate() {
            match b {
                b'0' => {}
                b'1' => row[j / 64] |= bit(j),
                _ => {
                    return Err(MatrixParseError::InvalidChar {
                        row: i,
                        col: j,
                        ch: b as char,
                    })
                }
            }
        }
    }
    Ok(matrix)
}

// ============================================================================
// Tests
// ============================================================================
