//! # Bruhat order and Kazhdan–Lusztig polynomials on `S_n`
//!
//! This crate provides:
//! - Permutation utilities: validated one-line permutations, lengths by merge-sort
//!   inversion counting, lexicographic enumeration, descents and Bruhat covers.
//! - A fast pairwise Bruhat comparator and a **parallel** precomputed comparability
//!   matrix stored as `u64` bitset rows.
//! - Kazhdan–Lusztig polynomials by the descent recursion, memoized in a persistent
//!   database, running either on the matrix or on a lazily explored order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bruhat_kl::config::KlConfig;
//! use bruhat_kl::permutation::Permutation;
//! use bruhat_kl::session::KlSession;
//!
//! let mut session = KlSession::open(KlConfig::default(), 4)?;
//! let u: Permutation = "1324".parse()?;
//! let v: Permutation = "3412".parse()?;
//! println!("{}", session.polynomial(&u, &v)?);
//! session.flush()?;
//! # Ok::<(), bruhat_kl::error::KlError>(())
//! ```
//!
//! ## Working with the Order Directly
//!
//! ```
//! use bruhat_kl::bruhat::BruhatOrder;
//! use bruhat_kl::group::GroupContext;
//! use bruhat_kl::matrix::BruhatMatrix;
//!
//! let group = GroupContext::new(3).unwrap();
//! let matrix = BruhatMatrix::build_serial(&group);
//!
//! // Identity below everything else, reverse identity above.
//! assert!(matrix.is_less(group.identity_index(), group.reverse_identity_index()));
//! assert_eq!(matrix.interval(0, 5).len(), 6);
//! ```
//!
//! ## Validating Known Results
//!
//! ```
//! use bruhat_kl::validate::validate_known_results;
//!
//! validate_known_results().expect("comparator and polynomials should check out");
//! ```
//!
//! ## Modules
//!
//! - [`permutation`]: One-line permutations, lengths, enumeration, covers.
//! - [`group`]: The enumerated group with index and length tables.
//! - [`bruhat`]: Pairwise comparator and the [`bruhat::BruhatOrder`] oracle trait.
//! - [`matrix`]: Parallel bitset comparability matrix and its file format.
//! - [`lazy`]: On-demand order through cover relations.
//! - [`polynomial`]: Sparse integer polynomials.
//! - [`engine`]: The K-L recursion.
//! - [`database`]: Memo table and its file format.
//! - [`session`]: Load-or-build orchestration for one `n`.
//! - [`validate`]: Deterministic self-checks.
//!
//! ## Performance Notes
//!
//! - The matrix holds `(n!)^2` bits; `n = 8` needs about 200 MB and larger groups are
//!   out of reach. Use the standalone session beyond that.
//! - Comparisons use stack buffers only, so matrix rows are built without allocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::inline_always)]
#![allow(clippy::many_single_char_names)] // Mathematical variable names
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::multiple_crate_versions)]

pub mod bruhat;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod group;
pub mod lazy;
pub mod matrix;
pub mod permutation;
pub mod polynomial;
pub mod session;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bruhat::{compare, is_less, BruhatOrder};
    pub use crate::config::KlConfig;
    pub use crate::database::KlDatabase;
    pub use crate::engine::KlEngine;
    pub use crate::error::KlError;
    pub use crate::group::GroupContext;
    pub use crate::lazy::LazyBruhatOrder;
    pub use crate::matrix::BruhatMatrix;
    pub use crate::permutation::Permutation;
    pub use crate::polynomial::Polynomial;
    pub use crate::session::KlSession;
    pub use crate::validate::validate_known_results;
}
