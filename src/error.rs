//! Crate-wide error type.

use thiserror::Error;

use crate::database::DatabaseParseError;
use crate::matrix::MatrixParseError;

/// Errors produced by the K-L toolkit.
#[derive(Debug, Error)]
pub enum KlError {
    /// S_0 has nothing to enumerate.
    #[error("group order must be at least 1")]
    EmptyGroup,

    /// `n!` does not fit in a `usize`.
    #[error("S_{n} is too large: n! overflows (supported n <= {max})")]
    GroupTooLarge {
        /// Requested group.
        n: usize,
        /// Largest supported group.
        max: usize,
    },

    /// The input is not a permutation of `{1..n}`.
    #[error("invalid permutation: {reason}")]
    InvalidPermutation {
        /// What is wrong with it.
        reason: String,
    },

    /// A permutation was handed to a group of a different size.
    #[error("permutation belongs to S_{actual}, but the active group is S_{expected}")]
    GroupMismatch {
        /// Order of the active group.
        expected: usize,
        /// Length of the offending permutation.
        actual: usize,
    },

    /// A loaded matrix does not cover the active group.
    #[error("bruhat matrix has order {actual}, expected {expected} (= n!)")]
    MatrixOrderMismatch {
        /// `n!` of the active group.
        expected: usize,
        /// Rows found in the matrix.
        actual: usize,
    },

    /// Malformed matrix file.
    #[error("bruhat matrix: {0}")]
    MatrixParse(#[from] MatrixParseError),

    /// Malformed database file.
    #[error("K-L database: {0}")]
    DatabaseParse(#[from] DatabaseParseError),

    /// The worker pool could not be started.
    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KlError {
    /// Create an InvalidPermutation error.
    pub fn invalid_permutation(reason: impl Into<String>) -> Self {
        Self::InvalidPermutation {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_groups_involved() {
        let err = KlError::GroupMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "permutation belongs to S_3, but the active group is S_4"
        );

        let err = KlError::GroupTooLarge { n: 25, max: 20 };
        assert!(err.to_string().contains("S_25"));
    }

    #[test]
    fn parse_errors_convert_into_kl_error() {
        let err: KlError = MatrixParseError::Empty.into();
        assert!(matches!(err, KlError::MatrixParse(MatrixParseError::Empty)));
    }
}
