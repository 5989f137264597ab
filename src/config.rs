//! Session configuration: where persisted files live and how many workers to use.

use std::path::PathBuf;

/// Worker count used when none is configured: one per hardware thread.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
}

/// Configuration for a [`KlSession`](crate::session::KlSession).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KlConfig {
    /// Directory holding the matrix and database files.
    pub data_dir: PathBuf,
    /// Matrix file name prefix; the file is `<prefix><n>.txt`.
    pub matrix_prefix: String,
    /// Database file name prefix; the file is `<prefix><n>.txt`.
    pub database_prefix: String,
    /// Threads used to build the matrix and to run batch computations.
    pub workers: usize,
    /// Save a freshly built matrix so later sessions can reload it.
    pub persist_matrix: bool,
}

impl Default for KlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            matrix_prefix: "bruhat-matrix".to_string(),
            database_prefix: "KL-database".to_string(),
            workers: default_workers(),
            persist_matrix: true,
        }
    }
}

impl KlConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Matrix file for `S_n`.
    pub fn matrix_path(&self, n: usize) -> PathBuf {
        self.data_dir.join(format!("{}{n}.txt", self.matrix_prefix))
    }

    /// Database file for `S_n`.
    pub fn database_path(&self, n: usize) -> PathBuf {
        self.data_dir.join(format!("{}{n}.txt", self.database_prefix))
    }
}
