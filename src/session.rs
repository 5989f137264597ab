//! One working session on a fixed `S_n`: the group, its order oracle and the memo table.
//!
//! [`KlSession::open`] loads the matrix from disk or builds and saves it, then loads the
//! database. [`KlSession::open_standalone`] skips the matrix and answers every query with
//! a [`LazyBruhatOrder`]. Switching to another `n` means opening a new session.

use std::fs;
use std::sync::Arc;

use tracing::info;

use crate::bruhat::{self, BruhatOrder};
use crate::config::{default_workers, KlConfig};
use crate::database::KlDatabase;
use crate::engine::KlEngine;
use crate::error::KlError;
use crate::group::GroupContext;
use crate::lazy::{CoverCache, LazyBruhatOrder};
use crate::matrix::BruhatMatrix;
use crate::permutation::Permutation;
use crate::polynomial::Polynomial;

/// Group, optional Bruhat matrix and K-L database for one `n`.
#[derive(Debug)]
pub struct KlSession {
    config: KlConfig,
    group: GroupContext,
    matrix: Option<BruhatMatrix>,
    covers: Arc<CoverCache>,
    db: KlDatabase,
}

impl KlSession {
    /// Opens a matrix-backed session for `S_n`.
    ///
    /// # Errors
    /// Returns an error for an unsupported `n`, or if a persisted file cannot be read,
    /// parsed or written.
    pub fn open(config: KlConfig, n: usize) -> Result<Self, KlError> {
        let group = GroupContext::new(n)?;
        fs::create_dir_all(&config.data_dir)?;

        let path = config.matrix_path(n);
        let matrix = match BruhatMatrix::load_from_file(&path, group.order())? {
            Some(m) => {
                info!(path = %path.display(), "loaded bruhat matrix");
                m
            }
            None => {
                let m = BruhatMatrix::build(&group, config.workers)?;
                if config.persist_matrix {
                    m.save_to_file(&path)?;
                    info!(path = %path.display(), "saved bruhat matrix");
                }
                m
            }
        };

        let db = KlDatabase::load(config.database_path(n))?;
        Ok(Self {
            config,
            group,
            matrix: Some(matrix),
            covers: Arc::default(),
            db,
        })
    }

    /// Opens a session for `S_n` that never materializes the matrix.
    ///
    /// # Errors
    /// Returns an error for an unsupported `n` or a malformed database file.
    pub fn open_standalone(config: KlConfig, n: usize) -> Result<Self, KlError> {
        let group = GroupContext::new(n)?;
        let db = KlDatabase::load(config.database_path(n))?;
        info!(n, "standalone session, bruhat order explored on demand");
        Ok(Self {
            config,
            group,
            matrix: None,
            covers: Arc::default(),
            db,
        })
    }

    /// The active group.
    pub fn group(&self) -> &GroupContext {
        &self.group
    }

    /// Settings the session was opened with.
    pub fn config(&self) -> &KlConfig {
        &self.config
    }

    /// The matrix, unless the session is standalone.
    pub fn matrix(&self) -> Option<&BruhatMatrix> {
        self.matrix.as_ref()
    }

    /// The memo table.
    pub fn database(&self) -> &KlDatabase {
        &self.db
    }

    /// Elements whose upward covers a standalone session has explored so far.
    pub fn explored_covers(&self) -> usize {
        self.covers.len()
    }

    fn with_order<R>(&self, f: impl FnOnce(&(dyn BruhatOrder + Sync)) -> R) -> R {
        match &self.matrix {
            Some(m) => f(m),
            None => f(&LazyBruhatOrder::with_cache(&self.group, Arc::clone(&self.covers))),
        }
    }

    /// `P(u, v)`.
    ///
    /// # Errors
    /// Returns an error if either permutation is not in the active group.
    pub fn polynomial(&self, u: &Permutation, v: &Permutation) -> Result<Polynomial, KlError> {
        self.with_order(|order| KlEngine::new(&self.group, order, &self.db).compute(u, v))
    }

    /// `mu(u, v)`.
    ///
    /// # Errors
    /// Returns an error if either permutation is not in the active group.
    pub fn mu(&self, u: &Permutation, v: &Permutation) -> Result<i64, KlError> {
        let (u, v) = (self.group.resolve(u)?, self.group.resolve(v)?);
        Ok(self.with_order(|order| KlEngine::new(&self.group, order, &self.db).mu(u, v)))
    }

    /// `u < v` in Bruhat order.
    ///
    /// # Errors
    /// Returns an error if either permutation is not in the active group.
    pub fn compare(&self, u: &Permutation, v: &Permutation) -> Result<bool, KlError> {
        let (i, j) = (self.group.resolve(u)?, self.group.resolve(v)?);
        Ok(match &self.matrix {
            Some(m) => m.get(i, j),
            None => bruhat::is_less(u, v, self.group.len_at(i), self.group.len_at(j)),
        })
    }

    /// Every `z` with `u <= z <= v`, in index order. Incomparable endpoints give just the
    /// two endpoints.
    ///
    /// # Errors
    /// Returns an error if either permutation is not in the active group.
    pub fn interval(&self, u: &Permutation, v: &Permutation) -> Result<Vec<Permutation>, KlError> {
        let (u, v) = (self.group.resolve(u)?, self.group.resolve(v)?);
        let indices = self.with_order(|order| order.interval(u, v));
        Ok(indices
            .into_iter()
            .map(|i| self.group.at(i).clone())
            .collect())
    }

    /// Computes many polynomials on a pool of `config.workers` threads.
    ///
    /// # Errors
    /// Returns an error if any permutation is not in the active group or the pool
    /// cannot be started.
    pub fn polynomials(
        &self,
        pairs: &[(Permutation, Permutation)],
    ) -> Result<Vec<Polynomial>, KlError> {
        let indices = pairs
            .iter()
            .map(|(u, v)| Ok((self.group.resolve(u)?, self.group.resolve(v)?)))
            .collect::<Result<Vec<_>, KlError>>()?;
        let workers = match self.config.workers {
            0 => default_workers(),
            w => w,
        };
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        info!(pairs = indices.len(), workers, "computing K-L polynomials");
        Ok(pool.install(|| {
            self.with_order(|order| {
                KlEngine::new(&self.group, order, &self.db).compute_batch(&indices)
            })
        }))
    }

    /// Appends newly computed polynomials to the database file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn flush(&mut self) -> Result<usize, KlError> {
        fs::create_dir_all(&self.config.data_dir)?;
        let path = self.config.database_path(self.group.n());
        self.db.flush(path)
    }
}
