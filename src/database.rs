//! Memo table of computed K-L polynomials, keyed by index pairs.
//!
//! Entries read from disk live in the confirmed store and are never touched again.
//! Entries discovered during this run go to the pending store, which sits behind an
//! `RwLock` so concurrent top-level computations can share one database through `&self`.
//!
//! File format, one entry per line:
//!
//! ```text
//! 3:20={0 1 1 1}
//! 0:5={}
//! ```
//!
//! `i:j` are group indices, the body lists `exponent coefficient` pairs.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use crate::error::KlError;
use crate::polynomial::Polynomial;

/// `(index_u, index_v)`.
pub type PairKey = (usize, usize);

/// Errors encountered while parsing a database file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DatabaseParseError {
    /// An entry is not of the form `i:j={...}`.
    #[error("entry {entry}: expected `i:j={{...}}`, found {text:?}")]
    MalformedEntry {
        /// Zero-based entry number.
        entry: usize,
        /// The offending text.
        text: String,
    },

    /// A key or term is not a non-negative integer (coefficients may be negative).
    #[error("entry {entry}, token {token}: invalid number {text:?}")]
    InvalidNumber {
        /// Zero-based entry number.
        entry: usize,
        /// Zero-based token position inside the entry.
        token: usize,
        /// The offending token.
        text: String,
    },

    /// The body has an exponent without a coefficient.
    #[error("entry {entry}: odd number of terms ({count})")]
    OddTermCount {
        /// Zero-based entry number.
        entry: usize,
        /// Number of tokens found.
        count: usize,
    },
}

/// Strips an all-zero fractional part so `2.0` reads as `2`.
fn integral(token: &str) -> &str {
    match token.split_once('.') {
        Some((whole, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => whole,
        _ => token,
    }
}

/// Parses database text into a map. Line breaks count as whitespace, and later entries
/// overwrite earlier ones.
///
/// # Errors
/// Returns the first malformed entry. An entry missing its closing `}` (a truncated
/// file) is malformed.
pub fn parse_database(text: &str) -> Result<HashMap<PairKey, Polynomial>, DatabaseParseError> {
    let mut chunks: Vec<&str> = text.split('}').map(str::trim).collect();
    // Whatever follows the last `}` is an unterminated entry unless it is blank.
    if let Some(tail) = chunks.pop().filter(|t| !t.is_empty()) {
        return Err(DatabaseParseError::MalformedEntry {
            entry: chunks.len(),
            text: tail.to_string(),
        });
    }

    let mut out = HashMap::new();
    for (entry, chunk) in chunks.into_iter().enumerate() {
        let malformed = || DatabaseParseError::MalformedEntry {
            entry,
            text: chunk.to_string(),
        };
        let (key, body) = chunk.split_once("={").ok_or_else(malformed)?;
        let (i, j) = key.trim().split_once(':').ok_or_else(malformed)?;

        let number = |token: usize, text: &str| DatabaseParseError::InvalidNumber {
            entry,
            token,
            text: text.to_string(),
        };
        let i: usize = integral(i.trim()).parse().map_err(|_| number(0, i))?;
        let j: usize = integral(j.trim()).parse().map_err(|_| number(1, j))?;

        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(DatabaseParseError::OddTermCount {
                entry,
                count: tokens.len(),
            });
        }
        let mut poly = Polynomial::zero();
        for (t, pair) in tokens.chunks_exact(2).enumerate() {
            let e: u32 = integral(pair[0])
                .parse()
                .map_err(|_| number(2 + 2 * t, pair[0]))?;
            let c: i64 = integral(pair[1])
                .parse()
                .map_err(|_| number(3 + 2 * t, pair[1]))?;
            poly.add_term(e, c);
        }
        out.insert((i, j), poly);
    }
    Ok(out)
}

/// Renders one entry as a database line (without the newline).
pub fn format_entry((i, j): PairKey, poly: &Polynomial) -> String {
    let body: Vec<String> = poly.terms().map(|(e, c)| format!("{e} {c}")).collect();
    format!("{i}:{j}={{{}}}", body.join(" "))
}

/// Confirmed (loaded) and pending (computed this run) polynomials.
#[derive(Debug, Default)]
pub struct KlDatabase {
    confirmed: HashMap<PairKey, Polynomial>,
    pending: RwLock<HashMap<PairKey, Polynomial>>,
}

impl KlDatabase {
    /// An empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-parsed map as the confirmed store.
    pub fn from_confirmed(confirmed: HashMap<PairKey, Polynomial>) -> Self {
        Self {
            confirmed,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Loads `path` into the confirmed store. A missing file yields an empty database.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KlError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no K-L database yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let confirmed = parse_database(&text)?;
        info!(path = %path.display(), entries = confirmed.len(), "loaded K-L database");
        Ok(Self::from_confirmed(confirmed))
    }

    /// Confirmed entry first, then pending; `None` on a miss.
    pub fn lookup(&self, u: usize, v: usize) -> Option<Polynomial> {
        if let Some(p) = self.confirmed.get(&(u, v)) {
            return Some(p.clone());
        }
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(u, v))
            .cloned()
    }

    /// Stores a freshly computed polynomial in the pending store.
    pub fn record(&self, u: usize, v: usize, poly: Polynomial) {
        self.pending
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((u, v), poly);
    }

    /// Entries loaded from disk (plus any promoted by [`flush`](Self::flush)).
    pub fn confirmed_len(&self) -> usize {
        self.confirmed.len()
    }

    /// Entries waiting to be flushed.
    pub fn pending_len(&self) -> usize {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Appends every pending entry to `path` in key order, then moves them into the
    /// confirmed store. Returns the number of entries written.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or written; pending entries are
    /// kept in that case.
    pub fn flush(&mut self, path: impl AsRef<Path>) -> Result<usize, KlError> {
        let path = path.as_ref();
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.is_empty() {
            debug!("nothing to flush");
            return Ok(0);
        }

        let mut keys: Vec<PairKey> = pending.keys().copied().collect();
        keys.sort_unstable();

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut w = BufWriter::new(file);
        for key in &keys {
            writeln!(w, "{}", format_entry(*key, &pending[key]))?;
        }
        w.flush()?;

        let written = keys.len();
        self.confirmed.extend(pending.drain());
        info!(path = %path.display(), written, "flushed K-L database");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_plus_q() -> Polynomial {
        Polynomial::from_terms([(0, 1), (1, 1)])
    }

    #[test]
    fn lookup_prefers_confirmed() {
        let mut confirmed = HashMap::new();
        confirmed.insert((1, 2), Polynomial::one());
        let db = KlDatabase::from_confirmed(confirmed);
        db.record(1, 2, one_plus_q());
        db.record(3, 4, one_plus_q());
        assert_eq!(db.lookup(1, 2), Some(Polynomial::one()));
        assert_eq!(db.lookup(3, 4), Some(one_plus_q()));
        assert_eq!(db.lookup(4, 3), None);
        assert_eq!(db.pending_len(), 2);
    }

    #[test]
    fn parse_accepts_the_documented_format() {
        let text = "3:20={0 1 1 1}\n\n0:5={}\n7:9={0.0 2.0\n 3 -1}\r\n3:20={0 1}\n";
        let map = parse_database(text).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&(3, 20)], Polynomial::one());
        assert!(map[&(0, 5)].is_zero());
        assert_eq!(map[&(7, 9)], Polynomial::from_terms([(0, 2), (3, -1)]));
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        assert!(matches!(
            parse_database("1-2={0 1}"),
            Err(DatabaseParseError::MalformedEntry { entry: 0, .. })
        ));
        assert!(matches!(
            parse_database("0:1={0 1}\n1:2 0 1}"),
            Err(DatabaseParseError::MalformedEntry { entry: 1, .. })
        ));
        assert_eq!(
            parse_database("1:2={0 1 2}"),
            Err(DatabaseParseError::OddTermCount { entry: 0, count: 3 })
        );
        assert!(matches!(
            parse_database("1:2={0.5 1}"),
            Err(DatabaseParseError::InvalidNumber { token: 2, .. })
        ));
        assert!(matches!(
            parse_database("1:2={-1 1}"),
            Err(DatabaseParseError::InvalidNumber { token: 2, .. })
        ));
    }

    #[test]
    fn line_breaks_separate_terms() {
        let map = parse_database("1:2={0 1\n1 1 2 1\r\n3 1}\n4\n:\n5={0\n1}").unwrap();
        assert_eq!(
            map[&(1, 2)],
            Polynomial::from_terms([(0, 1), (1, 1), (2, 1), (3, 1)])
        );
        assert_eq!(map[&(4, 5)], Polynomial::one());
    }

    #[test]
    fn unterminated_entry_is_rejected() {
        assert_eq!(
            parse_database("0:1={0 1}\n1:2={0 1 1 1"),
            Err(DatabaseParseError::MalformedEntry {
                entry: 1,
                text: "1:2={0 1 1 1".to_string()
            })
        );
        assert!(matches!(
            parse_database("0:1={0 1}\n1:2={0 1 1 1}\n3:"),
            Err(DatabaseParseError::MalformedEntry { entry: 2, .. })
        ));
        assert!(parse_database("0:1={0 1}\n\n  \n").is_ok());
        assert!(parse_database("").unwrap().is_empty());
    }

    #[test]
    fn truncated_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("KL-database4.txt");
        let mut db = KlDatabase::new();
        db.record(0, 23, Polynomial::from_terms([(0, 1), (1, 12)]));
        db.flush(&path).unwrap();

        let full = fs::read_to_string(&path).unwrap();
        assert_eq!(full, "0:23={0 1 1 12}\n");
        fs::write(&path, &full[..full.len() - 3]).unwrap();
        assert!(matches!(
            KlDatabase::load(&path),
            Err(KlError::DatabaseParse(DatabaseParseError::MalformedEntry { entry: 0, .. }))
        ));
    }

    #[test]
    fn entries_render_in_file_format() {
        assert_eq!(format_entry((3, 20), &one_plus_q()), "3:20={0 1 1 1}");
        assert_eq!(format_entry((0, 5), &Polynomial::zero()), "0:5={}");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = KlDatabase::load(dir.path().join("KL-database4.txt")).unwrap();
        assert_eq!(db.confirmed_len(), 0);
        assert_eq!(db.pending_len(), 0);
    }

    #[test]
    fn flush_appends_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("KL-database4.txt");

        let mut db = KlDatabase::new();
        db.record(5, 2, Polynomial::one());
        db.record(1, 23, one_plus_q());
        db.record(0, 1, Polynomial::zero());
        assert_eq!(db.flush(&path).unwrap(), 3);
        assert_eq!(db.pending_len(), 0);
        assert_eq!(db.confirmed_len(), 3);
        assert_eq!(db.lookup(1, 23), Some(one_plus_q()));

        db.record(2, 2, Polynomial::one());
        assert_eq!(db.flush(&path).unwrap(), 1);
        assert_eq!(db.flush(&path).unwrap(), 0);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0:1={}\n1:23={0 1 1 1}\n5:2={0 1}\n2:2={0 1}\n");

        let reloaded = KlDatabase::load(&path).unwrap();
        assert_eq!(reloaded.confirmed_len(), 4);
        assert_eq!(reloaded.lookup(5, 2), Some(Polynomial::one()));
        assert_eq!(reloaded.lookup(0, 1), Some(Polynomial::zero()));
    }

    #[test]
    fn malformed_file_is_a_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "not a database").unwrap();
        assert!(matches!(
            KlDatabase::load(&path),
            Err(KlError::DatabaseParse(_))
        ));
    }
}
