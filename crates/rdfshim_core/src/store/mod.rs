//! Backing triple store contract and bundled implementations.
//!
//! # Responsibility
//! - Define the pattern-match boundary the adapter talks to.
//! - Ship an in-memory store and a SQLite statement store.
//!
//! # Invariants
//! - `match_pattern` receives matchers and options verbatim from callers.
//! - A single match never yields both triple shapes.
//! - Items are yielded in the store's delivery order; the iterator may be
//!   lazy, and dropping it must stop any further upstream work.

use crate::db::DbError;
use crate::model::triple::{Triple, TripleShape};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory_store;
pub mod sqlite_store;

/// Result type used by store construction and pattern matching.
pub type StoreResult<T> = Result<T, StoreError>;

/// Sequence of matched triples. Each item can fail independently when the
/// store decodes lazily.
pub type TripleIter<'a> = Box<dyn Iterator<Item = StoreResult<Triple>> + 'a>;

/// Errors raised by backing stores.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Matcher value the store cannot interpret.
    InvalidMatcher {
        position: &'static str,
        value: String,
    },
    /// Initialization payload mixes structured and raw triples.
    MixedShapes {
        index: usize,
        expected: TripleShape,
        found: TripleShape,
    },
    /// Persisted data cannot be converted to a triple.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidMatcher { position, value } => {
                write!(f, "invalid {position} matcher `{value}`")
            }
            Self::MixedShapes {
                index,
                expected,
                found,
            } => write!(
                f,
                "triple at index {index} is {found:?}, expected {expected:?}; shapes must not be mixed"
            ),
            Self::InvalidData(message) => write!(f, "invalid stored triple: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidMatcher { .. } => None,
            Self::MixedShapes { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Backing store answering subject/predicate/object pattern matches.
///
/// `Init`, `Matcher` and `Options` are store-defined; callers of the adapter
/// hand them through without the adapter inspecting them.
pub trait TripleStore: Sized {
    /// Construction payload, e.g. a dataset location.
    type Init;
    /// Concrete value bound to one pattern position.
    type Matcher;
    /// Store-specific retrieval options.
    type Options;

    /// Builds a store from its initialization payload.
    fn open(init: Self::Init) -> StoreResult<Self>;

    /// Returns triples matching the pattern; `None` positions are wildcards.
    fn match_pattern(
        &self,
        subject: Option<&Self::Matcher>,
        predicate: Option<&Self::Matcher>,
        object: Option<&Self::Matcher>,
        options: &Self::Options,
    ) -> StoreResult<TripleIter<'_>>;
}

/// Shared handle: several adapters (or threads) can query one store.
impl<S: TripleStore> TripleStore for Arc<S> {
    type Init = S::Init;
    type Matcher = S::Matcher;
    type Options = S::Options;

    fn open(init: Self::Init) -> StoreResult<Self> {
        S::open(init).map(Arc::new)
    }

    fn match_pattern(
        &self,
        subject: Option<&Self::Matcher>,
        predicate: Option<&Self::Matcher>,
        object: Option<&Self::Matcher>,
        options: &Self::Options,
    ) -> StoreResult<TripleIter<'_>> {
        (**self).match_pattern(subject, predicate, object, options)
    }
}
