//! Triple-pattern query and projection adapter.
//!
//! Wraps one backing triple store, forwards subject/predicate/object
//! patterns to it and reshapes every match into a `full`, `subject`,
//! `predicate` or `object` projection, either collected eagerly or streamed
//! to a visitor that may stop early.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{LogConfig, SqliteStoreConfig, StoreLocation};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status};
pub use model::term::{Literal, Resource, Term};
pub use model::triple::{RawTriple, Statement, Triple, TripleShape};
pub use service::pattern_adapter::{
    AdapterError, AdapterResult, ProjectedIter, RetrievalOptions, Retrieved, StreamOutcome,
    TriplePatternAdapter, Visitor,
};
pub use service::projection::{Projected, Projection, UnknownProjection};
pub use store::memory_store::MemoryTripleStore;
pub use store::sqlite_store::{SqliteMatchOptions, SqliteTripleStore};
pub use store::{StoreError, StoreResult, TripleIter, TripleStore};
