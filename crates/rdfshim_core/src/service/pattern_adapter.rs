//! Triple pattern adapter.
//!
//! # Responsibility
//! - Forward subject/predicate/object patterns to one backing store.
//! - Project every matched triple and hand results out eagerly or one by one.
//!
//! # Invariants
//! - Projected values keep the store's delivery order in every mode.
//! - Matchers and backend options reach the store untouched.
//! - Store failures surface unchanged as `BackendQuery`; nothing is retried
//!   or partially suppressed.
//! - After a visitor returns `ControlFlow::Break`, the store iterator is not
//!   advanced again.

use crate::service::projection::{Projected, Projection};
use crate::store::{StoreError, TripleIter, TripleStore};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::ControlFlow;
use std::time::Instant;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Adapter-level error, split by the phase it happened in.
#[derive(Debug)]
pub enum AdapterError {
    /// Store could not be built from its init payload. The adapter was never
    /// created; retrying with the same payload will fail again.
    StoreInitialization(StoreError),
    /// Pattern match or row decoding failed. A fresh call may succeed.
    BackendQuery(StoreError),
}

impl AdapterError {
    /// Whether issuing the call again (possibly with new inputs) makes sense.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::BackendQuery(_))
    }

    /// Store error carried by either variant.
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::StoreInitialization(err) | Self::BackendQuery(err) => err,
        }
    }
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreInitialization(err) => write!(f, "store initialization failed: {err}"),
            Self::BackendQuery(err) => write!(f, "backend query failed: {err}"),
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.store_error())
    }
}

/// Options for one retrieval call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalOptions<O> {
    /// Projection name; `None` and unknown names mean `full`.
    #[serde(default)]
    pub projection: Option<String>,
    /// Store-specific options, forwarded verbatim.
    pub backend: O,
}

impl<O> RetrievalOptions<O> {
    pub fn new(backend: O) -> Self {
        Self {
            projection: None,
            backend,
        }
    }

    /// Requests a projection by name. Unknown names degrade to `full`.
    pub fn only(mut self, name: impl Into<String>) -> Self {
        self.projection = Some(name.into());
        self
    }

    pub fn with_projection(self, projection: Projection) -> Self {
        self.only(projection.as_str())
    }

    /// Projection this request resolves to.
    pub fn resolved_projection(&self) -> Projection {
        Projection::resolve(self.projection.as_deref())
    }
}

/// Summary of a streaming retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Values handed to the visitor.
    pub delivered: usize,
    /// The visitor asked to stop before the store ran out of triples.
    pub stopped_early: bool,
}

/// Result of [`TriplePatternAdapter::retrieve`], depending on whether a
/// visitor was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    Materialized(Vec<Projected>),
    Streamed(StreamOutcome),
}

/// Visitor callback for streaming mode.
pub type Visitor<'v> = &'v mut dyn FnMut(Projected) -> ControlFlow<()>;

/// Lazily projected match results.
///
/// Pulls one triple from the store per `next()`. Yields at most one error,
/// then ends.
pub struct ProjectedIter<'a> {
    triples: TripleIter<'a>,
    projection: Projection,
    failed: bool,
}

impl ProjectedIter<'_> {
    pub fn projection(&self) -> Projection {
        self.projection
    }
}

impl Iterator for ProjectedIter<'_> {
    type Item = AdapterResult<Projected>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.triples.next()? {
            Ok(triple) => Some(Ok(self.projection.apply(&triple))),
            Err(err) => {
                self.failed = true;
                Some(Err(AdapterError::BackendQuery(err)))
            }
        }
    }
}

/// Pattern-matching front end over one backing store.
pub struct TriplePatternAdapter<S: TripleStore> {
    store: S,
}

impl<S: TripleStore> TriplePatternAdapter<S> {
    /// Wraps an already built store (or a shared `Arc` handle to one).
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the backing store from its opaque init payload.
    ///
    /// # Errors
    /// - `StoreInitialization` when the store rejects the payload.
    pub fn open(init: S::Init) -> AdapterResult<Self> {
        let started_at = Instant::now();
        info!("event=store_open module=adapter status=start");

        match S::open(init) {
            Ok(store) => {
                info!(
                    "event=store_open module=adapter status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self { store })
            }
            Err(err) => {
                error!(
                    "event=store_open module=adapter status=error duration_ms={} error_code=store_init_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(AdapterError::StoreInitialization(err))
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Retrieves matches, streaming them to `visitor` when one is given and
    /// materializing them otherwise.
    ///
    /// `None` matchers are wildcards.
    pub fn retrieve(
        &self,
        subject: Option<&S::Matcher>,
        predicate: Option<&S::Matcher>,
        object: Option<&S::Matcher>,
        options: &RetrievalOptions<S::Options>,
        visitor: Option<Visitor<'_>>,
    ) -> AdapterResult<Retrieved> {
        match visitor {
            Some(visitor) => self
                .for_each(subject, predicate, object, options, visitor)
                .map(Retrieved::Streamed),
            None => self
                .collect(subject, predicate, object, options)
                .map(Retrieved::Materialized),
        }
    }

    /// Returns a lazy iterator of projected values.
    ///
    /// Dropping the iterator stops pulling from the store.
    pub fn stream(
        &self,
        subject: Option<&S::Matcher>,
        predicate: Option<&S::Matcher>,
        object: Option<&S::Matcher>,
        options: &RetrievalOptions<S::Options>,
    ) -> AdapterResult<ProjectedIter<'_>> {
        let projection = options.resolved_projection();
        let triples = self
            .store
            .match_pattern(subject, predicate, object, &options.backend)
            .map_err(|err| {
                warn!(
                    "event=pattern_match module=adapter status=error error_code=backend_query_failed error={}",
                    err
                );
                AdapterError::BackendQuery(err)
            })?;

        Ok(ProjectedIter {
            triples,
            projection,
            failed: false,
        })
    }

    /// Eager mode: collects every projected value in store order.
    pub fn collect(
        &self,
        subject: Option<&S::Matcher>,
        predicate: Option<&S::Matcher>,
        object: Option<&S::Matcher>,
        options: &RetrievalOptions<S::Options>,
    ) -> AdapterResult<Vec<Projected>> {
        let started_at = Instant::now();
        let values = self.stream(subject, predicate, object, options)?;
        let projection = values.projection();
        let values = values.collect::<AdapterResult<Vec<_>>>()?;

        debug!(
            "event=retrieve module=adapter status=ok mode=eager projection={} count={} duration_ms={}",
            projection.as_str(),
            values.len(),
            started_at.elapsed().as_millis()
        );
        Ok(values)
    }

    /// Streaming mode: hands each projected value to `visitor` in store
    /// order until the store is exhausted or the visitor breaks.
    ///
    /// Stopping early is not an error.
    pub fn for_each<F>(
        &self,
        subject: Option<&S::Matcher>,
        predicate: Option<&S::Matcher>,
        object: Option<&S::Matcher>,
        options: &RetrievalOptions<S::Options>,
        mut visitor: F,
    ) -> AdapterResult<StreamOutcome>
    where
        F: FnMut(Projected) -> ControlFlow<()>,
    {
        let started_at = Instant::now();
        let values = self.stream(subject, predicate, object, options)?;
        let projection = values.projection();

        let mut outcome = StreamOutcome {
            delivered: 0,
            stopped_early: false,
        };
        for value in values {
            let value = value?;
            outcome.delivered += 1;
            if visitor(value).is_break() {
                outcome.stopped_early = true;
                break;
            }
        }

        debug!(
            "event=retrieve module=adapter status=ok mode=stream projection={} delivered={} stopped_early={} duration_ms={}",
            projection.as_str(),
            outcome.delivered,
            outcome.stopped_early,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }
}
