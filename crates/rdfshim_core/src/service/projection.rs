//! Triple projections.
//!
//! # Responsibility
//! - Map one triple to the simplified value a consumer asked for.
//! - Resolve projection names through a fixed table.
//!
//! # Invariants
//! - Every projection accepts both triple shapes and never fails.
//! - Literal unwrapping happens only on the structured path; raw tuples are
//!   returned as the store stringified them.
//! - Unknown names resolve to `Full` unless the caller opts into
//!   [`Projection::parse_strict`].

use crate::model::term::Term;
use crate::model::triple::Triple;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the full-triple projection.
pub const PROJECTION_FULL: &str = "full";
/// Name of the subject projection.
pub const PROJECTION_SUBJECT: &str = "subject";
/// Name of the predicate projection.
pub const PROJECTION_PREDICATE: &str = "predicate";
/// Name of the object projection.
pub const PROJECTION_OBJECT: &str = "object";

const PROJECTION_TABLE: &[(&str, Projection)] = &[
    (PROJECTION_FULL, Projection::Full),
    (PROJECTION_SUBJECT, Projection::Subject),
    (PROJECTION_PREDICATE, Projection::Predicate),
    (PROJECTION_OBJECT, Projection::Object),
];

/// Canonical projection selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    #[default]
    Full,
    Subject,
    Predicate,
    Object,
}

/// Output of one projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Projected {
    /// `(subject, predicate, object)` from the `full` projection.
    Triple(String, String, String),
    /// Single component from `subject`, `predicate` or `object`.
    Term(String),
}

impl Projected {
    /// Returns the single-component value, if this is not a full triple.
    pub fn as_term(&self) -> Option<&str> {
        match self {
            Self::Term(value) => Some(value),
            Self::Triple(..) => None,
        }
    }

    pub fn into_triple(self) -> Option<(String, String, String)> {
        match self {
            Self::Triple(subject, predicate, object) => Some((subject, predicate, object)),
            Self::Term(_) => None,
        }
    }
}

impl Projection {
    /// Stable name used in retrieval options.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => PROJECTION_FULL,
            Self::Subject => PROJECTION_SUBJECT,
            Self::Predicate => PROJECTION_PREDICATE,
            Self::Object => PROJECTION_OBJECT,
        }
    }

    /// Resolves a projection name, falling back to `Full` for unknown names.
    ///
    /// An unrecognized projection must not abort a read-only query, so this
    /// never fails. Use [`Projection::parse_strict`] to surface typos.
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            None => Self::Full,
            Some(name) => Self::parse_strict(name).unwrap_or_else(|err| {
                debug!(
                    "event=projection_fallback module=projection status=ok requested={} resolved={}",
                    err.requested(),
                    PROJECTION_FULL
                );
                Self::Full
            }),
        }
    }

    /// Resolves a projection name, rejecting anything outside the table.
    ///
    /// Names match exactly; no case folding or whitespace trimming.
    pub fn parse_strict(name: &str) -> Result<Self, UnknownProjection> {
        PROJECTION_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, projection)| *projection)
            .ok_or_else(|| UnknownProjection(name.to_string()))
    }

    /// Applies this projection to one triple.
    pub fn apply(self, triple: &Triple) -> Projected {
        match self {
            Self::Full => {
                let (subject, predicate, object) = full(triple);
                Projected::Triple(subject, predicate, object)
            }
            Self::Subject => Projected::Term(subject(triple)),
            Self::Predicate => Projected::Term(predicate(triple)),
            Self::Object => Projected::Term(object(triple)),
        }
    }
}

/// Returns supported projection names in table order.
pub fn supported_projection_names() -> impl Iterator<Item = &'static str> {
    PROJECTION_TABLE.iter().map(|(name, _)| *name)
}

/// `(subject, predicate, object)` strings; raw tuples pass through unchanged.
pub fn full(triple: &Triple) -> (String, String, String) {
    match triple {
        Triple::Structured(statement) => (
            statement.subject.to_string(),
            statement.predicate.to_string(),
            object(triple),
        ),
        Triple::Raw(raw) => {
            let [subject, predicate, object] = raw.0.clone();
            (subject, predicate, object)
        }
    }
}

pub fn subject(triple: &Triple) -> String {
    match triple {
        Triple::Structured(statement) => statement.subject.to_string(),
        Triple::Raw(raw) => raw.subject().to_string(),
    }
}

pub fn predicate(triple: &Triple) -> String {
    match triple {
        Triple::Structured(statement) => statement.predicate.to_string(),
        Triple::Raw(raw) => raw.predicate().to_string(),
    }
}

/// Object string: literal value for literals, identifier for resources.
pub fn object(triple: &Triple) -> String {
    match triple {
        Triple::Structured(statement) => match &statement.object {
            Term::Literal(literal) => literal.value.clone(),
            Term::Resource(resource) => resource.to_string(),
        },
        Triple::Raw(raw) => raw.object().to_string(),
    }
}

/// Requested projection name is not in the projection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProjection(String);

impl UnknownProjection {
    pub fn requested(&self) -> &str {
        &self.0
    }
}

impl Display for UnknownProjection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown projection `{}`; expected full|subject|predicate|object",
            self.0
        )
    }
}

impl Error for UnknownProjection {}
