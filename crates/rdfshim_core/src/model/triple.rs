//! Triple shapes produced by backing stores.
//!
//! # Responsibility
//! - Represent both structured statements and raw string tuples.
//! - Let every consumer branch on the shape with a plain `match`.
//!
//! # Invariants
//! - One retrieval never mixes shapes; stores guarantee this, consumers
//!   still handle either shape per element.

use crate::model::term::{Resource, Term};
use serde::{Deserialize, Serialize};

/// Fully typed subject/predicate/object statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Resource,
    pub predicate: Resource,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: Resource, predicate: Resource, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
        }
    }
}

/// Pre-stringified `[subject, predicate, object]` tuple.
///
/// Carries no literal/resource distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTriple(pub [String; 3]);

impl RawTriple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self([subject.into(), predicate.into(), object.into()])
    }

    pub fn subject(&self) -> &str {
        &self.0[0]
    }

    pub fn predicate(&self) -> &str {
        &self.0[1]
    }

    pub fn object(&self) -> &str {
        &self.0[2]
    }
}

/// Shape tag of a [`Triple`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleShape {
    Structured,
    Raw,
}

/// One matched triple, in whichever shape the store produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Triple {
    Structured(Statement),
    Raw(RawTriple),
}

impl Triple {
    pub fn shape(&self) -> TripleShape {
        match self {
            Self::Structured(_) => TripleShape::Structured,
            Self::Raw(_) => TripleShape::Raw,
        }
    }
}

impl From<Statement> for Triple {
    fn from(value: Statement) -> Self {
        Self::Structured(value)
    }
}

impl From<RawTriple> for Triple {
    fn from(value: RawTriple) -> Self {
        Self::Raw(value)
    }
}
