//! RDF term model.
//!
//! # Responsibility
//! - Define resources (IRI / blank node) and literals as explicit variants.
//! - Provide the canonical string forms used by projections.
//!
//! # Invariants
//! - A resource's string form is its identifier: the IRI verbatim, or
//!   `_:label` for blank nodes.
//! - A literal's `Display` form is its serialized N-Triples form, which is
//!   NOT the same as its `value`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Prefix used by blank node identifiers in string form.
pub const BLANK_NODE_PREFIX: &str = "_:";

/// Identifier-referenced entity: subject, predicate or non-literal object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Resource {
    /// Absolute (or prefixed) IRI, stored verbatim.
    Iri(String),
    /// Blank node label without the `_:` prefix.
    Blank(String),
}

impl Resource {
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Creates a blank node with a freshly generated label.
    pub fn new_blank() -> Self {
        Self::Blank(format!("b{}", Uuid::new_v4().simple()))
    }

    /// Parses identifier string form back into a resource.
    ///
    /// Strings starting with `_:` become blank nodes, everything else an IRI.
    pub fn from_identifier(value: &str) -> Self {
        match value.strip_prefix(BLANK_NODE_PREFIX) {
            Some(label) => Self::Blank(label.to_string()),
            None => Self::Iri(value.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(iri) => f.write_str(iri),
            Self::Blank(label) => write!(f, "{BLANK_NODE_PREFIX}{label}"),
        }
    }
}

/// Literal object value with optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical value, e.g. `42` for `"42"^^xsd:integer`.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Literal {
    /// Plain literal without datatype or language.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "\"{escaped}\"")?;
        if let Some(language) = &self.language {
            write!(f, "@{language}")
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^<{datatype}>")
        } else {
            Ok(())
        }
    }
}

/// Object-position term: either a resource or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Resource(Resource),
    Literal(Literal),
}

impl Term {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl From<Resource> for Term {
    fn from(value: Resource) -> Self {
        Self::Resource(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource(resource) => resource.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}
