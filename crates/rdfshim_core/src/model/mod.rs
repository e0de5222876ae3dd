//! RDF data model shared by stores and the pattern adapter.
//!
//! # Responsibility
//! - Define terms, statements and the two triple shapes stores may emit.
//!
//! # Invariants
//! - Triples are transient values; nothing in this module persists them.

pub mod term;
pub mod triple;
