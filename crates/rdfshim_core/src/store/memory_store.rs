//! In-memory triple store.
//!
//! # Responsibility
//! - Hold a fixed vector of triples of one shape.
//! - Answer pattern matches by comparing component strings.
//!
//! # Invariants
//! - All held triples share one shape; `open` rejects mixed input.
//! - Matches are yielded lazily in insertion order.

use crate::model::triple::Triple;
use crate::service::projection::{object, predicate, subject};
use crate::store::{StoreError, StoreResult, TripleIter, TripleStore};

/// Vector-backed store, mostly useful for hosts that already hold triples.
#[derive(Debug, Clone, Default)]
pub struct MemoryTripleStore {
    triples: Vec<Triple>,
}

impl MemoryTripleStore {
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl TripleStore for MemoryTripleStore {
    type Init = Vec<Triple>;
    /// Compared with the projected string of the matching position, so a
    /// literal object matches on its value.
    type Matcher = String;
    type Options = ();

    fn open(init: Self::Init) -> StoreResult<Self> {
        if let Some(first) = init.first() {
            let expected = first.shape();
            if let Some((index, triple)) = init
                .iter()
                .enumerate()
                .find(|(_, triple)| triple.shape() != expected)
            {
                return Err(StoreError::MixedShapes {
                    index,
                    expected,
                    found: triple.shape(),
                });
            }
        }

        Ok(Self { triples: init })
    }

    fn match_pattern(
        &self,
        subject_matcher: Option<&String>,
        predicate_matcher: Option<&String>,
        object_matcher: Option<&String>,
        _options: &(),
    ) -> StoreResult<TripleIter<'_>> {
        let subject_matcher = subject_matcher.cloned();
        let predicate_matcher = predicate_matcher.cloned();
        let object_matcher = object_matcher.cloned();

        let matches = self.triples.iter().filter(move |triple| {
            bound_matches(subject_matcher.as_deref(), || subject(triple))
                && bound_matches(predicate_matcher.as_deref(), || predicate(triple))
                && bound_matches(object_matcher.as_deref(), || object(triple))
        });

        Ok(Box::new(matches.cloned().map(Ok)))
    }
}

fn bound_matches(matcher: Option<&str>, component: impl FnOnce() -> String) -> bool {
    matcher.map_or(true, |expected| component() == expected)
}

#[cfg(test)]
mod tests {
    use super::MemoryTripleStore;
    use crate::model::term::{Literal, Resource};
    use crate::model::triple::{RawTriple, Statement, Triple, TripleShape};
    use crate::store::{StoreError, TripleStore};

    fn statement(subject: &str, predicate: &str, object: &str) -> Triple {
        Triple::Structured(Statement::new(
            Resource::iri(subject),
            Resource::iri(predicate),
            Literal::plain(object),
        ))
    }

    fn collect(
        store: &MemoryTripleStore,
        subject: Option<&str>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        let subject = subject.map(str::to_string);
        let object = object.map(str::to_string);
        store
            .match_pattern(subject.as_ref(), None, object.as_ref(), &())
            .expect("match")
            .collect::<Result<Vec<_>, _>>()
            .expect("items")
    }

    #[test]
    fn open_rejects_mixed_shapes() {
        let err = MemoryTripleStore::open(vec![
            statement("ex:a", "ex:p", "1"),
            Triple::Raw(RawTriple::new("ex:a", "ex:p", "2")),
        ])
        .expect_err("mixed shapes must be rejected");

        assert!(matches!(
            err,
            StoreError::MixedShapes {
                index: 1,
                expected: TripleShape::Structured,
                found: TripleShape::Raw,
            }
        ));
    }

    #[test]
    fn open_accepts_empty_input() {
        let store = MemoryTripleStore::open(Vec::new()).expect("empty store");
        assert!(store.is_empty());
        assert!(collect(&store, None, None).is_empty());
    }

    #[test]
    fn wildcards_match_everything_in_order() {
        let triples = vec![
            statement("ex:b", "ex:p", "2"),
            statement("ex:a", "ex:p", "1"),
            statement("ex:c", "ex:p", "3"),
        ];
        let store = MemoryTripleStore::open(triples.clone()).expect("store");

        assert_eq!(store.len(), 3);
        assert_eq!(collect(&store, None, None), triples);
    }

    #[test]
    fn literal_object_matches_on_value() {
        let store = MemoryTripleStore::open(vec![
            statement("ex:a", "ex:p", "hello"),
            statement("ex:a", "ex:p", "bye"),
        ])
        .expect("store");

        let matched = collect(&store, Some("ex:a"), Some("hello"));
        assert_eq!(matched, vec![statement("ex:a", "ex:p", "hello")]);
    }

    #[test]
    fn raw_triples_match_on_elements() {
        let store = MemoryTripleStore::open(vec![
            Triple::Raw(RawTriple::new("ex:a", "ex:p", "x")),
            Triple::Raw(RawTriple::new("ex:b", "ex:p", "y")),
        ])
        .expect("store");

        let matched = collect(&store, Some("ex:b"), None);
        assert_eq!(matched, vec![Triple::Raw(RawTriple::new("ex:b", "ex:p", "y"))]);
    }
}
