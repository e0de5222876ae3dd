use rdfshim_core::{
    AdapterError, Literal, MemoryTripleStore, Projected, Projection, RawTriple, Resource,
    RetrievalOptions, Retrieved, Statement, StoreError, StoreResult, StreamOutcome, Triple,
    TripleIter, TriplePatternAdapter, TripleStore,
};
use std::cell::Cell;
use std::ops::ControlFlow;
use std::sync::Arc;

const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// Store that counts how many triples were pulled from it and can fail on
/// demand.
struct CountingStore {
    triples: Vec<Triple>,
    fail_match: bool,
    fail_at: Option<usize>,
    pulled: Cell<usize>,
}

impl TripleStore for CountingStore {
    type Init = Vec<Triple>;
    type Matcher = String;
    type Options = ();

    fn open(init: Self::Init) -> StoreResult<Self> {
        Ok(Self {
            triples: init,
            fail_match: false,
            fail_at: None,
            pulled: Cell::new(0),
        })
    }

    fn match_pattern(
        &self,
        _subject: Option<&String>,
        _predicate: Option<&String>,
        _object: Option<&String>,
        _options: &(),
    ) -> StoreResult<TripleIter<'_>> {
        if self.fail_match {
            return Err(StoreError::InvalidData("store unavailable".to_string()));
        }

        let fail_at = self.fail_at;
        Ok(Box::new(self.triples.iter().enumerate().map(
            move |(index, triple)| {
                self.pulled.set(self.pulled.get() + 1);
                if Some(index) == fail_at {
                    return Err(StoreError::InvalidData(format!("corrupt row {index}")));
                }
                Ok(triple.clone())
            },
        )))
    }
}

fn structured(subject: &str, predicate: &str, object: impl Into<rdfshim_core::Term>) -> Triple {
    Triple::Structured(Statement::new(
        Resource::iri(subject),
        Resource::iri(predicate),
        object,
    ))
}

fn scenario_triples() -> Vec<Triple> {
    vec![
        structured("ex:a", "ex:p", Literal::plain("hello")),
        structured("ex:a", "ex:q", Resource::iri("ex:b")),
    ]
}

fn raw_scenario_triples() -> Vec<Triple> {
    vec![
        Triple::Raw(RawTriple::new("ex:a", "ex:p", "hello")),
        Triple::Raw(RawTriple::new("ex:a", "ex:q", "ex:b")),
    ]
}

fn numbered_triples(count: usize) -> Vec<Triple> {
    (0..count)
        .map(|index| {
            structured(
                &format!("ex:s{index}"),
                "ex:p",
                Literal::typed(index.to_string(), XSD_INTEGER),
            )
        })
        .collect()
}

fn collect_with<S: TripleStore<Matcher = String, Options = ()>>(
    adapter: &TriplePatternAdapter<S>,
    projection: &str,
) -> Vec<Projected> {
    adapter
        .collect(None, None, None, &RetrievalOptions::new(()).only(projection))
        .unwrap()
}

fn stream_all<S: TripleStore<Matcher = String, Options = ()>>(
    adapter: &TriplePatternAdapter<S>,
    projection: &str,
) -> Vec<Projected> {
    let mut delivered = Vec::new();
    let outcome = adapter
        .for_each(
            None,
            None,
            None,
            &RetrievalOptions::new(()).only(projection),
            |value| {
                delivered.push(value);
                ControlFlow::Continue(())
            },
        )
        .unwrap();
    assert!(!outcome.stopped_early);
    assert_eq!(outcome.delivered, delivered.len());
    delivered
}

#[test]
fn end_to_end_full_projection_without_visitor() {
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(scenario_triples()).unwrap();

    let retrieved = adapter
        .retrieve(None, None, None, &RetrievalOptions::new(()), None)
        .unwrap();

    assert_eq!(
        retrieved,
        Retrieved::Materialized(vec![
            Projected::Triple("ex:a".into(), "ex:p".into(), "hello".into()),
            Projected::Triple("ex:a".into(), "ex:q".into(), "ex:b".into()),
        ])
    );
}

#[test]
fn structured_and_raw_shapes_project_identically() {
    let structured = TriplePatternAdapter::<MemoryTripleStore>::open(scenario_triples()).unwrap();
    let raw = TriplePatternAdapter::<MemoryTripleStore>::open(raw_scenario_triples()).unwrap();

    for projection in ["full", "subject", "predicate", "object"] {
        assert_eq!(
            collect_with(&structured, projection),
            collect_with(&raw, projection),
            "projection `{projection}` differs between shapes"
        );
    }
}

#[test]
fn literal_object_is_unwrapped_to_its_value() {
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(vec![structured(
        "ex:a",
        "ex:count",
        Literal::typed("42", XSD_INTEGER),
    )])
    .unwrap();

    assert_eq!(
        collect_with(&adapter, "object"),
        vec![Projected::Term("42".to_string())]
    );
    assert_eq!(
        collect_with(&adapter, "full"),
        vec![Projected::Triple(
            "ex:a".into(),
            "ex:count".into(),
            "42".into()
        )]
    );
}

#[test]
fn resource_object_passes_identifier_through() {
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(vec![structured(
        "ex:a",
        "ex:link",
        Resource::iri("http://example.org/x"),
    )])
    .unwrap();

    assert_eq!(
        collect_with(&adapter, "object"),
        vec![Projected::Term("http://example.org/x".to_string())]
    );
}

#[test]
fn unknown_projection_behaves_like_full() {
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(scenario_triples()).unwrap();

    assert_eq!(collect_with(&adapter, "bogus"), collect_with(&adapter, "full"));
    assert_eq!(stream_all(&adapter, "bogus"), stream_all(&adapter, "full"));
}

#[test]
fn eager_and_streaming_modes_agree_and_keep_store_order() {
    let triples = numbered_triples(20);
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(triples).unwrap();

    let eager = collect_with(&adapter, "object");
    let streamed = stream_all(&adapter, "object");

    let expected: Vec<Projected> = (0..20)
        .map(|index| Projected::Term(index.to_string()))
        .collect();
    assert_eq!(eager, expected);
    assert_eq!(streamed, expected);
}

#[test]
fn streaming_stops_after_visitor_breaks() {
    let adapter = TriplePatternAdapter::<CountingStore>::open(numbered_triples(50)).unwrap();
    let mut delivered = Vec::new();

    let outcome = adapter
        .for_each(
            None,
            None,
            None,
            &RetrievalOptions::new(()).with_projection(Projection::Subject),
            |value| {
                delivered.push(value);
                ControlFlow::Break(())
            },
        )
        .unwrap();

    assert_eq!(delivered, vec![Projected::Term("ex:s0".to_string())]);
    assert_eq!(outcome.delivered, 1);
    assert!(outcome.stopped_early);
    assert_eq!(adapter.store().pulled.get(), 1);
}

#[test]
fn retrieve_with_visitor_stops_after_break() {
    let adapter = TriplePatternAdapter::<CountingStore>::open(numbered_triples(50)).unwrap();
    let mut delivered = Vec::new();
    let mut visitor = |value: Projected| {
        delivered.push(value);
        ControlFlow::Break(())
    };

    let retrieved = adapter
        .retrieve(
            None,
            None,
            None,
            &RetrievalOptions::new(()).only("object"),
            Some(&mut visitor),
        )
        .unwrap();

    assert_eq!(
        retrieved,
        Retrieved::Streamed(StreamOutcome {
            delivered: 1,
            stopped_early: true,
        })
    );
    assert_eq!(delivered, vec![Projected::Term("0".to_string())]);
    assert_eq!(adapter.store().pulled.get(), 1);
}

#[test]
fn dropping_a_stream_stops_pulling() {
    let adapter = TriplePatternAdapter::<CountingStore>::open(numbered_triples(10)).unwrap();

    let first_three: Vec<Projected> = adapter
        .stream(None, None, None, &RetrievalOptions::new(()).only("predicate"))
        .unwrap()
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(first_three.len(), 3);
    assert_eq!(adapter.store().pulled.get(), 3);
}

#[test]
fn match_failure_surfaces_as_retriable_backend_query_error() {
    let mut store = CountingStore::open(Vec::new()).unwrap();
    store.fail_match = true;
    let adapter = TriplePatternAdapter::new(store);

    let err = adapter
        .collect(None, None, None, &RetrievalOptions::new(()))
        .unwrap_err();
    assert!(matches!(
        err,
        AdapterError::BackendQuery(StoreError::InvalidData(ref message)) if message == "store unavailable"
    ));
    assert!(err.is_retriable());

    let mut visited = 0;
    let err = adapter
        .for_each(None, None, None, &RetrievalOptions::new(()), |_| {
            visited += 1;
            ControlFlow::Continue(())
        })
        .unwrap_err();
    assert!(matches!(err, AdapterError::BackendQuery(_)));
    assert_eq!(visited, 0);
}

#[test]
fn mid_stream_failure_ends_retrieval() {
    let mut store = CountingStore::open(numbered_triples(5)).unwrap();
    store.fail_at = Some(2);
    let adapter = TriplePatternAdapter::new(store);

    let err = adapter
        .collect(None, None, None, &RetrievalOptions::new(()))
        .unwrap_err();
    assert!(matches!(err, AdapterError::BackendQuery(StoreError::InvalidData(_))));

    let mut delivered = 0;
    let err = adapter
        .for_each(None, None, None, &RetrievalOptions::new(()), |_| {
            delivered += 1;
            ControlFlow::Continue(())
        })
        .unwrap_err();
    assert!(matches!(err, AdapterError::BackendQuery(_)));
    assert_eq!(delivered, 2);
}

#[test]
fn pattern_matchers_are_forwarded_to_store() {
    let adapter = TriplePatternAdapter::<MemoryTripleStore>::open(scenario_triples()).unwrap();
    let subject = "ex:a".to_string();
    let predicate = "ex:q".to_string();

    let objects = adapter
        .collect(
            Some(&subject),
            Some(&predicate),
            None,
            &RetrievalOptions::new(()).only("object"),
        )
        .unwrap();
    assert_eq!(objects, vec![Projected::Term("ex:b".to_string())]);

    let unmatched = "ex:zzz".to_string();
    let none = adapter
        .collect(Some(&unmatched), None, None, &RetrievalOptions::new(()))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn shared_store_serves_adapters_on_several_threads() {
    let store = Arc::new(MemoryTripleStore::open(numbered_triples(8)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let adapter = TriplePatternAdapter::new(Arc::clone(&store));
            std::thread::spawn(move || collect_with(&adapter, "subject"))
        })
        .collect();

    let expected: Vec<Projected> = (0..8)
        .map(|index| Projected::Term(format!("ex:s{index}")))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn mixed_shape_payload_fails_construction() {
    let mut triples = scenario_triples();
    triples.extend(raw_scenario_triples());

    let err = match TriplePatternAdapter::<MemoryTripleStore>::open(triples) {
        Ok(_) => panic!("mixed payload must not build a store"),
        Err(err) => err,
    };
    assert!(matches!(err, AdapterError::StoreInitialization(_)));
    assert!(!err.is_retriable());
}
