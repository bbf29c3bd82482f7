//! In-memory vector index tests: ranking, tie-breaks, dimensions, and emptiness.

mod common;

use std::collections::HashMap;

use common::chunk;
use proptest::prelude::*;
use rag_chat::{Chunk, EntryId, InMemoryVectorIndex, RagError, VectorIndex, cosine_similarity};

#[tokio::test]
async fn search_on_empty_index_fails() {
    let index = InMemoryVectorIndex::new();
    let err = index.search(&[1.0, 0.0], 3).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyIndex));
}

#[tokio::test]
async fn insert_with_wrong_dimension_fails_and_inserts_nothing() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("a", "a"), vec![1.0, 0.0, 0.0])]).await.unwrap();

    let err = index
        .insert(vec![(chunk("b", "b"), vec![0.0, 1.0, 0.0]), (chunk("c", "c"), vec![1.0, 1.0])])
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
    assert_eq!(index.len().await, 1);
}

#[tokio::test]
async fn first_batch_fixes_the_dimension() {
    let index = InMemoryVectorIndex::new();
    let err = index
        .insert(vec![(chunk("a", "a"), vec![1.0, 0.0]), (chunk("b", "b"), vec![1.0, 0.0, 0.0])])
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
    assert!(index.is_empty().await);
    assert_eq!(index.dimensions().await, None);
}

#[tokio::test]
async fn search_with_wrong_dimension_fails() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("a", "a"), vec![1.0, 0.0, 0.0])]).await.unwrap();

    let err = index.search(&[1.0, 0.0], 1).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
}

#[tokio::test]
async fn non_finite_vectors_are_rejected_before_anything_is_stored() {
    let index = InMemoryVectorIndex::new();

    let entries =
        vec![(chunk("ok", "ok"), vec![1.0, 0.0]), (chunk("nan", "nan"), vec![f32::NAN, 1.0])];
    let err = index.insert(entries).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidConfig(ref m) if m.contains("nan")));
    assert!(index.is_empty().await);
    assert_eq!(index.dimensions().await, None);

    let err = index.insert(vec![(chunk("inf", "inf"), vec![f32::INFINITY, 0.0])]).await;
    assert!(matches!(err, Err(RagError::InvalidConfig(_))));
}

#[tokio::test]
async fn non_finite_query_is_rejected() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("a", "a"), vec![1.0, 0.0])]).await.unwrap();

    let err = index.search(&[f32::NAN, 0.0], 1).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidConfig(_)));
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("a", "a"), vec![1.0])]).await.unwrap();
    assert!(matches!(index.search(&[1.0], 0).await, Err(RagError::InvalidConfig(_))));
}

#[tokio::test]
async fn identical_vectors_tie_in_insertion_order() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("other", "other"), vec![0.0, 1.0])]).await.unwrap();
    index.insert(vec![(chunk("first", "first"), vec![0.6, 0.8])]).await.unwrap();
    index.insert(vec![(chunk("second", "second"), vec![0.6, 0.8])]).await.unwrap();

    let results = index.search(&[0.6, 0.8], 3).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();

    assert_eq!(ids, vec!["first", "second", "other"]);
    assert_eq!(results[0].score, results[1].score);
}

#[tokio::test]
async fn ids_increase_in_insertion_order() {
    let index = InMemoryVectorIndex::new();
    let first = index
        .insert(vec![(chunk("a", "a"), vec![1.0]), (chunk("b", "b"), vec![2.0])])
        .await
        .unwrap();
    let second = index.insert(vec![(chunk("c", "c"), vec![3.0])]).await.unwrap();

    assert_eq!(first, vec![EntryId(0), EntryId(1)]);
    assert_eq!(second, vec![EntryId(2)]);
    let stored: Vec<EntryId> = index.entries().await.iter().map(|e| e.id).collect();
    assert_eq!(stored, vec![EntryId(0), EntryId(1), EntryId(2)]);
}

#[tokio::test]
async fn clear_allows_a_rebuild_with_a_new_dimension() {
    let index = InMemoryVectorIndex::new();
    index.insert(vec![(chunk("a", "a"), vec![1.0, 0.0])]).await.unwrap();
    index.clear().await;

    assert!(matches!(index.search(&[1.0, 0.0], 1).await, Err(RagError::EmptyIndex)));
    index.insert(vec![(chunk("b", "b"), vec![1.0, 0.0, 0.0])]).await.unwrap();
    assert_eq!(index.dimensions().await, Some(3));
}

#[tokio::test]
async fn concurrent_inserts_are_all_recorded() {
    let index = std::sync::Arc::new(InMemoryVectorIndex::new());
    let mut handles = Vec::new();
    for task in 0..8 {
        let index = index.clone();
        handles.push(tokio::spawn(async move {
            let entries = (0..10)
                .map(|i| (chunk(&format!("{task}_{i}"), "text"), vec![task as f32, i as f32, 1.0]))
                .collect();
            index.insert(entries).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().len(), 10);
    }

    let mut ids: Vec<EntryId> = index.entries().await.iter().map(|e| e.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 80);
}

#[test]
fn cosine_similarity_is_scale_invariant() {
    let a = [1.0, 2.0, 3.0];
    let b = [2.0, 4.0, 6.0];
    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&a, &[-1.0, -2.0, -3.0]) + 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
}

/// Generate a non-zero embedding of the given dimension.
fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
        .prop_filter("non-zero embedding", |v| v.iter().map(|x| x * x).sum::<f32>() > 1e-8)
}

/// Generate a chunk with a random id and text.
fn arb_chunk() -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}").prop_map(|(id, text)| Chunk {
        id,
        text,
        metadata: HashMap::new(),
        document_id: "doc_1".to_string(),
        offset: 0,
    })
}

/// **In-memory index search ordering**
/// *For any* set of entries and query, `search` returns `min(k, N)` results in
/// descending cosine similarity, and with `k >= N` every entry is returned.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            entries in proptest::collection::vec((arb_chunk(), arb_embedding(DIM)), 1..20),
            query in arb_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let count = entries.len();
            let results = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                index.insert(entries.clone()).await.unwrap();
                index.search(&query, k).await.unwrap()
            });

            prop_assert_eq!(results.len(), k.min(count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }

            if k >= count {
                let mut expected: Vec<f32> =
                    entries.iter().map(|(_, v)| cosine_similarity(v, &query)).collect();
                expected.sort_by(|a, b| b.total_cmp(a));
                let actual: Vec<f32> = results.iter().map(|r| r.score).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
