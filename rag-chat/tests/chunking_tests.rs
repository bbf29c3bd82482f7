//! Chunking contract tests: window sizes, overlap, reconstruction, and validation.

use proptest::prelude::*;
use rag_chat::{
    Chunk, Chunker, Document, FixedSizeChunker, RagError, RecursiveChunker, split_documents,
};

/// Rebuild the source text from each chunk's non-overlapping span.
fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0;
    for chunk in chunks {
        assert!(chunk.offset <= covered, "gap before chunk at offset {}", chunk.offset);
        let skip = covered - chunk.offset;
        text.extend(chunk.text.chars().skip(skip));
        covered = covered.max(chunk.offset + chunk.char_len());
    }
    text
}

fn wikipedia_style_prose(len: usize) -> String {
    let sentence = "Apple Inc. is an American multinational technology company headquartered \
                    in Cupertino, California. ";
    sentence.chars().cycle().take(len).collect()
}

#[test]
fn wikipedia_article_of_8472_chars_yields_17_chunks() {
    let document = Document::new(wikipedia_style_prose(8472)).with_id("apple");
    let chunks = split_documents(&[document], 512, 0).unwrap();

    assert_eq!(chunks.len(), 17);
    assert!(chunks[..16].iter().all(|c| c.char_len() == 512));
    assert_eq!(chunks[16].char_len(), 8472 - 16 * 512);
}

#[test]
fn overlapping_windows_run_until_the_offset_reaches_the_end() {
    let chunks = split_documents(&[Document::new("abcdefghij")], 4, 2).unwrap();

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
    assert_eq!(texts, vec!["abcd", "cdef", "efgh", "ghij", "ij"]);
    assert_eq!(offsets, vec![0, 2, 4, 6, 8]);
}

#[test]
fn overlap_equal_to_size_is_rejected() {
    let err = split_documents(&[Document::new("text")], 100, 100).unwrap_err();
    assert!(matches!(err, RagError::InvalidConfig(_)));
}

#[test]
fn zero_chunk_size_is_rejected() {
    assert!(matches!(FixedSizeChunker::new(0, 0), Err(RagError::InvalidConfig(_))));
    assert!(matches!(RecursiveChunker::new(0, 0), Err(RagError::InvalidConfig(_))));
}

#[test]
fn empty_document_produces_no_chunks() {
    let chunks = split_documents(&[Document::new("")], 10, 2).unwrap();
    assert!(chunks.is_empty());
}

#[test]
fn chunks_follow_document_order_and_inherit_metadata() {
    let first = Document::new("a".repeat(25)).with_id("first").with_metadata("source", "wiki");
    let second = Document::new("b".repeat(5)).with_id("second");

    let chunks = split_documents(&[first, second], 10, 0).unwrap();
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();

    assert_eq!(ids, vec!["first_0", "first_1", "first_2", "second_0"]);
    assert_eq!(chunks[1].metadata.get("source").map(String::as_str), Some("wiki"));
    assert_eq!(chunks[1].metadata.get("chunk_index").map(String::as_str), Some("1"));
    assert_eq!(chunks[3].document_id, "second");
    assert_eq!(chunks[3].offset, 0);
}

#[test]
fn recursive_chunker_falls_back_to_sentences_then_words() {
    let text = "One short sentence. Another short sentence. A third sentence that is long.";
    let chunker = RecursiveChunker::new(30, 0).unwrap();
    let chunks = chunker.chunk(&Document::new(text));

    assert!(chunks.iter().all(|c| c.char_len() <= 30));
    assert_eq!(chunks[0].text, "One short sentence. ");
    assert_eq!(reconstruct(&chunks), text);
}

#[test]
fn recursive_chunker_seeds_overlap_from_previous_chunk() {
    let text = "alpha beta gamma delta epsilon zeta eta theta";
    let chunker = RecursiveChunker::new(16, 4).unwrap();
    let chunks = chunker.chunk(&Document::new(text));

    for pair in chunks.windows(2) {
        let previous_end = pair[0].offset + pair[0].char_len();
        assert!(pair[1].offset < previous_end, "expected overlap between chunks");
        assert!(previous_end - pair[1].offset <= 4);
    }
    assert_eq!(reconstruct(&chunks), text);
}

/// **Chunking bounds and reconstruction**
/// *For any* text and any `chunk_overlap < chunk_size`, every chunk is
/// non-empty and at most `chunk_size` characters, and the chunks' unique spans
/// concatenate back to the source text.
mod prop_chunking {
    use super::*;

    fn arb_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,300}",
            "[a-zé .!?\n]{0,300}",
            proptest::collection::vec("[A-Za-z]{1,12}[.!?]? ", 0..60).prop_map(|w| w.concat()),
        ]
    }

    fn arb_window() -> impl Strategy<Value = (usize, usize)> {
        (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn fixed_chunks_are_bounded_and_reconstruct(text in arb_text(), (size, overlap) in arb_window()) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new(text.clone()));

            for chunk in &chunks {
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(chunk.char_len() <= size);
            }
            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[1].offset - pair[0].offset, size - overlap);
                let shared = pair[0].offset + pair[0].char_len() - pair[1].offset;
                prop_assert_eq!(shared, overlap.min(pair[1].char_len()));
            }
            let step = size - overlap;
            prop_assert_eq!(chunks.len(), text.chars().count().div_ceil(step));
            prop_assert_eq!(reconstruct(&chunks), text);
        }

        #[test]
        fn recursive_chunks_are_bounded_and_reconstruct(text in arb_text(), (size, overlap) in arb_window()) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new(text.clone()));

            for chunk in &chunks {
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(chunk.char_len() <= size);
            }
            prop_assert_eq!(reconstruct(&chunks), text);
        }

        #[test]
        fn overlap_at_or_above_size_always_fails(size in 1usize..64, extra in 0usize..16) {
            let result = split_documents(&[Document::new("some text")], size, size + extra);
            prop_assert!(matches!(result, Err(RagError::InvalidConfig(_))));
        }
    }
}
