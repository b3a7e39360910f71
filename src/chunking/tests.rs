use super::estimate_token_count as estimate_token_count_impl;
use super::*;

fn doc(path: &str, content: &str) -> Document {
    Document {
        path: path.to_string(),
        content: content.to_string(),
    }
}

/// Concatenate chunks with the shared prefix of each non-first chunk removed
fn reconstruct(chunks: &[DocumentChunk], overlap: usize) -> String {
    let mut result = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            result.push_str(&chunk.content);
        } else {
            result.extend(chunk.content.chars().skip(overlap));
        }
    }
    result
}

#[test]
fn estimate_token_count() {
    assert_eq!(estimate_token_count_impl("hello world"), 2);
    assert_eq!(estimate_token_count_impl("This is a test."), 5);
    assert_eq!(estimate_token_count_impl(""), 0);
}

#[test]
fn single_chunk_for_short_input() {
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 20,
    };
    let document = doc("short.txt", "tiny document");

    let chunks = chunk_document(&document, &config).expect("chunking should succeed");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "tiny document");
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].offset, 0);
}

#[test]
fn overlapping_windows_over_250_chars() {
    // size=100, overlap=20: windows advance by 80 characters
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 20,
    };
    let input: String = ('a'..='z').cycle().take(250).collect();
    let document = doc("cycle.txt", &input);

    let chunks = chunk_document(&document, &config).expect("chunking should succeed");

    let sizes: Vec<usize> = chunks.iter().map(|c| c.content.chars().count()).collect();
    assert_eq!(sizes, vec![100, 100, 90]);

    // Each chunk shares exactly 20 characters with its predecessor
    for pair in chunks.windows(2) {
        let prev_tail: String = pair[0].content.chars().skip(80).collect();
        let next_head: String = pair[1].content.chars().take(20).collect();
        assert_eq!(prev_tail, next_head);
    }

    assert_eq!(reconstruct(&chunks, config.chunk_overlap), input);
}

#[test]
fn reconstruction_property() {
    let inputs = [
        "The quick brown fox jumps over the lazy dog. ".repeat(40),
        "a".repeat(1),
        "ab".repeat(501),
        "word ".repeat(333),
    ];
    let configs = [
        ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 0,
        },
        ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 99,
        },
        ChunkingConfig {
            chunk_size: 64,
            chunk_overlap: 16,
        },
        ChunkingConfig {
            chunk_size: 7,
            chunk_overlap: 3,
        },
    ];

    for input in &inputs {
        for config in &configs {
            let document = doc("prop.txt", input);
            let chunks = chunk_document(&document, config).expect("chunking should succeed");

            assert_eq!(
                &reconstruct(&chunks, config.chunk_overlap),
                input,
                "reconstruction failed for size={} overlap={}",
                config.chunk_size,
                config.chunk_overlap
            );

            // Every chunk except possibly the last honors the size limit
            for chunk in &chunks[..chunks.len() - 1] {
                assert_eq!(chunk.content.chars().count(), config.chunk_size);
            }
            assert!(chunks.last().expect("at least one chunk").content.chars().count() <= config.chunk_size);
        }
    }
}

#[test]
fn deterministic_output() {
    let config = ChunkingConfig::default();
    let document = doc("det.md", &"Deterministic chunking input. ".repeat(100));

    let first = chunk_document(&document, &config).expect("chunking should succeed");
    let second = chunk_document(&document, &config).expect("chunking should succeed");

    assert_eq!(first, second);
}

#[test]
fn multibyte_input_slices_on_char_boundaries() {
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 3,
    };
    let input = "héllo wörld ünïcode téxt — ça marche très bien aujourd'hui";
    let document = doc("unicode.md", input);

    let chunks = chunk_document(&document, &config).expect("chunking should succeed");

    assert_eq!(reconstruct(&chunks, config.chunk_overlap), input);
    for chunk in &chunks {
        assert!(chunk.content.chars().count() <= config.chunk_size);
        assert_eq!(&input[chunk.offset..chunk.offset + chunk.content.len()], chunk.content);
    }
}

#[test]
fn empty_document_yields_no_chunks() {
    let config = ChunkingConfig::default();
    let document = doc("empty.txt", "");

    let chunks = chunk_document(&document, &config).expect("chunking should succeed");
    assert!(chunks.is_empty());
}

#[test]
fn overlap_equal_to_size_is_a_config_error() {
    let config = ChunkingConfig {
        chunk_size: 50,
        chunk_overlap: 50,
    };
    let document = doc("bad.txt", "some content");

    let err = chunk_document(&document, &config).expect_err("chunking should fail");
    assert!(matches!(err, crate::QaError::Config(_)));
}

#[test]
fn zero_chunk_size_is_a_config_error() {
    let config = ChunkingConfig {
        chunk_size: 0,
        chunk_overlap: 0,
    };
    let document = doc("bad.txt", "some content");

    let err = chunk_document(&document, &config).expect_err("chunking should fail");
    assert!(matches!(err, crate::QaError::Config(_)));
}

#[test]
fn batch_chunking_preserves_document_order() {
    let config = ChunkingConfig {
        chunk_size: 20,
        chunk_overlap: 5,
    };
    let documents = vec![
        doc("a.txt", &"alpha ".repeat(10)),
        doc("b.txt", &"beta ".repeat(10)),
    ];

    let chunks = chunk_documents(&documents, &config).expect("chunking should succeed");

    let first_b = chunks
        .iter()
        .position(|c| c.doc_path == "b.txt")
        .expect("b.txt chunks present");
    assert!(chunks[..first_b].iter().all(|c| c.doc_path == "a.txt"));
    assert!(chunks[first_b..].iter().all(|c| c.doc_path == "b.txt"));

    // Per-document chunk indices restart at zero
    assert_eq!(chunks[first_b].chunk_index, 0);
}
