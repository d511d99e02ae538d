//! Integration test: corpus loading and index persistence
//!
//! Covers the offline pipeline from raw files on disk through a persisted
//! snapshot and back, including the Latin-1 decode fallback and the
//! embedder-identity cross-check on load.

use ragline::corpus::load_corpus;
use ragline::embedding::{EmbeddingError, EmbeddingProvider};
use ragline::error::RaglineError;
use ragline::index::{build_and_persist, VectorIndex};
use tempfile::TempDir;

/// Embedder that hashes text bytes into a fixed-dimension vector; opaque but
/// fully deterministic, as the engine requires
struct HashEmbedder {
    name: &'static str,
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; 4];
        for (i, b) in text.bytes().enumerate() {
            vector[i % 4] += b as f32 / 255.0;
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        self.name
    }
}

#[test]
fn test_pipeline_roundtrip_is_search_consistent() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("returns.md"), "Returns are accepted within 30 days.").unwrap();
    std::fs::write(corpus.join("shipping.md"), "Orders ship within 2 business days.").unwrap();
    std::fs::write(corpus.join("warranty.md"), "The warranty covers manufacturing defects.").unwrap();

    let embedder = HashEmbedder { name: "hash-v1" };
    let index_path = temp.path().join("data").join("index.json");

    let built = build_and_persist(&corpus, &embedder, &index_path, 2).unwrap();
    assert_eq!(built.len(), 3);

    let loaded = VectorIndex::load(&index_path, &embedder).unwrap();

    // Same queries must rank and score identically across the round-trip
    let queries = ["how do returns work", "when does my order ship", "zzz"];
    for query in queries {
        let vector = embedder.embed(query).unwrap();
        let before: Vec<(u64, f32)> = built
            .search(&vector, 3)
            .unwrap()
            .into_iter()
            .map(|h| (h.document.id, h.score))
            .collect();
        let after: Vec<(u64, f32)> = loaded
            .search(&vector, 3)
            .unwrap()
            .into_iter()
            .map(|h| (h.document.id, h.score))
            .collect();
        assert_eq!(before, after);
    }
}

#[test]
fn test_load_rejects_foreign_embedder() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("doc.txt"), "content").unwrap();

    let index_path = temp.path().join("index.json");
    build_and_persist(&corpus, &HashEmbedder { name: "hash-v1" }, &index_path, 8).unwrap();

    let result = VectorIndex::load(&index_path, &HashEmbedder { name: "hash-v2" });
    match result {
        Err(RaglineError::EmbedderMismatch { indexed, current }) => {
            assert_eq!(indexed, "hash-v1");
            assert_eq!(current, "hash-v2");
        }
        other => panic!("expected EmbedderMismatch, got {:?}", other.map(|i| i.len())),
    }
}

#[test]
fn test_load_before_index_is_not_ready() {
    let temp = TempDir::new().unwrap();
    let result = VectorIndex::load(
        &temp.path().join("never-built.json"),
        &HashEmbedder { name: "hash-v1" },
    );
    assert!(matches!(result, Err(RaglineError::IndexNotReady(_))));
}

#[test]
fn test_corpus_with_invalid_utf8_file_indexes() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("plain.txt"), "ordinary text").unwrap();
    // 0xFC is 'ü' in Latin-1 and invalid UTF-8 on its own
    std::fs::write(corpus.join("legacy.txt"), [0x4D, 0xFC, 0x6E, 0x63, 0x68, 0x65, 0x6E]).unwrap();

    let docs = load_corpus(&corpus).unwrap();
    assert_eq!(docs.len(), 2);

    let legacy = docs.iter().find(|d| d.source == "legacy.txt").unwrap();
    assert_eq!(legacy.text, "München");

    // And the decoded document embeds and indexes like any other
    let embedder = HashEmbedder { name: "hash-v1" };
    let index = VectorIndex::build(docs, &embedder, 8).unwrap();
    assert_eq!(index.len(), 2);
}

#[test]
fn test_missing_corpus_directory_is_fatal() {
    let temp = TempDir::new().unwrap();
    let embedder = HashEmbedder { name: "hash-v1" };
    let result = build_and_persist(
        &temp.path().join("no-such-corpus"),
        &embedder,
        &temp.path().join("index.json"),
        8,
    );
    assert!(matches!(
        result,
        Err(RaglineError::CorpusUnavailable { .. })
    ));
}

#[test]
fn test_rebuild_swaps_snapshot_in_place() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("a.txt"), "first version").unwrap();

    let embedder = HashEmbedder { name: "hash-v1" };
    let index_path = temp.path().join("index.json");

    build_and_persist(&corpus, &embedder, &index_path, 8).unwrap();

    // Grow the corpus and rebuild wholesale onto the same location
    std::fs::write(corpus.join("b.txt"), "second document").unwrap();
    build_and_persist(&corpus, &embedder, &index_path, 8).unwrap();

    let loaded = VectorIndex::load(&index_path, &embedder).unwrap();
    assert_eq!(loaded.len(), 2);

    // No temp artifact left beside the snapshot
    assert!(!index_path.with_extension("json.tmp").exists());
}
