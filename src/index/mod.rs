//! Vector index: build, persist, load, search
//!
//! An exact flat index over the corpus. Every document's vector is stored
//! alongside its text and source; search is a full cosine scan. Exactness is
//! deliberate: descending-similarity order with insertion-order tie-breaking
//! and a bit-for-bit persistence round-trip are part of the contract, which
//! rules out approximate neighbor structures.

use crate::corpus::{load_corpus, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RaglineError, Result};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Snapshot format version, bumped on incompatible layout changes
const SNAPSHOT_VERSION: u32 = 1;

/// Cosine similarity between two vectors
///
/// Range [-1, 1]; zero-magnitude vectors compare as 0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let denom = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        a.dot(&b) / denom
    }
}

/// A search result: a document reference with its query similarity
#[derive(Debug, Clone)]
pub struct ScoredDocument<'a> {
    /// The matched document
    pub document: &'a Document,
    /// Cosine similarity to the query vector
    pub score: f32,
    /// Position in insertion order, used to fetch the stored vector
    pub pos: usize,
}

/// Durable on-disk form of the index
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    schema_version: u32,
    /// Identity of the embedding model that produced the vectors
    model: String,
    dimension: usize,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

/// Exact flat vector index
///
/// Read-only after build/load; concurrent searches need no locking.
pub struct VectorIndex {
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    model_name: String,
}

impl VectorIndex {
    /// Embed every document and build the index
    ///
    /// Embedding runs in batches of `batch_size`. After build, every input
    /// document is retrievable with exactly the vector stored here; search
    /// never re-embeds.
    pub fn build(
        documents: Vec<Document>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let mut vectors = Vec::with_capacity(documents.len());

        for chunk in documents.chunks(batch_size) {
            let texts: Vec<String> = chunk.iter().map(|d| d.text.clone()).collect();
            let embedded = provider.embed_batch(&texts)?;
            vectors.extend(embedded);
            tracing::debug!("Embedded {}/{} documents", vectors.len(), documents.len());
        }

        tracing::info!(
            "Built index: {} documents, {}D vectors ({})",
            documents.len(),
            provider.dimension(),
            provider.model_name()
        );

        Ok(Self {
            documents,
            vectors,
            dimension: provider.dimension(),
            model_name: provider.model_name().to_string(),
        })
    }

    /// Search for the `n` most similar documents
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// insertion order (the sort is stable over a list already in insertion
    /// order). Returns every document when the index holds fewer than `n`.
    pub fn search(&self, query: &[f32], n: usize) -> Result<Vec<ScoredDocument<'_>>> {
        if query.len() != self.dimension {
            return Err(RaglineError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<ScoredDocument<'_>> = self
            .documents
            .iter()
            .enumerate()
            .map(|(pos, document)| ScoredDocument {
                document,
                score: cosine_similarity(query, &self.vectors[pos]),
                pos,
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(n);

        Ok(hits)
    }

    /// Stored vector for a document position
    pub fn vector(&self, pos: usize) -> &[f32] {
        &self.vectors[pos]
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Identity of the embedding model that built this index
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Write the index snapshot to `path`
    ///
    /// Writes to a temp file beside the target and renames into place, so a
    /// reader loading from `path` never observes a half-written snapshot and
    /// a rebuild can swap under a serving process.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| RaglineError::Io {
                    source: e,
                    context: format!("Failed to create index directory: {}", parent.display()),
                })?;
            }
        }

        let snapshot = IndexSnapshot {
            schema_version: SNAPSHOT_VERSION,
            model: self.model_name.clone(),
            dimension: self.dimension,
            documents: self.documents.clone(),
            vectors: self.vectors.clone(),
        };

        let content = serde_json::to_vec(&snapshot).map_err(|e| RaglineError::Json {
            source: e,
            context: "Failed to serialize index snapshot".to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(|e| RaglineError::Io {
            source: e,
            context: format!("Failed to write index snapshot: {}", tmp_path.display()),
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| RaglineError::Io {
            source: e,
            context: format!("Failed to move index snapshot into place: {}", path.display()),
        })?;

        tracing::info!("Persisted index ({} documents) to {}", self.len(), path.display());

        Ok(())
    }

    /// Load a persisted index
    ///
    /// Refuses a snapshot built by a different embedding model: queries will
    /// be embedded by `provider`, and mixing embedding spaces is undefined
    /// behavior, not a soft degradation.
    pub fn load(path: &Path, provider: &dyn EmbeddingProvider) -> Result<Self> {
        if !path.exists() {
            return Err(RaglineError::IndexNotReady(format!(
                "no index snapshot at {}; run the indexing pipeline first",
                path.display()
            )));
        }

        let content = std::fs::read(path).map_err(|e| RaglineError::Io {
            source: e,
            context: format!("Failed to read index snapshot: {}", path.display()),
        })?;
        let snapshot: IndexSnapshot =
            serde_json::from_slice(&content).map_err(|e| RaglineError::Json {
                source: e,
                context: format!("Failed to parse index snapshot: {}", path.display()),
            })?;

        if snapshot.model != provider.model_name() {
            return Err(RaglineError::EmbedderMismatch {
                indexed: snapshot.model,
                current: provider.model_name().to_string(),
            });
        }
        if snapshot.dimension != provider.dimension() {
            return Err(RaglineError::DimensionMismatch {
                expected: snapshot.dimension,
                actual: provider.dimension(),
            });
        }

        tracing::info!(
            "Loaded index: {} documents, {}D vectors ({})",
            snapshot.documents.len(),
            snapshot.dimension,
            snapshot.model
        );

        Ok(Self {
            documents: snapshot.documents,
            vectors: snapshot.vectors,
            dimension: snapshot.dimension,
            model_name: snapshot.model,
        })
    }
}

/// Offline indexing pipeline: load corpus, embed, persist
pub fn build_and_persist(
    corpus_dir: &Path,
    provider: &dyn EmbeddingProvider,
    index_path: &Path,
    batch_size: usize,
) -> Result<VectorIndex> {
    let documents = load_corpus(corpus_dir)?;
    let index = VectorIndex::build(documents, provider, batch_size)?;
    index.persist(index_path)?;
    Ok(index)
}
