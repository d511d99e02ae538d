//! MMR retriever over the vector index

use crate::error::{RaglineError, Result};
use crate::index::VectorIndex;
use crate::retrieval::{maximal_marginal_relevance, MmrCandidate, RetrievalResult, EVIDENCE_DELIMITER};
use std::sync::Arc;

/// Diversity-aware retriever
///
/// Holds the read-only index for the serving lifetime. `lambda` is the
/// relevance/diversity trade-off weight in [0, 1], fixed at construction
/// rather than per call.
pub struct Retriever {
    index: Arc<VectorIndex>,
    lambda: f32,
}

impl Retriever {
    /// Default diversity/relevance trade-off: equal weight
    pub const DEFAULT_LAMBDA: f32 = 0.5;

    pub fn new(index: Arc<VectorIndex>, lambda: f32) -> Self {
        Self { index, lambda }
    }

    /// The underlying index
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Retrieve up to `k` relevant, mutually diverse documents
    ///
    /// Pulls the top-`fetch_k` candidate pool by raw similarity, then runs
    /// MMR over it. Bounds are checked before the index is touched; a
    /// violation fails fast with `InvalidRetrievalBounds`. Returns exactly
    /// `min(k, pool size)` documents, fewer than `k` only when the index
    /// itself holds fewer.
    pub fn retrieve(&self, query: &[f32], k: usize, fetch_k: usize) -> Result<RetrievalResult> {
        if k < 1 || fetch_k < k {
            return Err(RaglineError::InvalidRetrievalBounds { k, fetch_k });
        }

        let pool = self.index.search(query, fetch_k)?;

        let candidates: Vec<MmrCandidate<'_>> = pool
            .iter()
            .map(|hit| MmrCandidate {
                vector: self.index.vector(hit.pos),
                query_similarity: hit.score,
            })
            .collect();

        let picked = maximal_marginal_relevance(&candidates, k, self.lambda);

        let documents: Vec<_> = picked
            .iter()
            .map(|&i| pool[i].document.clone())
            .collect();

        let mut sources: Vec<String> = Vec::new();
        for doc in &documents {
            if !sources.contains(&doc.source) {
                sources.push(doc.source.clone());
            }
        }

        let evidence_text = documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(EVIDENCE_DELIMITER);

        tracing::debug!(
            "Retrieved {} documents from pool of {} (k={}, fetch_k={}, lambda={})",
            documents.len(),
            pool.len(),
            k,
            fetch_k,
            self.lambda
        );

        Ok(RetrievalResult {
            documents,
            sources,
            evidence_text,
        })
    }
}
