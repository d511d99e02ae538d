//! Diversity-aware retrieval
//!
//! Plain top-k similarity can hand back near-duplicate passages. Maximal
//! Marginal Relevance re-ranks a wider candidate pool so the selected
//! evidence set is both relevant to the query and low-redundancy among
//! itself.

mod mmr;
mod retriever;

pub use mmr::{maximal_marginal_relevance, MmrCandidate};
pub use retriever::Retriever;

use crate::corpus::Document;

/// Delimiter between document texts in the evidence block
pub const EVIDENCE_DELIMITER: &str = "\n\n";

/// Result of one retrieval: at most k documents plus derived views
///
/// Produced fresh per query, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Selected documents in MMR selection order (first = most relevant)
    pub documents: Vec<Document>,
    /// Distinct `source` values among the documents, first-occurrence order
    pub sources: Vec<String>,
    /// Document texts joined in selection order, used as the prompt evidence
    pub evidence_text: String,
}
