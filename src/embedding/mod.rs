//! Embedding generation
//!
//! The embedder is treated as an opaque oracle: text in, fixed-length vector
//! out, stable within one index lifetime. The trait is the seam that lets
//! tests substitute a deterministic stub for the ONNX model.

mod provider;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
