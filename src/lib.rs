//! Ragline - Retrieval-Augmented Context Engine
//!
//! Grounds a generative chat assistant in a fixed document corpus: an offline
//! pipeline embeds and indexes the corpus, an online MMR retriever selects a
//! bounded, non-redundant evidence set per query, and a session-scoped
//! conversation memory is merged with that evidence into a single prompt.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod retrieval;

pub use error::{RaglineError, Result};
