//! Corpus loading
//!
//! Turns a directory of source files into documents ready for embedding.
//! One document per regular file, non-recursive, visited in sorted filename
//! order so document ids are stable across rebuilds.

use crate::error::{RaglineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single corpus document
///
/// Immutable once indexed: the index is a batch artifact, rebuilt wholesale
/// rather than updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Insertion-order id assigned by the loader
    pub id: u64,
    /// Decoded file contents
    pub text: String,
    /// Base name of the originating file
    pub source: String,
}

/// Outcome of the two-step decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedText {
    /// Bytes were valid UTF-8
    Utf8(String),
    /// Bytes were decoded via the Latin-1 fallback (total, maps every byte)
    Latin1(String),
}

impl DecodedText {
    pub fn into_string(self) -> String {
        match self {
            DecodedText::Utf8(s) | DecodedText::Latin1(s) => s,
        }
    }
}

/// Decode raw bytes, preferring UTF-8 with a Latin-1 fallback
///
/// Latin-1 maps every byte value to a scalar, so the fallback always
/// succeeds; the tag tells the caller which path was taken.
pub fn decode_text(raw: Vec<u8>) -> DecodedText {
    match String::from_utf8(raw) {
        Ok(s) => DecodedText::Utf8(s),
        Err(e) => {
            let s = e.into_bytes().iter().map(|&b| b as char).collect();
            DecodedText::Latin1(s)
        }
    }
}

/// Load every regular file directly inside `dir` as a document
///
/// A missing or unreadable directory is fatal (`CorpusUnavailable`). A read
/// failure on an individual file propagates rather than silently dropping
/// the file from the corpus.
pub fn load_corpus(dir: &Path) -> Result<Vec<Document>> {
    let entries = std::fs::read_dir(dir).map_err(|e| RaglineError::CorpusUnavailable {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RaglineError::CorpusUnavailable {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.path().is_file() {
            paths.push(entry.path());
        }
    }

    // read_dir order is platform-dependent; sort for deterministic ids
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for (id, path) in paths.iter().enumerate() {
        let raw = std::fs::read(path).map_err(|e| RaglineError::Io {
            source: e,
            context: format!("Failed to read corpus file: {}", path.display()),
        })?;

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = match decode_text(raw) {
            DecodedText::Utf8(s) => s,
            DecodedText::Latin1(s) => {
                tracing::warn!("File {} is not valid UTF-8, decoded as Latin-1", source);
                s
            }
        };

        documents.push(Document {
            id: id as u64,
            text,
            source,
        });
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), dir.display());

    Ok(documents)
}
