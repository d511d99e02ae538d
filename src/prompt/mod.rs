//! Context assembly
//!
//! Pure string composition: preamble, then evidence, then history, then the
//! new user message. The ordering is the contract here (recency of context
//! matches recency of relevance); the preamble wording is caller-owned
//! policy, with a sensible default below.

use crate::memory::Turn;

/// Default instructional preamble
///
/// Constrains the model to the supplied evidence, names the explicit
/// insufficient-context fallback sentence, requires markdown output, and
/// keeps inline image references verbatim.
pub const DEFAULT_PREAMBLE: &str = "\
You are an expert assistant specialized in answering questions strictly based on the provided context.

* Use only the information provided in the context to generate your response.
* Do not rely on external knowledge, assumptions, or personal opinions.
* If the answer is not found in the context or cannot be fully deduced from it, explicitly respond:
  \"The provided context does not contain enough information to answer the question.\"
* Do not fabricate any information that is not found in the context.
* If the context provides partial information, clearly state that in your response.
* The response format must be in Markdown.
* If the context contains image references in Markdown format (e.g., ![alt text](image_1.png)), \
include them verbatim in appropriate locations.
* Maintain a neutral and factual tone.";

/// Compose the full prompt body
///
/// Invariant: evidence appears before history, history before the new user
/// message. History renders as alternating `User:` / `Bot:` lines in
/// chronological order. Deterministic; no retrieval or memory logic here.
pub fn assemble(preamble: &str, evidence_text: &str, history: &[Turn], user_message: &str) -> String {
    let history_block = history
        .iter()
        .map(|turn| format!("User: {}\nBot: {}", turn.user_message, turn.bot_response))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{preamble}\n\nDocumentation Context:\n{evidence_text}\n\nChat History:\n{history_block}\n\nUser: {user_message}\nAssistant:"
    )
}
