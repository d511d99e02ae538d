//! Maximal Marginal Relevance selection

use crate::index::cosine_similarity;

/// One entry of the candidate pool, in descending query-similarity rank
#[derive(Debug, Clone, Copy)]
pub struct MmrCandidate<'a> {
    /// The candidate's stored embedding
    pub vector: &'a [f32],
    /// Cosine similarity between the candidate and the query
    pub query_similarity: f32,
}

/// Select up to `k` candidates trading relevance against redundancy
///
/// Each round scores every unselected candidate as
/// `lambda * sim(d, query) - (1 - lambda) * max_s sim(d, s)` over the
/// already-selected set `s` (the penalty is 0 on the first pick, which is
/// therefore pure relevance). The highest score wins; ties go to the earlier
/// pool rank. Returns `min(k, pool size)` pool indices in selection order.
///
/// Fully deterministic: same pool, same `lambda`, same result.
pub fn maximal_marginal_relevance(
    candidates: &[MmrCandidate<'_>],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_slot = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (slot, &idx) in remaining.iter().enumerate() {
            let candidate = &candidates[idx];

            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(candidate.vector, candidates[s].vector))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * candidate.query_similarity - (1.0 - lambda) * redundancy;

            // Strictly greater: ties keep the earlier pool rank
            if score > best_score {
                best_score = score;
                best_slot = slot;
            }
        }

        selected.push(remaining.remove(best_slot));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool<'a>(entries: &'a [(Vec<f32>, f32)]) -> Vec<MmrCandidate<'a>> {
        entries
            .iter()
            .map(|(v, s)| MmrCandidate {
                vector: v,
                query_similarity: *s,
            })
            .collect()
    }

    #[test]
    fn test_first_pick_is_pure_relevance() {
        let entries = vec![
            (vec![1.0, 0.0], 0.9),
            (vec![0.0, 1.0], 0.95),
            (vec![0.5, 0.5], 0.3),
        ];
        let candidates = pool(&entries);

        let picked = maximal_marginal_relevance(&candidates, 1, 0.5);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn test_diversity_penalty_skips_near_duplicate() {
        // Pool rank order: near-duplicate pair first, distinct doc last.
        // With lambda < 1 the distinct doc must be picked second.
        let entries = vec![
            (vec![1.0, 0.0], 0.95),
            (vec![0.999, 0.04], 0.94),
            (vec![0.0, 1.0], 0.5),
        ];
        let candidates = pool(&entries);

        let picked = maximal_marginal_relevance(&candidates, 2, 0.5);
        assert_eq!(picked, vec![0, 2]);
    }

    #[test]
    fn test_lambda_one_is_plain_relevance_order() {
        let entries = vec![
            (vec![1.0, 0.0], 0.95),
            (vec![0.999, 0.04], 0.94),
            (vec![0.0, 1.0], 0.5),
        ];
        let candidates = pool(&entries);

        let picked = maximal_marginal_relevance(&candidates, 3, 1.0);
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn test_returns_min_k_pool() {
        let entries = vec![(vec![1.0, 0.0], 0.9), (vec![0.0, 1.0], 0.8)];
        let candidates = pool(&entries);

        assert_eq!(maximal_marginal_relevance(&candidates, 5, 0.5).len(), 2);
        assert_eq!(maximal_marginal_relevance(&candidates, 0, 0.5).len(), 0);
        assert_eq!(maximal_marginal_relevance(&[], 3, 0.5).len(), 0);
    }

    #[test]
    fn test_ties_break_by_pool_rank() {
        // Identical candidates: selection must follow pool order, never
        // anything position-dependent or random
        let entries = vec![
            (vec![1.0, 0.0], 0.9),
            (vec![1.0, 0.0], 0.9),
            (vec![1.0, 0.0], 0.9),
        ];
        let candidates = pool(&entries);

        let picked = maximal_marginal_relevance(&candidates, 3, 0.5);
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn test_deterministic() {
        let entries = vec![
            (vec![0.9, 0.1, 0.2], 0.8),
            (vec![0.85, 0.2, 0.1], 0.75),
            (vec![0.1, 0.9, 0.3], 0.6),
            (vec![0.2, 0.1, 0.9], 0.55),
        ];
        let candidates = pool(&entries);

        let first = maximal_marginal_relevance(&candidates, 3, 0.7);
        for _ in 0..10 {
            assert_eq!(maximal_marginal_relevance(&candidates, 3, 0.7), first);
        }
    }
}
