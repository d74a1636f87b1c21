//! Fusion infrastructure for combining search results
//!
//! This module provides:
//! - Fuser trait for pluggable fusion algorithms
//! - RRFFuser: Reciprocal Rank Fusion (default)
//! - weighted_rrf_fuse: multi-query fusion with per-list weights
//!
//! See `docs/architecture/M6_ARCHITECTURE.md` for authoritative specification.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use strata_core::PrimitiveType;
use strata_engine::search::{EntityRef, SearchHit, SearchResponse};

// ============================================================================
// FusedResult
// ============================================================================

/// Result of fusing multiple primitive search results
#[derive(Debug, Clone)]
pub struct FusedResult {
    /// Final ranked list of hits
    pub hits: Vec<SearchHit>,
    /// Whether results were truncated
    pub truncated: bool,
}

impl FusedResult {
    /// Create a new FusedResult
    pub fn new(hits: Vec<SearchHit>, truncated: bool) -> Self {
        FusedResult { hits, truncated }
    }
}

// ============================================================================
// Fuser Trait
// ============================================================================

/// Pluggable fusion interface
///
/// Fusers combine search results from multiple primitives into a single
/// ranked list. Different algorithms can prioritize different factors.
///
/// # Thread Safety
///
/// Fusers must be Send + Sync for concurrent search operations.
///
/// # Implementation Notes
///
/// RRFFuser (Reciprocal Rank Fusion) is the default and only built-in fuser.
pub trait Fuser: Send + Sync {
    /// Fuse results from multiple primitives
    ///
    /// Takes a list of (primitive, results) pairs and returns a combined
    /// ranked list truncated to k items.
    fn fuse(&self, results: Vec<(PrimitiveType, SearchResponse)>, k: usize) -> FusedResult;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// Shared RRF helpers
// ============================================================================

/// Sort scored entries by RRF score with deterministic tie-breaking.
///
/// Tie-breaking order:
/// 1. RRF score descending
/// 2. Original hit score descending (from first occurrence)
/// 3. EntityRef hash for stable ordering
fn sort_rrf_scored(scored: &mut [(EntityRef, f32)], hit_data: &HashMap<EntityRef, SearchHit>) {
    scored.sort_by(|a, b| match b.1.partial_cmp(&a.1) {
        Some(std::cmp::Ordering::Equal) | None => {
            let orig_a = hit_data.get(&a.0).map(|h| h.score).unwrap_or(0.0);
            let orig_b = hit_data.get(&b.0).map(|h| h.score).unwrap_or(0.0);
            match orig_b.partial_cmp(&orig_a) {
                Some(std::cmp::Ordering::Equal) | None => {
                    let hash_a = {
                        let mut hasher = DefaultHasher::new();
                        a.0.hash(&mut hasher);
                        hasher.finish()
                    };
                    let hash_b = {
                        let mut hasher = DefaultHasher::new();
                        b.0.hash(&mut hasher);
                        hasher.finish()
                    };
                    hash_a.cmp(&hash_b)
                }
                Some(ord) => ord,
            }
        }
        Some(ord) => ord,
    });
}

/// Build a ranked FusedResult from sorted RRF scores.
fn build_ranked_result(
    scored: Vec<(EntityRef, f32)>,
    mut hit_data: HashMap<EntityRef, SearchHit>,
    k: usize,
) -> FusedResult {
    let truncated = scored.len() > k;
    let hits: Vec<SearchHit> = scored
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, (doc_ref, rrf_score))| {
            let mut hit = hit_data
                .remove(&doc_ref)
                .expect("invariant violation: scored doc_ref must exist in hit_data");
            hit.score = rrf_score;
            hit.rank = (i + 1) as u32;
            hit
        })
        .collect();
    FusedResult::new(hits, truncated)
}

// ============================================================================
// RRFFuser
// ============================================================================

/// Reciprocal Rank Fusion (RRF)
///
/// RRF Score = sum(1 / (k + rank)) across all lists
/// Where k is a smoothing constant (default 60).
///
/// This fuser excels at combining results from different ranking algorithms
/// (e.g., keyword + vector search).
///
/// # Algorithm
///
/// For each document appearing in any list:
/// - Calculate RRF contribution: 1 / (k_rrf + rank)
/// - Sum contributions across all lists
/// - Higher RRF score = higher final rank
///
/// # Example
///
/// ```text
/// Given:
///   - List A: [doc1@rank1, doc2@rank2, doc3@rank3]
///   - List B: [doc2@rank1, doc4@rank2, doc1@rank3]
///   - k_rrf = 60
///
/// RRF scores:
///   doc1: 1/(60+1) + 1/(60+3) = 0.0164 + 0.0159 = 0.0323
///   doc2: 1/(60+2) + 1/(60+1) = 0.0161 + 0.0164 = 0.0325  <- highest
///   doc3: 1/(60+3) = 0.0159
///   doc4: 1/(60+2) = 0.0161
///
/// Final ranking: [doc2, doc1, doc4, doc3]
/// ```
#[derive(Debug, Clone)]
pub struct RRFFuser {
    /// Smoothing constant (default 60)
    k_rrf: u32,
}

impl Default for RRFFuser {
    fn default() -> Self {
        RRFFuser { k_rrf: 60 }
    }
}

impl RRFFuser {
    /// Create a new RRFFuser with custom k value
    pub fn new(k_rrf: u32) -> Self {
        RRFFuser { k_rrf }
    }

    /// Get the k parameter
    pub fn k_rrf(&self) -> u32 {
        self.k_rrf
    }
}

impl Fuser for RRFFuser {
    fn fuse(&self, results: Vec<(PrimitiveType, SearchResponse)>, k: usize) -> FusedResult {
        let mut rrf_scores: HashMap<EntityRef, f32> = HashMap::new();
        let mut hit_data: HashMap<EntityRef, SearchHit> = HashMap::new();

        for (_primitive, response) in results {
            for hit in response.hits {
                let rrf_contribution = 1.0 / (self.k_rrf as f32 + hit.rank as f32);
                *rrf_scores.entry(hit.doc_ref.clone()).or_insert(0.0) += rrf_contribution;
                hit_data.entry(hit.doc_ref.clone()).or_insert(hit);
            }
        }

        let mut scored: Vec<_> = rrf_scores.into_iter().collect();
        sort_rrf_scored(&mut scored, &hit_data);
        build_ranked_result(scored, hit_data, k)
    }

    fn name(&self) -> &str {
        "rrf"
    }
}

// ============================================================================
// Score-based merge (for single-signal keyword search)
// ============================================================================

/// Merge multiple primitive result lists by raw score (no fusion).
///
/// Used for keyword-only search where all primitives use the same BM25 scorer
/// and scores are directly comparable. Simply concatenates, deduplicates,
/// sorts by score descending, and truncates to top_k.
pub fn merge_by_score(
    results: Vec<(PrimitiveType, SearchResponse)>,
    top_k: usize,
) -> FusedResult {
    let mut hit_map: HashMap<EntityRef, SearchHit> = HashMap::new();

    for (_primitive, response) in results {
        for hit in response.hits {
            hit_map
                .entry(hit.doc_ref.clone())
                .and_modify(|existing| {
                    // Keep the higher score if doc appears in multiple primitives
                    if hit.score > existing.score {
                        *existing = hit.clone();
                    }
                })
                .or_insert(hit);
        }
    }

    let mut hits: Vec<SearchHit> = hit_map.into_values().collect();
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let truncated = hits.len() > top_k;
    hits.truncate(top_k);

    for (i, hit) in hits.iter_mut().enumerate() {
        hit.rank = (i + 1) as u32;
    }

    FusedResult::new(hits, truncated)
}

// ============================================================================
// Weighted RRF (for multi-query fusion)
// ============================================================================

/// Top-rank bonus: #1 in any list gets +0.05, #2-3 gets +0.02.
/// Prevents dilution of exact matches during multi-list fusion.
const RANK1_BONUS: f32 = 0.05;
const TOP3_BONUS: f32 = 0.02;

/// Fuse multiple ranked result lists with per-list weights using RRF.
///
/// Used by the multi-query expansion pipeline to combine results from
/// the original query (weighted 2x) with expansion variants (weighted 1x).
///
/// Each `(SearchResponse, f32)` pair is a result list and its weight multiplier.
/// The weighted RRF score for a document is:
///   `sum(weight * 1 / (k + rank))` across all lists where it appears,
/// plus a top-rank bonus (+0.05 for #1, +0.02 for #2-3 in any list).
pub fn weighted_rrf_fuse(
    results: Vec<(SearchResponse, f32)>,
    k_rrf: u32,
    top_k: usize,
) -> FusedResult {
    let mut rrf_scores: HashMap<EntityRef, f32> = HashMap::new();
    let mut best_rank: HashMap<EntityRef, u32> = HashMap::new();
    let mut hit_data: HashMap<EntityRef, SearchHit> = HashMap::new();

    for (response, weight) in results {
        for hit in response.hits {
            let rrf_contribution = weight / (k_rrf as f32 + hit.rank as f32);
            *rrf_scores.entry(hit.doc_ref.clone()).or_insert(0.0) += rrf_contribution;

            // Track best (lowest) rank across all lists
            let entry = best_rank.entry(hit.doc_ref.clone()).or_insert(u32::MAX);
            if hit.rank < *entry {
                *entry = hit.rank;
            }

            hit_data.entry(hit.doc_ref.clone()).or_insert(hit);
        }
    }

    // Apply top-rank bonus
    for (doc_ref, score) in rrf_scores.iter_mut() {
        if let Some(&rank) = best_rank.get(doc_ref) {
            if rank == 1 {
                *score += RANK1_BONUS;
            } else if rank <= 3 {
                *score += TOP3_BONUS;
            }
        }
    }

    let mut scored: Vec<_> = rrf_scores.into_iter().collect();
    sort_rrf_scored(&mut scored, &hit_data);
    build_ranked_result(scored, hit_data, top_k)
}

// ============================================================================
// Tests
// ============================================================================
