//! Output parser for LLM query expansion responses
//!
//! Parses `lex:`, `vec:`, and `hyde:` prefixed lines from model output.
//! Tolerant: ignores invalid lines, falls back gracefully.

use super::{ExpandedQueries, ExpandedQuery, QueryType};

/// Parse LLM output into typed expanded queries.
///
/// Tolerant parsing:
/// - Lines without a valid `lex:`, `vec:`, or `hyde:` prefix are ignored
/// - Empty text after prefix is ignored
/// - Returns empty vec if no valid lines found (caller handles fallback)
pub fn parse_expansion(text: &str) -> ExpandedQueries {
    parse_expansion_with_filter(text, None)
}

/// Parse LLM output, filtering out expansions that share no terms with the original query.
///
/// When `original_query` is provided, each expansion must contain at least one
/// word from the original query (case-insensitive). This prevents semantic drift
/// where the LLM generates completely unrelated expansions.
///
/// `hyde:` lines are exempt from this check since they are hypothetical documents
/// that may describe the topic without using the exact query terms.
pub fn parse_expansion_with_filter(text: &str, original_query: Option<&str>) -> ExpandedQueries {
    let query_terms: Vec<String> = original_query
        .map(|q| q.split_whitespace().map(|t| t.to_lowercase()).collect())
        .unwrap_or_default();

    let mut queries = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (query_type, expansion_text) = if let Some(text) = trimmed.strip_prefix("lex:") {
            (QueryType::Lex, text.trim())
        } else if let Some(text) = trimmed.strip_prefix("vec:") {
            (QueryType::Vec, text.trim())
        } else if let Some(text) = trimmed.strip_prefix("hyde:") {
            (QueryType::Hyde, text.trim())
        } else {
            continue; // Lines without valid prefix are silently ignored
        };

        if expansion_text.is_empty() {
            continue;
        }

        // Drift guard: lex/vec must share at least one term with original query.
        // Hyde is exempt (hypothetical docs may use different vocabulary).
        if !query_terms.is_empty() && query_type != QueryType::Hyde {
            let expansion_lower = expansion_text.to_lowercase();
            let has_overlap = query_terms
                .iter()
                .any(|term| expansion_lower.contains(term.as_str()));
            if !has_overlap {
                continue;
            }
        }

        queries.push(ExpandedQuery {
            query_type,
            text: expansion_text.to_string(),
        });
    }

    ExpandedQueries { queries }
}
