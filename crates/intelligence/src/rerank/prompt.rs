//! Prompt template for re-ranking via chat completions

/// System prompt for relevance scoring via an LLM.
///
/// Instructs the model to output `N: score` lines for each numbered document.
pub const SYSTEM_PROMPT: &str = "\
You are a search relevance scorer. Given a query and numbered documents, \
score each document's relevance to the query from 0 to 10.

Output format (one per line, no other text):
1: <score>
2: <score>
...

Rules:
- Score 0 = completely irrelevant, 10 = perfect match
- Output ONLY numbered score lines
- Score every document listed";

/// Build the messages array for a reranking chat completions request.
///
/// The user message contains the query and numbered document snippets.
pub fn build_rerank_messages(query: &str, snippets: &[(usize, &str)]) -> serde_json::Value {
    let mut user_content = format!("Query: {}\n\nDocuments:", query);
    for (i, (_orig_idx, text)) in snippets.iter().enumerate() {
        user_content.push_str(&format!("\n{}. {}", i + 1, text));
    }

    serde_json::json!([
        {"role": "system", "content": SYSTEM_PROMPT},
        {"role": "user", "content": user_content}
    ])
}
