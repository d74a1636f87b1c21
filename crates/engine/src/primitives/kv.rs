//! KVStore: General-purpose key-value storage primitive
//!
//! ## Design
//!
//! KVStore is a stateless facade over the Database engine. It holds no
//! in-memory state beyond an `Arc<Database>` reference.
//!
//! ## Branch Isolation
//!
//! All operations are scoped to a `BranchId`. Keys are prefixed with the
//! branch's namespace, ensuring complete isolation between branches.
//!
//! ## Thread Safety
//!
//! KVStore is `Send + Sync` and can be safely shared across threads.
//! Multiple KVStore instances on the same Database are safe.
//!
//! ## MVP API
//!
//! - `get(branch_id, key)` - Get latest value
//! - `put(branch_id, key, value)` - Store a value
//! - `delete(branch_id, key)` - Delete a key
//! - `list(branch_id, prefix)` - List keys with prefix

use crate::database::Database;
use crate::primitives::extensions::KVStoreExt;
use std::sync::Arc;
use strata_concurrency::TransactionContext;
use strata_core::types::{BranchId, Key, Namespace};
use strata_core::value::Value;
use strata_core::StrataResult;
use strata_core::{Version, VersionedHistory};

/// General-purpose key-value store primitive
///
/// Stateless facade over Database - all state lives in storage.
/// Multiple KVStore instances on same Database are safe.
///
/// # Example
///
/// ```text
/// let db = Database::open("/path/to/data")?;
/// let kv = KVStore::new(db);
/// let branch_id = BranchId::new();
///
/// kv.put(&branch_id, "default", "key", Value::String("value".into()))?;
/// let value = kv.get(&branch_id, "default", "key")?;
/// kv.delete(&branch_id, "default", "key")?;
/// ```
#[derive(Clone)]
pub struct KVStore {
    db: Arc<Database>,
}

impl KVStore {
    /// Create new KVStore instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Build namespace for branch+space-scoped operations
    fn namespace_for(&self, branch_id: &BranchId, space: &str) -> Namespace {
        Namespace::for_branch_space(*branch_id, space)
    }

    /// Build key for KV operation
    fn key_for(&self, branch_id: &BranchId, space: &str, user_key: &str) -> Key {
        Key::new_kv(self.namespace_for(branch_id, space), user_key)
    }

    // ========== MVP API ==========

    /// Get a value by key
    ///
    /// Returns the latest value for the key, or None if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```text
    /// let value = kv.get(&branch_id, "default", "user:123")?;
    /// if let Some(v) = value {
    ///     println!("Found: {:?}", v);
    /// }
    /// ```
    pub fn get(&self, branch_id: &BranchId, space: &str, key: &str) -> StrataResult<Option<Value>> {
        self.db.transaction(*branch_id, |txn| {
            let storage_key = self.key_for(branch_id, space, key);
            txn.get(&storage_key)
        })
    }

    /// Get a value with its version metadata.
    ///
    /// Uses a transaction to retrieve the latest value together with its
    /// version and timestamp, providing snapshot isolation.
    /// Returns `None` if the key doesn't exist.
    pub fn get_versioned(
        &self,
        branch_id: &BranchId,
        space: &str,
        key: &str,
    ) -> StrataResult<Option<strata_core::VersionedValue>> {
        self.db.transaction(*branch_id, |txn| {
            let storage_key = self.key_for(branch_id, space, key);
            txn.get_versioned(&storage_key)
        })
    }

    /// Get full version history for a key.
    ///
    /// Returns `None` if the key doesn't exist. Index with `[0]` = latest,
    /// `[1]` = previous, etc. Reads directly from storage (non-transactional).
    pub fn getv(
        &self,
        branch_id: &BranchId,
        space: &str,
        key: &str,
    ) -> StrataResult<Option<VersionedHistory<Value>>> {
        let storage_key = self.key_for(branch_id, space, key);
        let history = self.db.get_history(&storage_key, None, None)?;
        Ok(VersionedHistory::new(history))
    }

    /// Put a value
    ///
    /// Creates the key if it doesn't exist, overwrites if it does.
    /// Returns the version created by this write operation.
    ///
    /// # Example
    ///
    /// ```text
    /// let version = kv.put(&branch_id, "default", "user:123", Value::String("Alice".into()))?;
    /// ```
    pub fn put(
        &self,
        branch_id: &BranchId,
        space: &str,
        key: &str,
        value: Value,
    ) -> StrataResult<Version> {
        // Extract text for indexing before the value is consumed by the transaction
        let text_for_index = match &value {
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Bool(_) | Value::Bytes(_) => None,
            other => serde_json::to_string(other).ok(),
        };

        let ((), commit_version) = self.db.transaction_with_version(*branch_id, |txn| {
            let storage_key = self.key_for(branch_id, space, key);
            txn.put(storage_key, value)
        })?;

        // Update inverted index for BM25 search (zero overhead when disabled)
        if let Some(text) = text_for_index {
            let index = self.db.extension::<crate::search::InvertedIndex>()?;
            if index.is_enabled() {
                let entity_ref = crate::search::EntityRef::Kv {
                    branch_id: *branch_id,
                    key: key.to_string(),
                };
                index.index_document(&entity_ref, &text, None);
            }
        }

        Ok(Version::Txn(commit_version))
    }

    /// Delete a key
    ///
    /// Returns `true` if the key existed and was deleted, `false` if it didn't exist.
    ///
    /// # Example
    ///
    /// ```text
    /// let was_deleted = kv.delete(&branch_id, "default", "user:123")?;
    /// ```
    pub fn delete(&self, branch_id: &BranchId, space: &str, key: &str) -> StrataResult<bool> {
        self.db.transaction(*branch_id, |txn| {
            let storage_key = self.key_for(branch_id, space, key);
            let exists = txn.get(&storage_key)?.is_some();
            if exists {
                txn.delete(storage_key)?;
            }
            Ok(exists)
        })
    }

    /// List keys with optional prefix filter
    ///
    /// Returns all keys matching the prefix (or all keys if prefix is None).
    ///
    /// # Example
    ///
    /// ```text
    /// // List all keys starting with "user:"
    /// let keys = kv.list(&branch_id, "default", Some("user:"))?;
    ///
    /// // List all keys
    /// let all_keys = kv.list(&branch_id, "default", None)?;
    /// ```
    pub fn list(
        &self,
        branch_id: &BranchId,
        space: &str,
        prefix: Option<&str>,
    ) -> StrataResult<Vec<String>> {
        self.db.transaction(*branch_id, |txn| {
            let ns = self.namespace_for(branch_id, space);
            let scan_prefix = Key::new_kv(ns, prefix.unwrap_or(""));

            let results = txn.scan_prefix(&scan_prefix)?;

            Ok(results
                .into_iter()
                .filter_map(|(key, _)| key.user_key_string())
                .collect())
        })
    }

    // ========== Batch API ==========

    /// Put multiple key-value pairs in a single transaction.
    ///
    /// All items share one lock acquisition, one WAL record, and one commit.
    /// Each entry reports success/failure independently via `Result<Version, String>`.
    /// Blind writes (empty read_set) â†’ validation skipped.
    pub fn batch_put(
        &self,
        branch_id: &BranchId,
        space: &str,
        entries: Vec<(String, Value)>,
    ) -> StrataResult<Vec<Result<Version, String>>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        // Extract text for indexing BEFORE the values are consumed by the transaction
        let texts: Vec<Option<String>> = entries
            .iter()
            .map(|(_, value)| match value {
                Value::String(s) => Some(s.clone()),
                Value::Null | Value::Bool(_) | Value::Bytes(_) => None,
                other => serde_json::to_string(other).ok(),
            })
            .collect();

        let ((), commit_version) = self.db.transaction_with_version(*branch_id, |txn| {
            for (key, value) in &entries {
                let storage_key = self.key_for(branch_id, space, key);
                txn.put(storage_key, value.clone())?;
            }
            Ok(())
        })?;

        let version = Version::Txn(commit_version);

        // Post-commit: update inverted index for all items
        let index = self.db.extension::<crate::search::InvertedIndex>()?;
        let index_enabled = index.is_enabled();
        for (i, (key, _)) in entries.iter().enumerate() {
            if index_enabled {
                if let Some(ref text) = texts[i] {
                    let entity_ref = crate::search::EntityRef::Kv {
                        branch_id: *branch_id,
                        key: key.clone(),
                    };
                    index.index_document(&entity_ref, text, None);
                }
            }
        }

        // All items succeed with the same commit version
        let results = entries.iter().map(|_| Ok(version)).collect();

        Ok(results)
    }

    // ========== Time-Travel API ==========

    /// Get a value by key as of a past timestamp (microseconds since epoch).
    ///
    /// Returns the latest value whose commit timestamp <= as_of_ts, or None.
    /// This is a non-transactional read directly from the storage version chain.
    pub fn get_at(
        &self,
        branch_id: &BranchId,
        space: &str,
        key: &str,
        as_of_ts: u64,
    ) -> StrataResult<Option<Value>> {
        let storage_key = self.key_for(branch_id, space, key);
        let result = self.db.get_at_timestamp(&storage_key, as_of_ts)?;
        Ok(result.map(|vv| vv.value))
    }

    /// List keys as of a past timestamp.
    ///
    /// Returns keys whose values existed at the given timestamp.
    pub fn list_at(
        &self,
        branch_id: &BranchId,
        space: &str,
        prefix: Option<&str>,
        as_of_ts: u64,
    ) -> StrataResult<Vec<String>> {
        let ns = self.namespace_for(branch_id, space);
        let scan_prefix = Key::new_kv(ns, prefix.unwrap_or(""));
        let results = self.db.scan_prefix_at_timestamp(&scan_prefix, as_of_ts)?;
        Ok(results
            .into_iter()
            .filter_map(|(key, _)| key.user_key_string())
            .collect())
    }
}

// ========== Searchable Trait Implementation ==========
//
// Search is handled by the intelligence layer (strata-intelligence).
// This implementation returns empty results - use InvertedIndex for full-text search.

impl crate::search::Searchable for KVStore {
    fn search(
        &self,
        req: &crate::SearchRequest,
    ) -> strata_core::StrataResult<crate::SearchResponse> {
        use crate::search::{truncate_text, EntityRef, InvertedIndex, SearchHit, SearchStats};
        use std::time::Instant;

        let start = Instant::now();
        let index = self.db.extension::<InvertedIndex>()?;

        // If the index is disabled or empty, return early
        if !index.is_enabled() || index.total_docs() == 0 {
            return Ok(crate::SearchResponse::empty());
        }

        let query_terms = crate::search::tokenize(&req.query);
        let scorer = self.db.config().bm25_scorer();

        // Score top-k entirely inside the index (zero-copy posting iteration)
        let top_k = index.score_top_k(&query_terms, &req.branch_id, req.k, scorer.k1, scorer.b);

        // Only resolve doc_ids and fetch text for the final top-k results
        let hits: Vec<SearchHit> = top_k
            .into_iter()
            .filter_map(|scored| {
                let entity_ref = index.resolve_doc_id(scored.doc_id)?;
                let snippet = if let EntityRef::Kv { ref key, .. } = entity_ref {
                    self.get(&req.branch_id, "default", key)
                        .ok()
                        .flatten()
                        .map(|v| match &v {
                            strata_core::value::Value::String(s) => truncate_text(s, 100),
                            other => truncate_text(
                                &serde_json::to_string(other).unwrap_or_default(),
                                100,
                            ),
                        })
                } else {
                    None
                };

                Some(SearchHit {
                    doc_ref: entity_ref,
                    score: scored.score,
                    rank: 0, // Set below
                    snippet,
                })
            })
            .enumerate()
            .map(|(i, mut hit)| {
                hit.rank = (i + 1) as u32;
                hit
            })
            .collect();

        let elapsed = start.elapsed().as_micros() as u64;
        let mut stats = SearchStats::new(elapsed, hits.len());
        stats = stats.with_index_used(true);

        Ok(crate::SearchResponse {
            hits,
            truncated: false,
            stats,
        })
    }

    fn primitive_kind(&self) -> strata_core::PrimitiveType {
        strata_core::PrimitiveType::Kv
    }
}

// ========== KVStoreExt Implementation ==========

impl KVStoreExt for TransactionContext {
    fn kv_get(&mut self, key: &str) -> StrataResult<Option<Value>> {
        let storage_key = Key::new_kv(Namespace::for_branch(self.branch_id), key);
        self.get(&storage_key)
    }

    fn kv_put(&mut self, key: &str, value: Value) -> StrataResult<()> {
        let storage_key = Key::new_kv(Namespace::for_branch(self.branch_id), key);
        self.put(storage_key, value)
    }

    fn kv_delete(&mut self, key: &str) -> StrataResult<()> {
        let storage_key = Key::new_kv(Namespace::for_branch(self.branch_id), key);
        self.delete(storage_key)?;
        Ok(())
    }
}
