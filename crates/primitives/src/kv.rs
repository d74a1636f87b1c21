//! KVStore: General-purpose key-value storage primitive
//!
//! ## Design
//!
//! KVStore is a stateless facade over the Database engine. It holds no
//! in-memory state beyond an `Arc<Database>` reference.
//!
//! ## Run Isolation
//!
//! All operations are scoped to a `RunId`. Keys are prefixed with the
//! run's namespace, ensuring complete isolation between runs.
//!
//! ## Thread Safety
//!
//! KVStore is `Send + Sync` and can be safely shared across threads.
//! Multiple KVStore instances on the same Database are safe.
//!
//! ## API
//!
//! - **Single-Operation API**: `get`, `put`, `put_with_ttl`, `delete`, `exists`
//!   Each operation runs in its own implicit transaction.
//!
//! - **Multi-Operation API**: `transaction` with `KVTransaction`
//!   Multiple operations run atomically in a single transaction.
//!
//! - **List Operations**: `list`, `list_with_values`
//!   Scan keys with optional prefix filtering.

use crate::extensions::KVStoreExt;
use in_mem_concurrency::TransactionContext;
use in_mem_core::error::Result;
use in_mem_core::types::{Key, Namespace, RunId};
use in_mem_core::value::Value;
use in_mem_core::{Version, Versioned};
use in_mem_engine::Database;
use std::sync::Arc;
use std::time::Duration;

/// General-purpose key-value store primitive
///
/// Stateless facade over Database - all state lives in storage.
/// Multiple KVStore instances on same Database are safe.
///
/// # Example
///
/// ```ignore
/// use in_mem_primitives::KVStore;
/// use in_mem_engine::Database;
/// use in_mem_core::types::RunId;
/// use in_mem_core::value::Value;
///
/// let db = Arc::new(Database::open("/path/to/data")?);
/// let kv = KVStore::new(db);
/// let run_id = RunId::new();
///
/// // Simple operations
/// kv.put(&run_id, "key", Value::String("value".into()))?;
/// let value = kv.get(&run_id, "key")?;
/// kv.delete(&run_id, "key")?;
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

    /// Get the underlying database reference
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Build namespace for run-scoped operations
    fn namespace_for_run(&self, run_id: &RunId) -> Namespace {
        Namespace::for_run(*run_id)
    }

    /// Build key for KV operation
    fn key_for(&self, run_id: &RunId, user_key: &str) -> Key {
        Key::new_kv(self.namespace_for_run(run_id), user_key)
    }

    // ========== Single-Operation API (Implicit Transactions) ==========

    /// Get a value by key (FAST PATH)
    ///
    /// Returns `Versioned<Value>` containing the value, its version, and timestamp.
    ///
    /// Bypasses full transaction overhead:
    /// - No transaction object allocation
    /// - No read-set recording
    /// - No commit validation
    /// - No WAL append
    ///
    /// PRESERVES:
    /// - Snapshot isolation (consistent view)
    /// - Run isolation (key prefixing)
    ///
    /// # Performance Contract
    /// - < 10µs (target: <5µs)
    /// - Zero allocations (except return value clone)
    ///
    /// # Invariant
    /// Observationally equivalent to transaction-based read.
    /// Returns the same value that a read-only transaction started
    /// at the same moment would return.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # M9 Contract
    /// - Returns `Versioned<Value>` with version information
    /// - Version is `Version::TxnId(commit_version)` from storage
    pub fn get(&self, run_id: &RunId, key: &str) -> Result<Option<Versioned<Value>>> {
        use in_mem_core::traits::SnapshotView;

        // Fast path: direct snapshot read
        let snapshot = self.db.storage().create_snapshot();
        let storage_key = self.key_for(run_id, key);

        // M9: Return full Versioned<Value> instead of just value
        Ok(snapshot.get(&storage_key)?)
    }

    /// Get value only, discarding version (DEPRECATED)
    ///
    /// For backwards compatibility. New code should use `get()` and access `.value`.
    #[deprecated(since = "0.9.0", note = "Use get() and access .value directly")]
    pub fn get_value(&self, run_id: &RunId, key: &str) -> Result<Option<Value>> {
        Ok(self.get(run_id, key)?.map(|v| v.value))
    }

    /// Get a value using full transaction (for comparison/fallback)
    ///
    /// Use this when you need transaction semantics, e.g.:
    /// - Read-modify-write patterns
    /// - When you need read-set tracking for conflict detection
    ///
    /// For simple reads, prefer `get()` which is faster.
    pub fn get_in_transaction(&self, run_id: &RunId, key: &str) -> Result<Option<Versioned<Value>>> {
        self.db.transaction(*run_id, |txn| {
            let storage_key = self.key_for(run_id, key);
            let result = txn.get(&storage_key)?;
            // M9: Wrap in Versioned with transaction snapshot version
            Ok(result.map(|v| Versioned::new(v, Version::TxnId(txn.start_version))))
        })
    }

    /// Put a value (M9: Returns version)
    ///
    /// Creates the key if it doesn't exist, overwrites if it does.
    /// Returns the version created by this write operation.
    ///
    /// # M9 Contract
    /// - Returns `Version::TxnId(commit_version)` on success
    pub fn put(&self, run_id: &RunId, key: &str, value: Value) -> Result<Version> {
        let ((), commit_version) = self.db.transaction_with_version(*run_id, |txn| {
            let storage_key = self.key_for(run_id, key);
            txn.put(storage_key, value)
        })?;
        Ok(Version::TxnId(commit_version))
    }

    /// Put a value without returning version (DEPRECATED)
    ///
    /// For backwards compatibility. New code should use `put()` which returns Version.
    #[deprecated(since = "0.9.0", note = "Use put() which returns Version")]
    pub fn put_no_version(&self, run_id: &RunId, key: &str, value: Value) -> Result<()> {
        self.db.transaction(*run_id, |txn| {
            let storage_key = self.key_for(run_id, key);
            txn.put(storage_key, value)
        })
    }

    /// Put a value with TTL (M9: Returns version)
    ///
    /// Note: TTL metadata is stored but cleanup is deferred to M4 background tasks.
    /// Reads will return expired values until cleanup runs.
    ///
    /// # M9 Contract
    /// - Returns `Version::TxnId(commit_version)` on success
    pub fn put_with_ttl(
        &self,
        run_id: &RunId,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<Version> {
        let ((), commit_version) = self.db.transaction_with_version(*run_id, |txn| {
            let storage_key = self.key_for(run_id, key);
            let expires_at = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis() as i64
                + ttl.as_millis() as i64;

            // Store value with expiration metadata
            let value_with_ttl = Value::Map(std::collections::HashMap::from([
                ("value".to_string(), value),
                ("expires_at".to_string(), Value::I64(expires_at)),
            ]));

            txn.put(storage_key, value_with_ttl)
        })?;
        Ok(Version::TxnId(commit_version))
    }

    /// Delete a key
    ///
    /// Returns `true` if the key existed and was deleted.
    pub fn delete(&self, run_id: &RunId, key: &str) -> Result<bool> {
        self.db.transaction(*run_id, |txn| {
            let storage_key = self.key_for(run_id, key);
            // Check if key exists before deleting
            let exists = txn.get(&storage_key)?.is_some();
            if exists {
                txn.delete(storage_key)?;
            }
            Ok(exists)
        })
    }

    /// Check if a key exists (FAST PATH)
    ///
    /// Uses direct snapshot read, bypassing transaction overhead.
    pub fn exists(&self, run_id: &RunId, key: &str) -> Result<bool> {
        use in_mem_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let storage_key = self.key_for(run_id, key);

        Ok(snapshot.get(&storage_key)?.is_some())
    }

    // ========== Batch Operations (Fast Path) ==========

    /// Get multiple values in a single snapshot (FAST PATH) (M9: Returns versioned)
    ///
    /// Uses a single snapshot acquisition for all keys, ensuring:
    /// - Consistent point-in-time view across all keys
    /// - More efficient than multiple get() calls
    /// - No version mixing (all keys from same snapshot)
    ///
    /// # Performance
    /// For N keys: ~(snapshot_time + N * lookup_time)
    /// vs N * (snapshot_time + lookup_time) for individual gets
    ///
    /// # Returns
    /// Vec of Option<Versioned<Value>> in same order as input keys.
    /// None for keys that don't exist.
    ///
    /// # M9 Contract
    /// Returns `Versioned<Value>` with version information for each key.
    pub fn get_many(&self, run_id: &RunId, keys: &[&str]) -> Result<Vec<Option<Versioned<Value>>>> {
        use in_mem_core::traits::SnapshotView;

        // Single snapshot for consistency
        let snapshot = self.db.storage().create_snapshot();
        let ns = self.namespace_for_run(run_id);

        keys.iter()
            .map(|key| {
                let storage_key = Key::new_kv(ns.clone(), key);
                // M9: Return full Versioned<Value>
                Ok(snapshot.get(&storage_key)?)
            })
            .collect()
    }

    /// Get multiple values as a HashMap (FAST PATH) (M9: Returns versioned)
    ///
    /// Like get_many(), but returns a HashMap for easier lookup.
    /// Only includes keys that exist (missing keys are omitted).
    ///
    /// # Returns
    /// HashMap mapping key strings to their versioned values.
    /// Keys that don't exist are not included.
    ///
    /// # M9 Contract
    /// Returns `Versioned<Value>` with version information for each key.
    pub fn get_many_map(
        &self,
        run_id: &RunId,
        keys: &[&str],
    ) -> Result<std::collections::HashMap<String, Versioned<Value>>> {
        use in_mem_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let ns = self.namespace_for_run(run_id);

        let mut result = std::collections::HashMap::with_capacity(keys.len());
        for key in keys {
            let storage_key = Key::new_kv(ns.clone(), *key);
            if let Some(vv) = snapshot.get(&storage_key)? {
                // M9: Return full Versioned<Value>
                result.insert((*key).to_string(), vv);
            }
        }
        Ok(result)
    }

    /// Check if a key exists (alias for exists, matches spec) (FAST PATH)
    pub fn contains(&self, run_id: &RunId, key: &str) -> Result<bool> {
        self.exists(run_id, key)
    }

    // ========== List Operations ==========

    /// List keys with optional prefix filter
    ///
    /// Returns all keys matching the prefix (or all keys if prefix is None).
    pub fn list(&self, run_id: &RunId, prefix: Option<&str>) -> Result<Vec<String>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            let scan_prefix = Key::new_kv(ns, prefix.unwrap_or(""));

            let results = txn.scan_prefix(&scan_prefix)?;

            Ok(results
                .into_iter()
                .filter_map(|(key, _)| key.user_key_string())
                .collect())
        })
    }

    /// List key-value pairs with optional prefix filter (M9: Returns versioned)
    ///
    /// Returns all key-value pairs matching the prefix (or all if prefix is None).
    ///
    /// # M9 Contract
    /// Returns `Vec<(String, Versioned<Value>)>` with version information.
    pub fn list_with_values(
        &self,
        run_id: &RunId,
        prefix: Option<&str>,
    ) -> Result<Vec<(String, Versioned<Value>)>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            let scan_prefix = Key::new_kv(ns, prefix.unwrap_or(""));

            let results = txn.scan_prefix(&scan_prefix)?;

            // M9: Return Versioned<Value> with version from scan
            Ok(results
                .into_iter()
                .filter_map(|(key, value)| {
                    key.user_key_string()
                        .map(|k| (k, Versioned::new(value, Version::TxnId(txn.start_version))))
                })
                .collect())
        })
    }

    // ========== Search API (M6) ==========

    /// Search KV entries
    ///
    /// Searches key names and string values using the simple scorer.
    /// Respects budget constraints (time and candidate limits).
    ///
    /// # Example
    ///
    /// ```ignore
    /// use in_mem_primitives::KVStore;
    /// use in_mem_core::SearchRequest;
    ///
    /// let response = kv.search(&SearchRequest::new(run_id, "hello"))?;
    /// for hit in response.hits {
    ///     println!("Found: {:?} with score {}", hit.doc_ref, hit.score);
    /// }
    /// ```
    pub fn search(
        &self,
        req: &in_mem_core::SearchRequest,
    ) -> in_mem_core::error::Result<in_mem_core::SearchResponse> {
        use crate::searchable::{build_search_response, SearchCandidate};
        use in_mem_core::search_types::DocRef;
        use in_mem_core::traits::SnapshotView;
        use std::time::Instant;

        let start = Instant::now();
        let snapshot = self.db.storage().create_snapshot();
        let ns = self.namespace_for_run(&req.run_id);
        let scan_prefix = Key::new_kv(ns, "");

        let mut candidates = Vec::new();
        let mut truncated = false;

        // Scan all KV entries for this run
        for (key, versioned_value) in snapshot.scan_prefix(&scan_prefix)? {
            // Check budget constraints
            if start.elapsed().as_micros() as u64 >= req.budget.max_wall_time_micros {
                truncated = true;
                break;
            }
            if candidates.len() >= req.budget.max_candidates_per_primitive {
                truncated = true;
                break;
            }

            // Time range filter
            if let Some((start_ts, end_ts)) = req.time_range {
                let ts = versioned_value.timestamp.as_micros();
                if ts < start_ts || ts > end_ts {
                    continue;
                }
            }

            // Extract searchable text
            let text = self.extract_search_text(&key, &versioned_value.value);

            // Extract user key as string for DocRef
            let user_key_str = String::from_utf8_lossy(&key.user_key).to_string();

            candidates.push(SearchCandidate::new(
                DocRef::Kv { run_id: req.run_id, key: user_key_str },
                text,
                Some(versioned_value.timestamp.as_micros()),
            ));
        }

        Ok(build_search_response(
            candidates,
            &req.query,
            req.k,
            truncated,
            start.elapsed().as_micros() as u64,
        ))
    }

    /// Extract searchable text from a KV entry
    fn extract_search_text(&self, key: &Key, value: &Value) -> String {
        let mut parts = Vec::new();

        // Include key name
        if let Some(key_str) = key.user_key_string() {
            parts.push(key_str);
        }

        // Include value based on type
        match value {
            Value::String(s) => parts.push(s.clone()),
            Value::Bytes(b) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    parts.push(s.to_string());
                }
            }
            Value::I64(n) => parts.push(n.to_string()),
            Value::F64(n) => parts.push(n.to_string()),
            Value::Bool(b) => parts.push(b.to_string()),
            Value::Array(_) | Value::Map(_) => {
                if let Ok(s) = serde_json::to_string(value) {
                    parts.push(s);
                }
            }
            Value::Null => {}
        }

        parts.join(" ")
    }

    // ========== Multi-Operation API (Explicit Transactions) ==========

    /// Execute multiple KV operations atomically
    ///
    /// All operations within the closure are part of a single transaction.
    /// Either all succeed or all are rolled back.
    ///
    /// # Example
    ///
    /// ```ignore
    /// kv.transaction(&run_id, |txn| {
    ///     txn.put("key1", Value::I64(1))?;
    ///     txn.put("key2", Value::I64(2))?;
    ///     let val = txn.get("key1")?;
    ///     Ok(val)
    /// })?;
    /// ```
    pub fn transaction<F, T>(&self, run_id: &RunId, f: F) -> Result<T>
    where
        F: FnOnce(&mut KVTransaction<'_>) -> Result<T>,
    {
        self.db.transaction(*run_id, |txn| {
            let mut kv_txn = KVTransaction {
                txn,
                run_id: *run_id,
            };
            f(&mut kv_txn)
        })
    }
}

/// Transaction handle for multi-key KV operations
///
/// Provides get/put/delete/list operations within an atomic transaction.
/// Changes are only visible after the transaction commits successfully.
pub struct KVTransaction<'a> {
    txn: &'a mut TransactionContext,
    run_id: RunId,
}

impl<'a> KVTransaction<'a> {
    /// Get a value within the transaction
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        self.txn.get(&storage_key)
    }

    /// Put a value within the transaction
    pub fn put(&mut self, key: &str, value: Value) -> Result<()> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        self.txn.put(storage_key, value)
    }

    /// Delete a key within the transaction
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        let exists = self.txn.get(&storage_key)?.is_some();
        if exists {
            self.txn.delete(storage_key)?;
        }
        Ok(exists)
    }

    /// List keys within the transaction
    pub fn list(&mut self, prefix: Option<&str>) -> Result<Vec<String>> {
        let ns = Namespace::for_run(self.run_id);
        let scan_prefix = Key::new_kv(ns, prefix.unwrap_or(""));

        let results = self.txn.scan_prefix(&scan_prefix)?;

        Ok(results
            .into_iter()
            .filter_map(|(key, _)| key.user_key_string())
            .collect())
    }
}

// ========== Searchable Trait Implementation (M6) ==========

impl crate::searchable::Searchable for KVStore {
    fn search(
        &self,
        req: &in_mem_core::SearchRequest,
    ) -> in_mem_core::error::Result<in_mem_core::SearchResponse> {
        self.search(req)
    }

    fn primitive_kind(&self) -> in_mem_core::PrimitiveType {
        in_mem_core::PrimitiveType::Kv
    }
}

// ========== KVStoreExt Implementation ==========

impl KVStoreExt for TransactionContext {
    fn kv_get(&mut self, key: &str) -> Result<Option<Value>> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        self.get(&storage_key)
    }

    fn kv_put(&mut self, key: &str, value: Value) -> Result<()> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        self.put(storage_key, value)
    }

    fn kv_delete(&mut self, key: &str) -> Result<()> {
        let storage_key = Key::new_kv(Namespace::for_run(self.run_id), key);
        self.delete(storage_key)?;
        Ok(())
    }
}
