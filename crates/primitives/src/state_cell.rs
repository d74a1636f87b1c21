//! StateCell: CAS-based versioned cells for coordination
//!
//! ## Design Principles
//!
//! 1. **Versioned Updates**: Every update increments the version.
//! 2. **CAS Semantics**: Compare-and-swap ensures safe concurrent updates.
//! 3. **Purity Requirement**: Transition closures MUST be pure functions.
//!
//! ## Naming Note
//!
//! This is "StateCell" not "StateMachine". In M3, this is a simple CAS cell.
//! Full state machine semantics (transitions, guards) may come in M5+.
//!
//! ## Purity Requirement
//!
//! The `transition()` closure may be called multiple times due to OCC retries.
//! Closures MUST be pure functions:
//! - Pure function of inputs (result depends only on &State argument)
//! - No I/O (no file, network, console operations)
//! - No external mutation (don't modify variables outside closure scope)
//! - No irreversible effects (no logging, metrics, API calls)
//! - Idempotent (same input produces same output)
//!
//! ## Key Design
//!
//! - TypeTag: State (0x03)
//! - Key format: `<namespace>:<TypeTag::State>:<cell_name>`

use crate::extensions::StateCellExt;
use in_mem_concurrency::TransactionContext;
use in_mem_core::error::Result;
use in_mem_core::types::{Key, Namespace, RunId};
use in_mem_core::value::Value;
use in_mem_engine::{Database, RetryConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current state of a cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    /// Current value
    pub value: Value,
    /// Version number (monotonically increasing)
    pub version: u64,
    /// Last update timestamp (milliseconds since epoch)
    pub updated_at: i64,
}

impl State {
    /// Create a new state with version 1
    pub fn new(value: Value) -> Self {
        Self {
            value,
            version: 1,
            updated_at: Self::now(),
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }
}

/// Serialize a struct to Value::String for storage
fn to_stored_value<T: Serialize>(v: &T) -> Value {
    match serde_json::to_string(v) {
        Ok(s) => Value::String(s),
        Err(_) => Value::Null,
    }
}

/// Deserialize from Value::String storage
fn from_stored_value<T: for<'de> Deserialize<'de>>(
    v: &Value,
) -> std::result::Result<T, serde_json::Error> {
    match v {
        Value::String(s) => serde_json::from_str(s),
        _ => serde_json::from_str("null"), // Will fail with appropriate error
    }
}

/// CAS-based versioned cells for coordination
///
/// ## Design
///
/// Each cell has a value and monotonically increasing version.
/// Updates via CAS ensure safe concurrent access.
///
/// ## Example
///
/// ```rust,ignore
/// use in_mem_primitives::StateCell;
/// use in_mem_core::value::Value;
///
/// let sc = StateCell::new(db.clone());
/// let run_id = RunId::new();
///
/// // Initialize a counter
/// sc.init(&run_id, "counter", Value::I64(0))?;
///
/// // Read current state
/// let state = sc.read(&run_id, "counter")?.unwrap();
/// assert_eq!(state.version, 1);
///
/// // CAS update
/// sc.cas(&run_id, "counter", 1, Value::I64(1))?;
///
/// // Transition with automatic retry
/// sc.transition(&run_id, "counter", |state| {
///     let current = state.value.as_i64().unwrap_or(0);
///     Ok((Value::I64(current + 1), current + 1))
/// })?;
/// ```
#[derive(Clone)]
pub struct StateCell {
    db: Arc<Database>,
}

impl StateCell {
    /// Create new StateCell instance
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

    /// Build key for state cell
    fn key_for(&self, run_id: &RunId, name: &str) -> Key {
        Key::new_state(self.namespace_for_run(run_id), name)
    }

    // ========== Read/Init/Delete Operations (Story #181) ==========

    /// Initialize a cell with a value (only if it doesn't exist)
    ///
    /// Returns Ok(version) if created, Err if already exists.
    pub fn init(&self, run_id: &RunId, name: &str, value: Value) -> Result<u64> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, name);

            // Check if exists
            if txn.get(&key)?.is_some() {
                return Err(in_mem_core::error::Error::InvalidOperation(format!(
                    "StateCell '{}' already exists",
                    name
                )));
            }

            // Create new state
            let state = State::new(value);
            txn.put(key, to_stored_value(&state))?;
            Ok(state.version)
        })
    }

    /// Read current state (FAST PATH)
    ///
    /// Bypasses full transaction overhead for read-only access.
    /// Uses direct snapshot read which maintains snapshot isolation.
    pub fn read(&self, run_id: &RunId, name: &str) -> Result<Option<State>> {
        use in_mem_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let key = self.key_for(run_id, name);

        match snapshot.get(&key)? {
            Some(vv) => {
                let state: State = from_stored_value(&vv.value)
                    .map_err(|e| in_mem_core::error::Error::SerializationError(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Read current state (with full transaction)
    ///
    /// Use this when you need transaction semantics.
    pub fn read_in_transaction(&self, run_id: &RunId, name: &str) -> Result<Option<State>> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, name);
            match txn.get(&key)? {
                Some(v) => {
                    let state: State = from_stored_value(&v).map_err(|e| {
                        in_mem_core::error::Error::SerializationError(e.to_string())
                    })?;
                    Ok(Some(state))
                }
                None => Ok(None),
            }
        })
    }

    /// Delete a cell
    ///
    /// Returns true if deleted, false if didn't exist
    pub fn delete(&self, run_id: &RunId, name: &str) -> Result<bool> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, name);

            // Check if exists first
            if txn.get(&key)?.is_none() {
                return Ok(false);
            }

            txn.delete(key)?;
            Ok(true)
        })
    }

    /// Check if a cell exists (FAST PATH)
    ///
    /// Uses direct snapshot read which maintains snapshot isolation.
    pub fn exists(&self, run_id: &RunId, name: &str) -> Result<bool> {
        use in_mem_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let key = self.key_for(run_id, name);
        Ok(snapshot.get(&key)?.is_some())
    }

    /// List all cell names in run
    pub fn list(&self, run_id: &RunId) -> Result<Vec<String>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            let prefix = Key::new_state(ns, "");
            let results = txn.scan_prefix(&prefix)?;
            Ok(results
                .into_iter()
                .map(|(key, _)| String::from_utf8_lossy(&key.user_key).to_string())
                .collect())
        })
    }

    // ========== CAS & Set Operations (Story #182) ==========

    /// Compare-and-swap: Update only if version matches
    ///
    /// Returns new version on success, error on conflict.
    pub fn cas(
        &self,
        run_id: &RunId,
        name: &str,
        expected_version: u64,
        new_value: Value,
    ) -> Result<u64> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, name);

            let current: State = match txn.get(&key)? {
                Some(v) => from_stored_value(&v)
                    .map_err(|e| in_mem_core::error::Error::SerializationError(e.to_string()))?,
                None => {
                    return Err(in_mem_core::error::Error::InvalidOperation(format!(
                        "StateCell '{}' not found",
                        name
                    )))
                }
            };

            if current.version != expected_version {
                return Err(in_mem_core::error::Error::VersionMismatch {
                    expected: expected_version,
                    actual: current.version,
                });
            }

            let new_state = State {
                value: new_value,
                version: current.version + 1,
                updated_at: State::now(),
            };

            txn.put(key, to_stored_value(&new_state))?;
            Ok(new_state.version)
        })
    }

    /// Unconditional set (force write)
    ///
    /// Always succeeds, overwrites any existing value.
    /// Creates the cell if it doesn't exist.
    pub fn set(&self, run_id: &RunId, name: &str, value: Value) -> Result<u64> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, name);

            let new_version = match txn.get(&key)? {
                Some(v) => {
                    let current: State = from_stored_value(&v).map_err(|e| {
                        in_mem_core::error::Error::SerializationError(e.to_string())
                    })?;
                    current.version + 1
                }
                None => 1,
            };

            let new_state = State {
                value,
                version: new_version,
                updated_at: State::now(),
            };

            txn.put(key, to_stored_value(&new_state))?;
            Ok(new_state.version)
        })
    }

    // ========== Transition Closure Pattern (Story #183) ==========

    /// Apply a transition function with automatic retry on conflict
    ///
    /// Returns `(user_result, new_version)` tuple. The new_version is the version
    /// number after the transition commits, useful for tracking without a separate read.
    ///
    /// ## Purity Requirement
    ///
    /// The closure `f` MAY BE CALLED MULTIPLE TIMES due to OCC retries.
    /// It MUST be a pure function:
    /// - No I/O (file, network, console)
    /// - No external mutation
    /// - No irreversible effects (logging, metrics)
    /// - Idempotent (same input -> same output)
    ///
    /// ## Implementation Note
    ///
    /// This method performs read + closure + write in a SINGLE TRANSACTION
    /// to ensure atomic OCC validation. The entire transaction retries on
    /// conflict, not just the CAS operation.
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// let (incremented, new_version) = sc.transition(run_id, "counter", |state| {
    ///     let current = state.value.as_i64().unwrap_or(0);
    ///     Ok((Value::I64(current + 1), current + 1))
    /// })?;
    /// ```
    pub fn transition<F, T>(&self, run_id: &RunId, name: &str, f: F) -> Result<(T, u64)>
    where
        F: Fn(&State) -> Result<(Value, T)>,
    {
        // Use high retry count for contention scenarios
        // With N concurrent threads on single key, worst case needs N retries per op
        // 200 retries with fast backoff handles 100+ concurrent threads reliably
        let retry_config = RetryConfig::default()
            .with_max_retries(200)
            .with_base_delay_ms(1)
            .with_max_delay_ms(50);

        let key = self.key_for(run_id, name);
        let name_owned = name.to_string();

        // Perform read + closure + write in a SINGLE transaction
        // This ensures atomic OCC validation at commit time
        self.db
            .transaction_with_retry(*run_id, retry_config, |txn| {
                // Read current state within the transaction
                let current: State = match txn.get(&key)? {
                    Some(v) => from_stored_value(&v).map_err(|e| {
                        in_mem_core::error::Error::SerializationError(e.to_string())
                    })?,
                    None => {
                        return Err(in_mem_core::error::Error::InvalidOperation(format!(
                            "StateCell '{}' not found",
                            name_owned
                        )))
                    }
                };

                // Compute new value (closure may be called multiple times!)
                let (new_value, result) = f(&current)?;

                // Write new state with incremented version
                let new_version = current.version + 1;
                let new_state = State {
                    value: new_value,
                    version: new_version,
                    updated_at: State::now(),
                };

                txn.put(key.clone(), to_stored_value(&new_state))?;
                Ok((result, new_version))
            })
    }

    /// Apply transition or initialize if cell doesn't exist
    ///
    /// First attempts to initialize the cell with `initial` value,
    /// then applies the transition function.
    ///
    /// Returns `(user_result, new_version)` tuple.
    pub fn transition_or_init<F, T>(
        &self,
        run_id: &RunId,
        name: &str,
        initial: Value,
        f: F,
    ) -> Result<(T, u64)>
    where
        F: Fn(&State) -> Result<(Value, T)>,
    {
        // Try to init first (ignore AlreadyExists error)
        let _ = self.init(run_id, name, initial);

        // Then transition
        self.transition(run_id, name, f)
    }
}

// ========== StateCellExt Implementation (Story #184) ==========

impl StateCellExt for TransactionContext {
    fn state_read(&mut self, name: &str) -> Result<Option<Value>> {
        let ns = Namespace::for_run(self.run_id);
        let key = Key::new_state(ns, name);

        match self.get(&key)? {
            Some(v) => {
                let state: State = from_stored_value(&v)
                    .map_err(|e| in_mem_core::error::Error::SerializationError(e.to_string()))?;
                Ok(Some(state.value))
            }
            None => Ok(None),
        }
    }

    fn state_cas(&mut self, name: &str, expected_version: u64, new_value: Value) -> Result<u64> {
        let ns = Namespace::for_run(self.run_id);
        let key = Key::new_state(ns, name);

        let current: State = match self.get(&key)? {
            Some(v) => from_stored_value(&v)
                .map_err(|e| in_mem_core::error::Error::SerializationError(e.to_string()))?,
            None => {
                return Err(in_mem_core::error::Error::InvalidOperation(format!(
                    "StateCell '{}' not found",
                    name
                )))
            }
        };

        if current.version != expected_version {
            return Err(in_mem_core::error::Error::VersionMismatch {
                expected: expected_version,
                actual: current.version,
            });
        }

        let new_state = State {
            value: new_value,
            version: current.version + 1,
            updated_at: State::now(),
        };

        self.put(key, to_stored_value(&new_state))?;
        Ok(new_state.version)
    }

    fn state_set(&mut self, name: &str, value: Value) -> Result<u64> {
        let ns = Namespace::for_run(self.run_id);
        let key = Key::new_state(ns, name);

        let new_version = match self.get(&key)? {
            Some(v) => {
                let current: State = from_stored_value(&v)
                    .map_err(|e| in_mem_core::error::Error::SerializationError(e.to_string()))?;
                current.version + 1
            }
            None => 1,
        };

        let new_state = State {
            value,
            version: new_version,
            updated_at: State::now(),
        };

        self.put(key, to_stored_value(&new_state))?;
        Ok(new_state.version)
    }
}
