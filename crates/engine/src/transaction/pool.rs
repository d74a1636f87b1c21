//! Thread-local transaction pool for performance
//!
//! Eliminates allocation overhead by reusing TransactionContext objects.
//! Each thread maintains its own pool of up to MAX_POOL_SIZE contexts.
//!
//! # Key Optimization
//!
//! HashMap/HashSet/Vec `clear()` preserves allocated capacity.
//! By reusing contexts, we avoid:
//! - HashMap bucket allocation
//! - HashSet bucket allocation
//! - Vec buffer allocation
//!
//! After warmup, the hot path has zero allocations.

use strata_concurrency::TransactionContext;
use strata_core::traits::SnapshotView;
use strata_core::types::RunId;
use std::cell::RefCell;

/// Maximum contexts per thread
///
/// 8 is sufficient for typical concurrent workloads where each thread
/// only needs 1-2 active transactions at a time.
pub const MAX_POOL_SIZE: usize = 8;

thread_local! {
    /// Thread-local pool of reusable contexts
    static TXN_POOL: RefCell<Vec<TransactionContext>> = RefCell::new(Vec::with_capacity(MAX_POOL_SIZE));
}

/// Transaction pool operations
///
/// Provides thread-local pooling of TransactionContext objects.
/// The pool is implicitly created per-thread on first access.
///
/// # Example
///
/// ```ignore
/// // Acquire a context (from pool or new allocation)
/// let ctx = TransactionPool::acquire(1, run_id, Some(snapshot));
///
/// // ... use the context ...
///
/// // Return to pool for reuse
/// TransactionPool::release(ctx);
/// ```
pub struct TransactionPool;

impl TransactionPool {
    /// Acquire a transaction context
    ///
    /// Returns pooled context if available, allocates new if pool is empty.
    /// Pooled contexts are reset with new parameters but retain their
    /// internal collection capacity.
    ///
    /// # Arguments
    /// * `txn_id` - Unique transaction identifier
    /// * `run_id` - RunId for namespace isolation
    /// * `snapshot` - Optional snapshot for snapshot isolation
    ///
    /// # Returns
    /// * `TransactionContext` - Active transaction ready for operations
    pub fn acquire(
        txn_id: u64,
        run_id: RunId,
        snapshot: Option<Box<dyn SnapshotView>>,
    ) -> TransactionContext {
        TXN_POOL.with(|pool| {
            match pool.borrow_mut().pop() {
                Some(mut ctx) => {
                    // Reuse existing allocation - key optimization!
                    ctx.reset(txn_id, run_id, snapshot);
                    ctx
                }
                None => {
                    // Pool empty - allocate new
                    match snapshot {
                        Some(snap) => TransactionContext::with_snapshot(txn_id, run_id, snap),
                        None => TransactionContext::new(txn_id, run_id, 0),
                    }
                }
            }
        })
    }

    /// Return a transaction context to the pool
    ///
    /// Context is returned if pool has room, dropped otherwise.
    /// Contexts that have grown large internal collections are
    /// valuable to keep as they avoid future allocations.
    ///
    /// # Arguments
    /// * `ctx` - Transaction context to return to pool
    pub fn release(ctx: TransactionContext) {
        TXN_POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < MAX_POOL_SIZE {
                pool.push(ctx);
            }
            // else: drop (pool full)
        });
    }

    /// Get current pool size (for debugging/testing)
    ///
    /// Returns the number of contexts currently in the pool.
    pub fn pool_size() -> usize {
        TXN_POOL.with(|pool| pool.borrow().len())
    }

    /// Clear the pool (for testing)
    ///
    /// Removes all contexts from the thread-local pool.
    #[cfg(test)]
    pub fn clear() {
        TXN_POOL.with(|pool| pool.borrow_mut().clear());
    }

    /// Pre-warm the pool with contexts
    ///
    /// Creates `count` contexts and adds them to the pool.
    /// This eliminates allocation overhead during the hot path.
    ///
    /// # Arguments
    /// * `count` - Number of contexts to pre-allocate (capped at MAX_POOL_SIZE)
    pub fn warmup(count: usize) {
        let count = count.min(MAX_POOL_SIZE);
        TXN_POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            let current = pool.len();
            for _ in current..count {
                // Create minimal context for pool
                let ctx = TransactionContext::new(0, RunId::new(), 0);
                pool.push(ctx);
            }
        });
    }

    /// Get total capacity across all pooled contexts
    ///
    /// Returns sum of (read_set, write_set, delete_set, cas_set) capacities.
    /// Useful for debugging pool effectiveness.
    #[cfg(test)]
    pub fn total_capacity() -> (usize, usize, usize, usize) {
        TXN_POOL.with(|pool| {
            let pool = pool.borrow();
            let mut total = (0, 0, 0, 0);
            for ctx in pool.iter() {
                let (r, w, d, c) = ctx.capacity();
                total.0 += r;
                total.1 += w;
                total.2 += d;
                total.3 += c;
            }
            total
        })
    }
}
