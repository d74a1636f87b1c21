//! Version identifier types
//!
//! This type expresses Invariant 2: Everything is Versioned.
//! Every mutation produces a version. Every read returns version information.
//!
//! ## Version Variants
//!
//! Different primitives use different versioning schemes:
//!
//! - **TxnId**: Transaction-based versioning (KV, Json, Vector, Branch)
//!   Multiple entities modified in the same transaction share this version.
//!
//! - **Sequence**: Position-based versioning (EventLog)
//!   Represents position in an append-only log. Unique within a branch's event log.
//!
//! - **Counter**: Per-entity counter (StateCell)
//!   Increments on each modification. Used for CAS operations.
//!
//! ## Comparison
//!
//! Versions are comparable **within the same variant type**.
//! Cross-variant comparison is undefined (returns `None` for `partial_cmp`).

use serde::{Deserialize, Serialize};

/// Version identifier for an entity
///
/// Versions track mutations and enable optimistic concurrency control.
/// Every write operation returns a Version indicating what was created.
///
/// ## Invariants
///
/// - Versions are monotonically increasing within an entity
/// - Versions within the same variant are totally ordered
/// - Cross-variant comparison is not meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// Transaction-based version
    ///
    /// Used by: KV, Json, Vector, Branch
    ///
    /// Represents a global transaction ID. Multiple entities modified
    /// in the same transaction share this version.
    Txn(u64),

    /// Sequence-based version
    ///
    /// Used by: EventLog
    ///
    /// Represents position in an append-only log.
    /// Unique within a branch's event log.
    Sequence(u64),

    /// Counter-based version
    ///
    /// Used by: StateCell
    ///
    /// Per-entity mutation counter. Increments on each modification.
    /// Used for compare-and-swap (CAS) operations.
    Counter(u64),
}

impl Version {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a TxnId version with value 0
    pub const fn zero_txn() -> Self {
        Version::Txn(0)
    }

    /// Create a Sequence version with value 0
    pub const fn zero_sequence() -> Self {
        Version::Sequence(0)
    }

    /// Create a Counter version with value 0
    pub const fn zero_counter() -> Self {
        Version::Counter(0)
    }

    /// Create a TxnId version
    pub const fn txn(id: u64) -> Self {
        Version::Txn(id)
    }

    /// Create a Sequence version
    pub const fn seq(n: u64) -> Self {
        Version::Sequence(n)
    }

    /// Create a Counter version
    pub const fn counter(n: u64) -> Self {
        Version::Counter(n)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the numeric value
    ///
    /// Useful for storage and display, but NOT for cross-variant comparison.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        match self {
            Version::Txn(v) => *v,
            Version::Sequence(v) => *v,
            Version::Counter(v) => *v,
        }
    }

    /// Check if this is a transaction-based version
    #[inline]
    pub const fn is_txn(&self) -> bool {
        matches!(self, Version::Txn(_))
    }

    /// Check if this is a sequence-based version
    #[inline]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Version::Sequence(_))
    }

    /// Check if this is a counter-based version
    #[inline]
    pub const fn is_counter(&self) -> bool {
        matches!(self, Version::Counter(_))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Increment the version, returning a new version
    ///
    /// Preserves the variant type.
    pub const fn increment(&self) -> Self {
        match self {
            Version::Txn(v) => Version::Txn(*v + 1),
            Version::Sequence(v) => Version::Sequence(*v + 1),
            Version::Counter(v) => Version::Counter(*v + 1),
        }
    }

    /// Saturating increment (won't overflow)
    pub const fn saturating_increment(&self) -> Self {
        match self {
            Version::Txn(v) => Version::Txn(v.saturating_add(1)),
            Version::Sequence(v) => Version::Sequence(v.saturating_add(1)),
            Version::Counter(v) => Version::Counter(v.saturating_add(1)),
        }
    }

    /// Check if this version is zero
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.as_u64() == 0
    }
}

impl PartialOrd for Version {
    /// Compare versions
    ///
    /// Delegates to `Ord::cmp` for consistency.
    /// For semantic same-variant comparison, use dedicated methods.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// Total ordering for sorting purposes
    ///
    /// WARNING: This provides a total ordering by comparing numeric values
    /// regardless of variant. Use `partial_cmp` for semantic comparison.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // First compare by variant discriminant, then by value
        let self_discriminant = match self {
            Version::Txn(_) => 0,
            Version::Sequence(_) => 1,
            Version::Counter(_) => 2,
        };
        let other_discriminant = match other {
            Version::Txn(_) => 0,
            Version::Sequence(_) => 1,
            Version::Counter(_) => 2,
        };

        self_discriminant
            .cmp(&other_discriminant)
            .then_with(|| self.as_u64().cmp(&other.as_u64()))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Txn(v) => write!(f, "txn:{}", v),
            Version::Sequence(v) => write!(f, "seq:{}", v),
            Version::Counter(v) => write!(f, "cnt:{}", v),
        }
    }
}

impl Default for Version {
    /// Default is TxnId(0)
    fn default() -> Self {
        Version::zero_txn()
    }
}

impl From<u64> for Version {
    /// Create a TxnId version from u64
    fn from(v: u64) -> Self {
        Version::Txn(v)
    }
}

// ============================================================================
// Tests
// ============================================================================
