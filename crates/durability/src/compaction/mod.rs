//! Database compaction
//!
//! Compaction reclaims disk space by removing WAL segments and old versions.
//! Compaction is user-triggered and deterministic.
//!
//! # Compaction Modes
//!
//! - **WALOnly**: Safely removes WAL segments covered by snapshot watermark.
//!   All version history is preserved.
//!
//! - **Full**: Removes WAL segments AND applies retention policy to remove
//!   old versions. Version IDs never change.
//!
//! # Key Invariants
//!
//! - Compaction is **user-triggered**: No background compaction
//! - Compaction is **deterministic**: Same input → same output
//! - Compaction is **logically invisible**: Read results unchanged for retained data
//! - **Version IDs never change**: Critical semantic invariant
//!
//! # Example
//!
//! ```ignore
//! // Compact WAL only (safe mode)
//! let info = database.compact(CompactMode::WALOnly)?;
//! println!("Reclaimed {} bytes", info.reclaimed_bytes);
//!
//! // Full compaction with retention enforcement
//! let info = database.compact(CompactMode::Full)?;
//! println!("Removed {} versions", info.versions_removed);
//! ```

pub mod tombstone;
pub mod wal_only;

pub use tombstone::{Tombstone, TombstoneError, TombstoneIndex, TombstoneReason};
pub use wal_only::WalOnlyCompactor;

/// Compaction mode
///
/// Determines how aggressively compaction reclaims disk space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompactMode {
    /// Remove WAL segments covered by snapshot
    ///
    /// Safest mode. Only removes WAL segments whose transactions
    /// are fully captured in a snapshot. All version history preserved.
    WALOnly,

    /// Full compaction: WAL + retention policy enforcement
    ///
    /// Removes WAL segments AND applies retention policy to remove
    /// old versions. Version IDs never change.
    Full,
}

impl CompactMode {
    /// Get the name of this compaction mode for logging/metrics
    pub fn name(&self) -> &'static str {
        match self {
            CompactMode::WALOnly => "wal_only",
            CompactMode::Full => "full",
        }
    }

    /// Check if this mode applies retention policies
    pub fn applies_retention(&self) -> bool {
        matches!(self, CompactMode::Full)
    }
}

impl std::fmt::Display for CompactMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of a compaction operation
///
/// Contains metrics and details about what was compacted.
#[derive(Debug, Clone)]
pub struct CompactInfo {
    /// Compaction mode used
    pub mode: CompactMode,

    /// Bytes reclaimed from disk
    pub reclaimed_bytes: u64,

    /// Number of WAL segments removed
    pub wal_segments_removed: usize,

    /// Number of versions removed (Full mode only)
    pub versions_removed: usize,

    /// Snapshot watermark used for compaction (transaction ID)
    pub snapshot_watermark: Option<u64>,

    /// Duration of compaction operation in milliseconds
    pub duration_ms: u64,

    /// Timestamp when compaction completed (microseconds since epoch)
    pub timestamp: u64,
}

impl CompactInfo {
    /// Create a new CompactInfo for a given mode
    pub fn new(mode: CompactMode) -> Self {
        CompactInfo {
            mode,
            reclaimed_bytes: 0,
            wal_segments_removed: 0,
            versions_removed: 0,
            snapshot_watermark: None,
            duration_ms: 0,
            timestamp: 0,
        }
    }

    /// Check if any compaction actually occurred
    pub fn did_compact(&self) -> bool {
        self.wal_segments_removed > 0 || self.versions_removed > 0
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "mode={}, segments_removed={}, versions_removed={}, bytes_reclaimed={}, duration_ms={}",
            self.mode, self.wal_segments_removed, self.versions_removed, self.reclaimed_bytes, self.duration_ms
        )
    }
}

impl Default for CompactInfo {
    fn default() -> Self {
        Self::new(CompactMode::WALOnly)
    }
}

/// Compaction error types
#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    /// No snapshot available for compaction
    ///
    /// WAL-only compaction requires a snapshot to determine which
    /// segments are safe to remove.
    #[error("No snapshot available for compaction")]
    NoSnapshot,

    /// Compaction already in progress
    ///
    /// Only one compaction can run at a time to ensure consistency.
    #[error("Compaction already in progress")]
    AlreadyInProgress,

    /// IO error during compaction
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Retention policy error
    #[error("Retention error: {0}")]
    Retention(String),

    /// MANIFEST error during compaction
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompactionError {
    /// Create a new retention error
    pub fn retention(msg: impl Into<String>) -> Self {
        CompactionError::Retention(msg.into())
    }

    /// Create a new manifest error
    pub fn manifest(msg: impl Into<String>) -> Self {
        CompactionError::Manifest(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        CompactionError::Internal(msg.into())
    }
}
