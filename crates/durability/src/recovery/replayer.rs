//! WAL replay for recovery
//!
//! Replays WAL records to reconstruct database state.
//! Replay is deterministic and idempotent.
//!
//! # Replay Properties
//!
//! - **Deterministic**: Same records always produce the same state
//! - **Idempotent**: Multiple replays yield identical results
//! - **Ordered**: Records are applied in txn_id order
//!
//! # Usage
//!
//! ```ignore
//! let replayer = WalReplayer::new(wal_dir, codec);
//! let stats = replayer.replay_after(Some(watermark), |record| {
//!     // Apply record to your state
//!     Ok(())
//! })?;
//! ```

use std::path::{Path, PathBuf};

use crate::codec::StorageCodec;
use crate::format::WalRecord;
use crate::wal::reader::{WalReadResult, WalReaderError};
use crate::wal::WalReader;

/// WAL replay engine
///
/// Coordinates replay of WAL records with watermark filtering.
pub struct WalReplayer {
    wal_dir: PathBuf,
    reader: WalReader,
}

impl WalReplayer {
    /// Create a new WAL replayer
    pub fn new(wal_dir: PathBuf, codec: Box<dyn StorageCodec>) -> Self {
        WalReplayer {
            wal_dir,
            reader: WalReader::new(codec),
        }
    }

    /// Get the WAL directory
    pub fn wal_dir(&self) -> &Path {
        &self.wal_dir
    }

    /// Get a reference to the underlying WAL reader
    pub fn reader(&self) -> &WalReader {
        &self.reader
    }

    /// List all WAL segments
    pub fn list_segments(&self) -> Result<Vec<u64>, WalReplayError> {
        self.reader
            .list_segments(&self.wal_dir)
            .map_err(WalReplayError::from)
    }

    /// Read all WAL records
    pub fn read_all(&self) -> Result<WalReadResult, WalReplayError> {
        self.reader
            .read_all(&self.wal_dir)
            .map_err(WalReplayError::from)
    }

    /// Replay WAL records after a given watermark
    ///
    /// Records with txn_id <= watermark are skipped.
    /// Records with txn_id > watermark are passed to the apply function.
    ///
    /// # Determinism
    ///
    /// Same records -> same state. The apply function receives records
    /// in the same order every time.
    ///
    /// # Idempotence
    ///
    /// Multiple replays -> same result. The apply function should handle
    /// re-applying records gracefully.
    pub fn replay_after<F>(
        &self,
        watermark: Option<u64>,
        mut apply_fn: F,
    ) -> Result<ReplayStats, WalReplayError>
    where
        F: FnMut(&WalRecord) -> Result<(), WalReplayError>,
    {
        let mut stats = ReplayStats::default();

        let segments = self.list_segments()?;
        stats.segments_read = segments.len();

        for segment_number in segments {
            let (records, _valid_end, _stop_reason, skipped_corrupted) = self
                .reader
                .read_segment(&self.wal_dir, segment_number)
                .map_err(WalReplayError::from)?;

            stats.records_skipped_corrupted += skipped_corrupted;

            for record in records {
                stats.records_read += 1;

                // Skip records at or before watermark
                if let Some(w) = watermark {
                    if record.txn_id <= w {
                        stats.records_skipped += 1;
                        continue;
                    }
                }

                apply_fn(&record)?;
                stats.records_applied += 1;
            }
        }

        if stats.records_skipped_corrupted > 0 {
            tracing::warn!(
                skipped = stats.records_skipped_corrupted,
                "Skipped corrupted WAL records during recovery"
            );
        }

        Ok(stats)
    }

    /// Replay all records without watermark filtering
    pub fn replay_all<F>(&self, apply_fn: F) -> Result<ReplayStats, WalReplayError>
    where
        F: FnMut(&WalRecord) -> Result<(), WalReplayError>,
    {
        self.replay_after(None, apply_fn)
    }

    /// Collect all records after a watermark (without applying)
    pub fn collect_after_watermark(
        &self,
        watermark: Option<u64>,
    ) -> Result<Vec<WalRecord>, WalReplayError> {
        let mut records = Vec::new();

        self.replay_after(watermark, |record| {
            records.push(record.clone());
            Ok(())
        })?;

        Ok(records)
    }

    /// Get the maximum transaction ID in the WAL
    pub fn max_txn_id(&self) -> Result<Option<u64>, WalReplayError> {
        self.reader
            .max_txn_id(&self.wal_dir)
            .map_err(WalReplayError::from)
    }
}

/// Statistics from WAL replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of segments read
    pub segments_read: usize,
    /// Total number of records read
    pub records_read: usize,
    /// Records skipped due to watermark
    pub records_skipped: usize,
    /// Records successfully applied
    pub records_applied: usize,
    /// Records skipped due to corruption (checksum mismatch)
    pub records_skipped_corrupted: usize,
}

impl ReplayStats {
    /// Create empty stats
    pub fn new() -> Self {
        ReplayStats::default()
    }

    /// Check if any records were applied
    pub fn has_records(&self) -> bool {
        self.records_applied > 0
    }

    /// Check if any records were skipped
    pub fn has_skipped(&self) -> bool {
        self.records_skipped > 0
    }
}

/// WAL replay errors
#[derive(Debug, thiserror::Error)]
pub enum WalReplayError {
    /// WAL reader error
    #[error("WAL reader error: {0}")]
    Reader(#[from] WalReaderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Apply error (from callback)
    #[error("Apply error: {0}")]
    Apply(String),
}

impl WalReplayError {
    /// Create an apply error from a message
    pub fn apply(msg: impl Into<String>) -> Self {
        WalReplayError::Apply(msg.into())
    }
}
