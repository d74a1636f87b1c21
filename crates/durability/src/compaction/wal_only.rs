//! WAL-only compaction
//!
//! Removes WAL segments that are fully covered by a snapshot watermark.
//! This is the safest compaction mode - it only removes data that is
//! guaranteed to be recoverable from the snapshot.
//!
//! # Algorithm
//!
//! 1. Get snapshot watermark (transaction ID) from MANIFEST
//! 2. List all WAL segments
//! 3. For each segment (except the active segment):
//!    - Read all records and find the highest txn_id
//!    - If highest txn_id <= watermark, segment is covered
//!    - Delete covered segments
//! 4. Track reclaimed bytes and segment count
//!
//! # Safety
//!
//! - Never removes the active segment
//! - Only removes segments fully covered by snapshot
//! - Requires a valid snapshot to exist

use crate::format::segment_meta::SegmentMeta;
use crate::format::{
    ManifestManager, SegmentHeader, WalRecord, WalRecordError, SEGMENT_HEADER_SIZE,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{CompactInfo, CompactMode, CompactionError};

/// WAL-only compactor
///
/// Removes WAL segments covered by snapshot watermark.
pub struct WalOnlyCompactor {
    wal_dir: PathBuf,
    manifest: Arc<Mutex<ManifestManager>>,
}

impl WalOnlyCompactor {
    /// Create a new WAL-only compactor
    pub fn new(wal_dir: PathBuf, manifest: Arc<Mutex<ManifestManager>>) -> Self {
        WalOnlyCompactor { wal_dir, manifest }
    }

    /// Perform WAL-only compaction
    ///
    /// Removes WAL segments whose highest txn_id <= snapshot watermark.
    /// Returns information about what was compacted.
    ///
    /// # Errors
    ///
    /// - `NoSnapshot`: No snapshot exists to compact against
    /// - `Io`: File system errors during segment access/deletion
    pub fn compact(&self) -> Result<CompactInfo, CompactionError> {
        info!(target: "strata::compaction", "WAL compaction started");
        let start_time = std::time::Instant::now();
        let mut info = CompactInfo::new(CompactMode::WALOnly);

        // Get snapshot watermark from MANIFEST
        let (watermark, active_segment) = {
            let manifest = self.manifest.lock();

            let watermark = manifest
                .manifest()
                .snapshot_watermark
                .ok_or(CompactionError::NoSnapshot)?;

            let active_segment = manifest.manifest().active_wal_segment;

            (watermark, active_segment)
        };

        info.snapshot_watermark = Some(watermark);

        // List all WAL segments
        let segments = self.list_segments()?;

        for segment_number in segments {
            // Never remove active segment
            if segment_number >= active_segment {
                continue;
            }

            // Check if segment is fully covered by snapshot
            match self.segment_covered_by_watermark(segment_number, watermark) {
                Ok(true) => {
                    let segment_path = segment_path(&self.wal_dir, segment_number);

                    match std::fs::metadata(&segment_path) {
                        Ok(metadata) => {
                            let segment_size = metadata.len();

                            if let Err(e) = std::fs::remove_file(&segment_path) {
                                // Log but continue - partial compaction is acceptable
                                warn!(
                                    target: "strata::compaction",
                                    segment = segment_number,
                                    error = %e,
                                    "Failed to remove WAL segment"
                                );
                                continue;
                            }

                            // Also remove the .meta sidecar (non-fatal if missing)
                            let meta_path = SegmentMeta::meta_path(&self.wal_dir, segment_number);
                            if meta_path.exists() {
                                if let Err(e) = std::fs::remove_file(&meta_path) {
                                    warn!(
                                        target: "strata::compaction",
                                        segment = segment_number,
                                        error = %e,
                                        "Failed to remove .meta sidecar"
                                    );
                                }
                            }

                            info.reclaimed_bytes += segment_size;
                            info.wal_segments_removed += 1;
                        }
                        Err(e) => {
                            // Segment might have been removed by another process
                            warn!(
                                target: "strata::compaction",
                                segment = segment_number,
                                error = %e,
                                "Failed to stat WAL segment"
                            );
                        }
                    }
                }
                Ok(false) => {
                    // Segment has records beyond watermark, keep it
                }
                Err(e) => {
                    // Error reading segment - skip it for safety
                    warn!(
                        target: "strata::compaction",
                        segment = segment_number,
                        error = %e,
                        "Failed to check WAL segment coverage"
                    );
                }
            }
        }

        info.duration_ms = start_time.elapsed().as_millis() as u64;
        info.timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        info!(target: "strata::compaction", "WAL compaction completed");
        Ok(info)
    }

    /// List all WAL segment numbers in sorted order
    fn list_segments(&self) -> Result<Vec<u64>, CompactionError> {
        let mut segments = Vec::new();

        if !self.wal_dir.exists() {
            return Ok(segments);
        }

        for entry in std::fs::read_dir(&self.wal_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            // Match wal-NNNNNN.seg pattern
            if name.starts_with("wal-") && name.ends_with(".seg") && name.len() == 14 {
                if let Ok(num) = name[4..10].parse::<u64>() {
                    segments.push(num);
                }
            }
        }

        segments.sort_unstable();
        Ok(segments)
    }

    /// Check if a segment is fully covered by the snapshot watermark.
    ///
    /// A segment is covered if its highest txn_id <= watermark.
    /// Tries `.meta` sidecar first for O(1) check; falls back to full scan.
    fn segment_covered_by_watermark(
        &self,
        segment_number: u64,
        watermark: u64,
    ) -> Result<bool, CompactionError> {
        // Try .meta sidecar first (O(1) check)
        match SegmentMeta::read_from_file(&self.wal_dir, segment_number) {
            Ok(Some(meta)) if meta.segment_number == segment_number => {
                if meta.is_empty() {
                    debug!(target: "strata::compaction", segment = segment_number, "Empty segment (via .meta), considered covered");
                    return Ok(true);
                }
                let covered = meta.max_txn_id <= watermark;
                debug!(target: "strata::compaction", segment = segment_number, max_txn_id = meta.max_txn_id, watermark, covered, "Coverage check via .meta");
                return Ok(covered);
            }
            Ok(Some(_)) => {
                warn!(target: "strata::compaction", segment = segment_number, "Segment meta has mismatched segment number, falling back to full scan");
            }
            Ok(None) => {
                // No .meta file — fall through to full scan
            }
            Err(e) => {
                warn!(target: "strata::compaction", segment = segment_number, error = %e, "Corrupted .meta sidecar, falling back to full scan");
            }
        }

        self.segment_covered_by_watermark_full_scan(segment_number, watermark)
    }

    /// Full-scan fallback: read all records to determine max txn_id.
    fn segment_covered_by_watermark_full_scan(
        &self,
        segment_number: u64,
        watermark: u64,
    ) -> Result<bool, CompactionError> {
        let segment_path = segment_path(&self.wal_dir, segment_number);
        let file_data = std::fs::read(&segment_path)?;

        // Validate segment header (need at least v1 header size)
        if file_data.len() < SEGMENT_HEADER_SIZE {
            return Err(CompactionError::internal(format!(
                "Segment {} too small for header",
                segment_number
            )));
        }

        let header = SegmentHeader::from_bytes_slice(&file_data).ok_or_else(|| {
            CompactionError::internal(format!("Invalid segment {} header", segment_number))
        })?;

        if !header.is_valid() {
            return Err(CompactionError::internal(format!(
                "Segment {} has invalid magic",
                segment_number
            )));
        }

        // Determine actual header size based on format version
        let actual_header_size = if header.format_version >= 2 {
            crate::format::SEGMENT_HEADER_SIZE_V2
        } else {
            SEGMENT_HEADER_SIZE
        };

        // Empty segment (just header) is considered covered
        if file_data.len() <= actual_header_size {
            return Ok(true);
        }

        // Find highest txn_id in segment
        let mut cursor = actual_header_size;
        let mut max_txn_id = 0u64;

        while cursor < file_data.len() {
            match WalRecord::from_bytes(&file_data[cursor..]) {
                Ok((record, consumed)) => {
                    max_txn_id = max_txn_id.max(record.txn_id);
                    cursor += consumed;
                }
                Err(WalRecordError::InsufficientData) => {
                    break;
                }
                Err(WalRecordError::ChecksumMismatch { .. }) => {
                    break;
                }
                Err(_) => {
                    break;
                }
            }
        }

        // Segment is covered if all records are at or below watermark
        Ok(max_txn_id <= watermark)
    }

    /// Get the WAL directory path
    pub fn wal_dir(&self) -> &Path {
        &self.wal_dir
    }
}

/// Generate segment file path
///
/// Format: `wal-NNNNNN.seg` where NNNNNN is zero-padded segment number.
fn segment_path(dir: &Path, segment_number: u64) -> PathBuf {
    dir.join(format!("wal-{:06}.seg", segment_number))
}
