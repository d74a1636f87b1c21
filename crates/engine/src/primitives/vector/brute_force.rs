//! Brute-Force Vector Search Backend
//!
//! Simple O(n) brute-force implementation.
//! Sufficient for datasets < 10K vectors.
//! Performance degrades linearly with dataset size.
//!
//! Switch threshold: P95 > 100ms at 50K vectors triggers HNSW priority.

use std::cmp::Ordering;

use crate::primitives::vector::backend::VectorIndexBackend;
use crate::primitives::vector::distance::compute_similarity;
use crate::primitives::vector::{DistanceMetric, VectorConfig, VectorError, VectorHeap, VectorId};

/// Brute-force vector search backend
///
/// Simple O(n) brute-force implementation.
/// Sufficient for datasets < 10K vectors.
/// Performance degrades linearly with dataset size.
///
/// Switch threshold: P95 > 100ms at 50K vectors triggers HNSW priority.
pub struct BruteForceBackend {
    /// Vector heap (contiguous storage)
    heap: VectorHeap,
}

impl BruteForceBackend {
    /// Create a new brute-force backend
    pub fn new(config: &VectorConfig) -> Self {
        BruteForceBackend {
            heap: VectorHeap::new(config.clone()),
        }
    }

    /// Create from existing heap (for recovery)
    pub fn from_heap(heap: VectorHeap) -> Self {
        BruteForceBackend { heap }
    }

    /// Get mutable access to heap (for recovery)
    pub fn heap_mut(&mut self) -> &mut VectorHeap {
        &mut self.heap
    }

    /// Get read access to heap (for snapshot)
    pub fn heap(&self) -> &VectorHeap {
        &self.heap
    }
}

impl VectorIndexBackend for BruteForceBackend {
    fn allocate_id(&mut self) -> VectorId {
        // Delegate to heap's per-collection counter
        self.heap.allocate_id()
    }

    fn insert(&mut self, id: VectorId, embedding: &[f32]) -> Result<(), VectorError> {
        self.heap.upsert(id, embedding)
    }

    fn insert_with_id(&mut self, id: VectorId, embedding: &[f32]) -> Result<(), VectorError> {
        // Use heap's insert_with_id which updates next_id for monotonicity
        self.heap.insert_with_id(id, embedding)
    }

    fn delete(&mut self, id: VectorId) -> Result<bool, VectorError> {
        Ok(self.heap.delete(id))
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(VectorId, f32)> {
        if k == 0 || self.heap.is_empty() {
            return Vec::new();
        }

        // Validate query dimension
        if query.len() != self.heap.dimension() {
            // Return empty on dimension mismatch (validated at facade level)
            return Vec::new();
        }

        let metric = self.heap.metric();

        // Compute similarities for all vectors
        // IMPORTANT: heap.iter() returns vectors in VectorId order (BTreeMap)
        // This ensures deterministic iteration before scoring
        let mut results: Vec<(VectorId, f32)> = self
            .heap
            .iter()
            .map(|(id, embedding)| {
                let score = compute_similarity(query, embedding, metric);
                (id, score)
            })
            .collect();

        // Sort by (score desc, VectorId asc) for determinism
        // CRITICAL: VectorId tie-break ensures identical results across runs
        // This satisfies Invariant R4 (Backend tie-break)
        results.sort_by(|(id_a, score_a), (id_b, score_b)| {
            // Primary: score descending (higher = better)
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                // Secondary: VectorId ascending (deterministic tie-break)
                .then_with(|| id_a.cmp(id_b))
        });

        results.truncate(k);
        results
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn dimension(&self) -> usize {
        self.heap.dimension()
    }

    fn metric(&self) -> DistanceMetric {
        self.heap.metric()
    }

    fn config(&self) -> VectorConfig {
        self.heap.config().clone()
    }

    fn get(&self, id: VectorId) -> Option<&[f32]> {
        self.heap.get(id)
    }

    fn contains(&self, id: VectorId) -> bool {
        self.heap.contains(id)
    }

    fn index_type_name(&self) -> &'static str {
        "brute_force"
    }

    fn memory_usage(&self) -> usize {
        // Each active vector: dimension * 4 bytes (f32) for embedding data
        // Plus overhead for BTreeMap entries and free_slots.
        // For mmap-backed heaps, embedding bytes are 0 (OS manages pages).
        let embedding_bytes = if self.heap.is_mmap() {
            0
        } else {
            self.heap.raw_data().len() * std::mem::size_of::<f32>()
        };
        let map_overhead =
            self.heap.len() * (std::mem::size_of::<VectorId>() + std::mem::size_of::<usize>() + 64); // BTreeMap node overhead estimate
        let free_slots_bytes = self.heap.free_slots().len() * std::mem::size_of::<usize>();
        embedding_bytes + map_overhead + free_slots_bytes
    }

    fn vector_ids(&self) -> Vec<VectorId> {
        self.heap.ids().collect()
    }

    fn snapshot_state(&self) -> (u64, Vec<usize>) {
        (self.heap.next_id_value(), self.heap.free_slots().to_vec())
    }

    fn restore_snapshot_state(&mut self, next_id: u64, free_slots: Vec<usize>) {
        self.heap.restore_snapshot_state(next_id, free_slots);
    }
}
