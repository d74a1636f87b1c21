//! Metadata filtering for vector search
//!
//! Re-exports canonical types from strata-core.
//! Supports only equality filtering on top-level scalar fields.
//! Complex filters (ranges, nested paths, arrays) are deferred to future versions.

// Re-export canonical filter types from core
pub use strata_core::primitives::{JsonScalar, MetadataFilter};
