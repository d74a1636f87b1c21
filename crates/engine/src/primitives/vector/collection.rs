//! Collection management types and validation
//!
//! This module provides:
//! - Collection name validation
//! - Vector key validation
//!
//! CollectionId and CollectionInfo are defined in types.rs.

use crate::primitives::vector::VectorError;

/// Validate a collection name
///
/// # Validation Rules
/// - Cannot be empty
/// - Cannot exceed 256 characters
/// - Cannot contain '/' (used as key separator)
/// - Cannot contain null bytes
/// - Cannot start with '_' (reserved for system use)
pub fn validate_collection_name(name: &str) -> Result<(), VectorError> {
    if name.is_empty() {
        return Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: "Collection name cannot be empty".to_string(),
        });
    }

    if name.len() > 256 {
        return Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: "Collection name cannot exceed 256 characters".to_string(),
        });
    }

    // Forbidden characters that could cause key parsing issues
    if name.contains('/') {
        return Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: "Collection name cannot contain '/'".to_string(),
        });
    }

    if name.contains('\0') {
        return Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: "Collection name cannot contain null bytes".to_string(),
        });
    }

    // Names starting with underscore are reserved for system use
    if name.starts_with('_') {
        return Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: "Collection names starting with '_' are reserved".to_string(),
        });
    }

    Ok(())
}

/// Validate a vector key
///
/// # Validation Rules
/// - Can be empty (empty string keys are allowed)
/// - Cannot exceed 1024 characters
/// - Cannot contain null bytes
pub fn validate_vector_key(key: &str) -> Result<(), VectorError> {
    // Empty string keys are allowed (consistent with other key-value stores)
    if key.len() > 1024 {
        return Err(VectorError::InvalidKey {
            key: key.to_string(),
            reason: "Vector key cannot exceed 1024 characters".to_string(),
        });
    }

    if key.contains('\0') {
        return Err(VectorError::InvalidKey {
            key: key.to_string(),
            reason: "Vector key cannot contain null bytes".to_string(),
        });
    }

    Ok(())
}
