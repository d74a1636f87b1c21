//! Size limits for values and keys
//!
//! This module defines configurable size limits that are enforced by the engine
//! and wire decoding. Violations result in `ConstraintViolation` errors.
//!
//! ## Contract
//!
//! After stabilization, the default limits are FROZEN and cannot change without a major
//! version bump. Custom limits can be set at database open time.

use crate::Value;
use thiserror::Error;

/// Size limits for values and keys
///
/// These limits are enforced by the engine and wire decoding.
/// Violations return `ConstraintViolation` with appropriate reason codes.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum key length in bytes (default: 1024)
    pub max_key_bytes: usize,

    /// Maximum string length in bytes (default: 16MB)
    pub max_string_bytes: usize,

    /// Maximum bytes length (default: 16MB)
    pub max_bytes_len: usize,

    /// Maximum encoded value size in bytes (default: 32MB)
    pub max_value_bytes_encoded: usize,

    /// Maximum array length (default: 1M elements)
    pub max_array_len: usize,

    /// Maximum object entries (default: 1M entries)
    pub max_object_entries: usize,

    /// Maximum nesting depth (default: 128)
    pub max_nesting_depth: usize,

    /// Maximum vector dimensions (default: 8192)
    pub max_vector_dim: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: 1024,
            max_string_bytes: 16 * 1024 * 1024,        // 16MB
            max_bytes_len: 16 * 1024 * 1024,           // 16MB
            max_value_bytes_encoded: 32 * 1024 * 1024, // 32MB
            max_array_len: 1_000_000,
            max_object_entries: 1_000_000,
            max_nesting_depth: 128,
            max_vector_dim: 8192,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    ///
    /// This is useful for unit tests that need to test limit enforcement
    /// without creating extremely large values.
    pub fn with_small_limits() -> Self {
        Limits {
            max_key_bytes: 100,
            max_string_bytes: 1000,
            max_bytes_len: 1000,
            max_value_bytes_encoded: 2000,
            max_array_len: 100,
            max_object_entries: 100,
            max_nesting_depth: 10,
            max_vector_dim: 100,
        }
    }

    /// Validate a key length
    ///
    /// Returns `Ok(())` if the key length is valid, or `Err(LimitError::KeyTooLong)`
    /// if it exceeds the maximum.
    ///
    /// Note: This only validates length. For full key validation including
    /// NUL bytes and reserved prefixes, use `validate_key()` from the `key` module.
    pub fn validate_key_length(&self, key: &str) -> Result<(), LimitError> {
        let len = key.len();
        if len > self.max_key_bytes {
            return Err(LimitError::KeyTooLong {
                actual: len,
                max: self.max_key_bytes,
            });
        }
        Ok(())
    }

    /// Validate a value against size limits
    ///
    /// This validates:
    /// - String length
    /// - Bytes length
    /// - Array length
    /// - Object entries count
    /// - Nesting depth (recursive)
    ///
    /// Does NOT validate encoded size (that must be checked separately).
    pub fn validate_value(&self, value: &Value) -> Result<(), LimitError> {
        self.validate_value_impl(value, 0)
    }

    fn validate_value_impl(&self, value: &Value, depth: usize) -> Result<(), LimitError> {
        if depth > self.max_nesting_depth {
            return Err(LimitError::NestingTooDeep {
                actual: depth,
                max: self.max_nesting_depth,
            });
        }

        match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(()),

            Value::String(s) => {
                if s.len() > self.max_string_bytes {
                    return Err(LimitError::ValueTooLarge {
                        reason: "string_too_long".to_string(),
                        actual: s.len(),
                        max: self.max_string_bytes,
                    });
                }
                Ok(())
            }

            Value::Bytes(b) => {
                if b.len() > self.max_bytes_len {
                    return Err(LimitError::ValueTooLarge {
                        reason: "bytes_too_long".to_string(),
                        actual: b.len(),
                        max: self.max_bytes_len,
                    });
                }
                Ok(())
            }

            Value::Array(arr) => {
                if arr.len() > self.max_array_len {
                    return Err(LimitError::ValueTooLarge {
                        reason: "array_too_long".to_string(),
                        actual: arr.len(),
                        max: self.max_array_len,
                    });
                }
                for v in arr {
                    self.validate_value_impl(v, depth + 1)?;
                }
                Ok(())
            }

            Value::Object(obj) => {
                if obj.len() > self.max_object_entries {
                    return Err(LimitError::ValueTooLarge {
                        reason: "object_too_many_entries".to_string(),
                        actual: obj.len(),
                        max: self.max_object_entries,
                    });
                }
                for v in obj.values() {
                    self.validate_value_impl(v, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Validate a vector against dimension limits
    pub fn validate_vector(&self, vec: &[f32]) -> Result<(), LimitError> {
        if vec.len() > self.max_vector_dim {
            return Err(LimitError::VectorDimExceeded {
                actual: vec.len(),
                max: self.max_vector_dim,
            });
        }
        Ok(())
    }

    /// Validate vector dimension matches existing dimension
    pub fn validate_vector_dimension_match(
        &self,
        existing_dim: usize,
        new_dim: usize,
    ) -> Result<(), LimitError> {
        if existing_dim != new_dim {
            return Err(LimitError::VectorDimMismatch {
                expected: existing_dim,
                actual: new_dim,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
///
/// These errors map to `ConstraintViolation` error codes in the wire protocol.
#[derive(Debug, Error)]
pub enum LimitError {
    /// Key exceeds maximum length
    #[error("Key too long: {actual} bytes exceeds maximum {max}")]
    KeyTooLong {
        /// Actual key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Value exceeds size limits
    #[error("Value too large ({reason}): {actual} exceeds maximum {max}")]
    ValueTooLarge {
        /// Reason code for the violation
        reason: String,
        /// Actual size
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Value nesting exceeds maximum depth
    #[error("Nesting too deep: {actual} levels exceeds maximum {max}")]
    NestingTooDeep {
        /// Actual nesting depth
        actual: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// Vector dimension exceeds maximum
    #[error("Vector dimension exceeded: {actual} exceeds maximum {max}")]
    VectorDimExceeded {
        /// Actual vector dimension
        actual: usize,
        /// Maximum allowed dimension
        max: usize,
    },

    /// Vector dimension mismatch with existing vector
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    VectorDimMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

impl LimitError {
    /// Get the reason code for wire protocol
    pub fn reason_code(&self) -> &'static str {
        match self {
            LimitError::KeyTooLong { .. } => "key_too_long",
            LimitError::ValueTooLarge { reason, .. } => match reason.as_str() {
                "string_too_long" => "value_too_large",
                "bytes_too_long" => "value_too_large",
                "array_too_long" => "value_too_large",
                "object_too_many_entries" => "value_too_large",
                _ => "value_too_large",
            },
            LimitError::NestingTooDeep { .. } => "nesting_too_deep",
            LimitError::VectorDimExceeded { .. } => "vector_dim_exceeded",
            LimitError::VectorDimMismatch { .. } => "vector_dim_mismatch",
        }
    }
}
