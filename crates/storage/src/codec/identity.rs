//! Identity codec (no transformation).
//!
//! This is the default codec for M10. It performs no transformation on data,
//! simply passing bytes through unchanged. This establishes the codec seam
//! for future encryption-at-rest without adding complexity to M10.

use super::traits::{CodecError, StorageCodec};

/// Identity codec - no transformation.
///
/// Bytes pass through unchanged. This is the default codec for M10.
///
/// # Example
///
/// ```
/// use strata_storage::codec::{StorageCodec, IdentityCodec};
///
/// let codec = IdentityCodec;
/// let data = b"hello world";
///
/// let encoded = codec.encode(data);
/// assert_eq!(data.as_slice(), encoded.as_slice());
///
/// let decoded = codec.decode(&encoded).unwrap();
/// assert_eq!(data.as_slice(), decoded.as_slice());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}
