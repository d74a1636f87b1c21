//! Transaction writeset serialization format.
//!
//! A writeset contains all mutations from a committed transaction.
//! This module provides compact binary serialization for WAL persistence.
//!
//! # Format
//!
//! ```text
//! Writeset Layout:
//! ┌──────────────────┬──────────────────────────────────────────────┐
//! │ Count (4 bytes)  │ Mutations (variable)                         │
//! └──────────────────┴──────────────────────────────────────────────┘
//!
//! Mutation Layout:
//! ┌──────────────────┬──────────────────┬────────────────────────────┐
//! │ Tag (1 byte)     │ EntityRef        │ Value/Version (variant)    │
//! └──────────────────┴──────────────────┴────────────────────────────┘
//!
//! EntityRef Layout:
//! ┌──────────────────┬──────────────────┬────────────────────────────┐
//! │ Tag (1 byte)     │ RunId (16 bytes) │ Variant fields             │
//! └──────────────────┴──────────────────┴────────────────────────────┘
//! ```

use strata_core::{EntityRef, JsonDocId, RunId};

/// Mutation tag bytes
const MUTATION_PUT: u8 = 0x01;
const MUTATION_DELETE: u8 = 0x02;
const MUTATION_APPEND: u8 = 0x03;

/// EntityRef tag bytes
const ENTITY_KV: u8 = 0x01;
const ENTITY_EVENT: u8 = 0x02;
const ENTITY_STATE: u8 = 0x03;
const ENTITY_TRACE: u8 = 0x04;
const ENTITY_RUN: u8 = 0x05;
const ENTITY_JSON: u8 = 0x06;
const ENTITY_VECTOR: u8 = 0x07;

/// A mutation within a transaction writeset.
///
/// Each mutation represents a single operation that modifies the database state.
/// The version is assigned by the engine before persistence, NOT by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Put (create or update) a value.
    ///
    /// Used for KV, State, Json, Vector, Run primitives.
    Put {
        /// Entity being modified
        entity_ref: EntityRef,
        /// Serialized value (codec-encoded)
        value: Vec<u8>,
        /// Version assigned by engine
        version: u64,
    },

    /// Delete an entity.
    Delete {
        /// Entity being deleted
        entity_ref: EntityRef,
    },

    /// Append to an append-only entity.
    ///
    /// Used for Event and Trace primitives.
    Append {
        /// Entity being appended to
        entity_ref: EntityRef,
        /// Serialized value (codec-encoded)
        value: Vec<u8>,
        /// Version assigned by engine
        version: u64,
    },
}

impl Mutation {
    /// Get the entity reference for this mutation.
    pub fn entity_ref(&self) -> &EntityRef {
        match self {
            Mutation::Put { entity_ref, .. } => entity_ref,
            Mutation::Delete { entity_ref } => entity_ref,
            Mutation::Append { entity_ref, .. } => entity_ref,
        }
    }
}

/// Transaction writeset containing all mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Writeset {
    /// List of mutations in commit order
    pub mutations: Vec<Mutation>,
}

impl Writeset {
    /// Create an empty writeset.
    pub fn new() -> Self {
        Writeset {
            mutations: Vec::new(),
        }
    }

    /// Create a writeset with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Writeset {
            mutations: Vec::with_capacity(capacity),
        }
    }

    /// Add a Put mutation.
    pub fn put(&mut self, entity_ref: EntityRef, value: Vec<u8>, version: u64) {
        self.mutations.push(Mutation::Put {
            entity_ref,
            value,
            version,
        });
    }

    /// Add a Delete mutation.
    pub fn delete(&mut self, entity_ref: EntityRef) {
        self.mutations.push(Mutation::Delete { entity_ref });
    }

    /// Add an Append mutation.
    pub fn append(&mut self, entity_ref: EntityRef, value: Vec<u8>, version: u64) {
        self.mutations.push(Mutation::Append {
            entity_ref,
            value,
            version,
        });
    }

    /// Check if writeset is empty.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Get number of mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Serialize writeset to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        // Write mutation count
        bytes.extend_from_slice(&(self.mutations.len() as u32).to_le_bytes());

        // Write each mutation
        for mutation in &self.mutations {
            Self::write_mutation(&mut bytes, mutation);
        }

        bytes
    }

    /// Deserialize writeset from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WritesetError> {
        if bytes.len() < 4 {
            return Err(WritesetError::InsufficientData);
        }

        let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let mut cursor = 4;
        let mut mutations = Vec::with_capacity(count);

        for _ in 0..count {
            let (mutation, consumed) = Self::read_mutation(&bytes[cursor..])?;
            mutations.push(mutation);
            cursor += consumed;
        }

        Ok(Writeset { mutations })
    }

    /// Write a single mutation to the byte buffer.
    fn write_mutation(bytes: &mut Vec<u8>, mutation: &Mutation) {
        match mutation {
            Mutation::Put {
                entity_ref,
                value,
                version,
            } => {
                bytes.push(MUTATION_PUT);
                Self::write_entity_ref(bytes, entity_ref);
                bytes.extend_from_slice(&version.to_le_bytes());
                bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
                bytes.extend_from_slice(value);
            }
            Mutation::Delete { entity_ref } => {
                bytes.push(MUTATION_DELETE);
                Self::write_entity_ref(bytes, entity_ref);
            }
            Mutation::Append {
                entity_ref,
                value,
                version,
            } => {
                bytes.push(MUTATION_APPEND);
                Self::write_entity_ref(bytes, entity_ref);
                bytes.extend_from_slice(&version.to_le_bytes());
                bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
                bytes.extend_from_slice(value);
            }
        }
    }

    /// Read a single mutation from bytes.
    fn read_mutation(bytes: &[u8]) -> Result<(Mutation, usize), WritesetError> {
        if bytes.is_empty() {
            return Err(WritesetError::InsufficientData);
        }

        let tag = bytes[0];
        let mut cursor = 1;

        match tag {
            MUTATION_PUT => {
                let (entity_ref, consumed) = Self::read_entity_ref(&bytes[cursor..])?;
                cursor += consumed;

                if bytes.len() < cursor + 12 {
                    return Err(WritesetError::InsufficientData);
                }

                let version = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
                cursor += 8;

                let value_len =
                    u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
                cursor += 4;

                if bytes.len() < cursor + value_len {
                    return Err(WritesetError::InsufficientData);
                }

                let value = bytes[cursor..cursor + value_len].to_vec();
                cursor += value_len;

                Ok((
                    Mutation::Put {
                        entity_ref,
                        value,
                        version,
                    },
                    cursor,
                ))
            }
            MUTATION_DELETE => {
                let (entity_ref, consumed) = Self::read_entity_ref(&bytes[cursor..])?;
                cursor += consumed;
                Ok((Mutation::Delete { entity_ref }, cursor))
            }
            MUTATION_APPEND => {
                let (entity_ref, consumed) = Self::read_entity_ref(&bytes[cursor..])?;
                cursor += consumed;

                if bytes.len() < cursor + 12 {
                    return Err(WritesetError::InsufficientData);
                }

                let version = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
                cursor += 8;

                let value_len =
                    u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
                cursor += 4;

                if bytes.len() < cursor + value_len {
                    return Err(WritesetError::InsufficientData);
                }

                let value = bytes[cursor..cursor + value_len].to_vec();
                cursor += value_len;

                Ok((
                    Mutation::Append {
                        entity_ref,
                        value,
                        version,
                    },
                    cursor,
                ))
            }
            _ => Err(WritesetError::InvalidMutationTag(tag)),
        }
    }

    /// Write an EntityRef to the byte buffer.
    fn write_entity_ref(bytes: &mut Vec<u8>, entity_ref: &EntityRef) {
        match entity_ref {
            EntityRef::Kv { run_id, key } => {
                bytes.push(ENTITY_KV);
                bytes.extend_from_slice(run_id.as_bytes());
                Self::write_string(bytes, key);
            }
            EntityRef::Event { run_id, sequence } => {
                bytes.push(ENTITY_EVENT);
                bytes.extend_from_slice(run_id.as_bytes());
                bytes.extend_from_slice(&sequence.to_le_bytes());
            }
            EntityRef::State { run_id, name } => {
                bytes.push(ENTITY_STATE);
                bytes.extend_from_slice(run_id.as_bytes());
                Self::write_string(bytes, name);
            }
            EntityRef::Trace { run_id, trace_id } => {
                bytes.push(ENTITY_TRACE);
                bytes.extend_from_slice(run_id.as_bytes());
                Self::write_string(bytes, trace_id);
            }
            EntityRef::Run { run_id } => {
                bytes.push(ENTITY_RUN);
                bytes.extend_from_slice(run_id.as_bytes());
            }
            EntityRef::Json { run_id, doc_id } => {
                bytes.push(ENTITY_JSON);
                bytes.extend_from_slice(run_id.as_bytes());
                bytes.extend_from_slice(doc_id.as_bytes());
            }
            EntityRef::Vector {
                run_id,
                collection,
                key,
            } => {
                bytes.push(ENTITY_VECTOR);
                bytes.extend_from_slice(run_id.as_bytes());
                Self::write_string(bytes, collection);
                Self::write_string(bytes, key);
            }
        }
    }

    /// Read an EntityRef from bytes.
    fn read_entity_ref(bytes: &[u8]) -> Result<(EntityRef, usize), WritesetError> {
        if bytes.is_empty() {
            return Err(WritesetError::InsufficientData);
        }

        let tag = bytes[0];
        let mut cursor = 1;

        // All variants have run_id first (16 bytes)
        if bytes.len() < cursor + 16 {
            return Err(WritesetError::InsufficientData);
        }

        let run_id_bytes: [u8; 16] = bytes[cursor..cursor + 16].try_into().unwrap();
        let run_id = RunId::from_bytes(run_id_bytes);
        cursor += 16;

        match tag {
            ENTITY_KV => {
                let (key, consumed) = Self::read_string(&bytes[cursor..])?;
                cursor += consumed;
                Ok((EntityRef::Kv { run_id, key }, cursor))
            }
            ENTITY_EVENT => {
                if bytes.len() < cursor + 8 {
                    return Err(WritesetError::InsufficientData);
                }
                let sequence = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
                cursor += 8;
                Ok((EntityRef::Event { run_id, sequence }, cursor))
            }
            ENTITY_STATE => {
                let (name, consumed) = Self::read_string(&bytes[cursor..])?;
                cursor += consumed;
                Ok((EntityRef::State { run_id, name }, cursor))
            }
            ENTITY_TRACE => {
                let (trace_id, consumed) = Self::read_string(&bytes[cursor..])?;
                cursor += consumed;
                Ok((EntityRef::Trace { run_id, trace_id }, cursor))
            }
            ENTITY_RUN => Ok((EntityRef::Run { run_id }, cursor)),
            ENTITY_JSON => {
                if bytes.len() < cursor + 16 {
                    return Err(WritesetError::InsufficientData);
                }
                let doc_id = JsonDocId::try_from_bytes(&bytes[cursor..cursor + 16])
                    .ok_or(WritesetError::InvalidEntityRef)?;
                cursor += 16;
                Ok((EntityRef::Json { run_id, doc_id }, cursor))
            }
            ENTITY_VECTOR => {
                let (collection, consumed) = Self::read_string(&bytes[cursor..])?;
                cursor += consumed;
                let (key, consumed) = Self::read_string(&bytes[cursor..])?;
                cursor += consumed;
                Ok((
                    EntityRef::Vector {
                        run_id,
                        collection,
                        key,
                    },
                    cursor,
                ))
            }
            _ => Err(WritesetError::InvalidEntityRefTag(tag)),
        }
    }

    /// Write a length-prefixed string.
    fn write_string(bytes: &mut Vec<u8>, s: &str) {
        let str_bytes = s.as_bytes();
        bytes.extend_from_slice(&(str_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(str_bytes);
    }

    /// Read a length-prefixed string.
    fn read_string(bytes: &[u8]) -> Result<(String, usize), WritesetError> {
        if bytes.len() < 4 {
            return Err(WritesetError::InsufficientData);
        }

        let len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;

        if bytes.len() < 4 + len {
            return Err(WritesetError::InsufficientData);
        }

        let s = String::from_utf8(bytes[4..4 + len].to_vec())
            .map_err(|_| WritesetError::InvalidString)?;

        Ok((s, 4 + len))
    }
}

/// Writeset parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WritesetError {
    /// Not enough data to parse
    #[error("Insufficient data")]
    InsufficientData,

    /// Invalid mutation tag byte
    #[error("Invalid mutation tag: {0:#04x}")]
    InvalidMutationTag(u8),

    /// Invalid entity ref tag byte
    #[error("Invalid entity ref tag: {0:#04x}")]
    InvalidEntityRefTag(u8),

    /// Invalid entity ref structure
    #[error("Invalid entity ref")]
    InvalidEntityRef,

    /// Invalid string (not UTF-8)
    #[error("Invalid string encoding")]
    InvalidString,
}
