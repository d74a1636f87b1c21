//! Core types for the Substrate API
//!
//! This module defines the fundamental types used across the Substrate API:
//! - `ApiRunId`: Run identifier (either "default" or UUID)
//! - `RunInfo`: Run metadata and state
//! - `RunState`: Run lifecycle state (Active/Closed)
//! - `RetentionPolicy`: History retention configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strata_core::Value;
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// The canonical name for the default run
pub const DEFAULT_RUN_NAME: &str = "default";

/// The default run ID (literal string "default")
pub const DEFAULT_RUN_ID: &str = "default";

// =============================================================================
// ApiRunId
// =============================================================================

/// Run identifier for the Substrate API
///
/// A run ID is either:
/// - The literal string "default" for the default run
/// - A UUID v4 in lowercase hyphenated format (e.g., "f47ac10b-58cc-4372-a567-0e02b2c3d479")
///
/// ## Validation
///
/// - "default" is always valid
/// - UUIDs must be valid UUID v4 format
/// - Empty strings are invalid
/// - Other strings are invalid
///
/// ## Examples
///
/// ```
/// use strata_api::substrate::ApiRunId;
///
/// // Default run
/// let default = ApiRunId::default_run_id();
/// assert!(default.is_default());
///
/// // New UUID run
/// let custom = ApiRunId::new();
/// assert!(!custom.is_default());
///
/// // Parse from string
/// let parsed = ApiRunId::parse("default").unwrap();
/// assert!(parsed.is_default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiRunId(String);

impl ApiRunId {
    /// Create a new random run ID (UUID v4)
    pub fn new() -> Self {
        ApiRunId(Uuid::new_v4().to_string())
    }

    /// Create the default run ID
    ///
    /// Returns a run ID for the default run (literal string "default").
    pub fn default_run_id() -> Self {
        ApiRunId(DEFAULT_RUN_NAME.to_string())
    }

    /// Parse a run ID from a string
    ///
    /// Returns `Some(ApiRunId)` if the string is valid, `None` otherwise.
    ///
    /// Valid formats:
    /// - "default" (case-sensitive)
    /// - UUID v4 in lowercase hyphenated format
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        if s == DEFAULT_RUN_NAME {
            return Some(ApiRunId(DEFAULT_RUN_NAME.to_string()));
        }

        // Try to parse as UUID
        if Uuid::parse_str(s).is_ok() {
            return Some(ApiRunId(s.to_lowercase()));
        }

        None
    }

    /// Check if this is the default run
    #[inline]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_RUN_NAME
    }

    /// Check if this is a UUID run (not default)
    #[inline]
    pub fn is_uuid(&self) -> bool {
        !self.is_default()
    }

    /// Get the string representation
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        ApiRunId(uuid.to_string())
    }

    /// Try to get the underlying UUID (returns None for default run)
    pub fn as_uuid(&self) -> Option<Uuid> {
        if self.is_default() {
            None
        } else {
            Uuid::parse_str(&self.0).ok()
        }
    }
}

impl Default for ApiRunId {
    fn default() -> Self {
        ApiRunId::default_run_id()
    }
}

impl fmt::Display for ApiRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiRunId {
    type Err = InvalidRunIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiRunId::parse(s).ok_or_else(|| InvalidRunIdError(s.to_string()))
    }
}

impl From<Uuid> for ApiRunId {
    fn from(uuid: Uuid) -> Self {
        ApiRunId::from_uuid(uuid)
    }
}

/// Error returned when parsing an invalid run ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRunIdError(pub String);

impl fmt::Display for InvalidRunIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid run ID '{}': must be 'default' or a valid UUID",
            self.0
        )
    }
}

impl std::error::Error for InvalidRunIdError {}

// =============================================================================
// RunState
// =============================================================================

/// Run lifecycle state
///
/// A run can be in one of two states:
/// - `Active`: The run is open and accepting operations
/// - `Closed`: The run has been closed and is read-only
///
/// ## State Transitions
///
/// ```text
/// [Created] --> Active --> Closed
/// ```
///
/// Once a run is closed, it cannot be reopened.
/// The default run cannot be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Run is active and accepting operations
    #[default]
    Active,
    /// Run has been closed (read-only)
    Closed,
}

impl RunState {
    /// Check if the run is active
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Active)
    }

    /// Check if the run is closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, RunState::Closed)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Active => "active",
            RunState::Closed => "closed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// RunInfo
// =============================================================================

/// Run information and metadata
///
/// Contains all user-visible information about a run.
///
/// ## Fields
///
/// - `run_id`: The run identifier
/// - `created_at`: Creation timestamp (microseconds since Unix epoch)
/// - `metadata`: User-provided metadata (Value::Object or Value::Null)
/// - `state`: Current lifecycle state
///
/// ## Wire Encoding
///
/// ```json
/// {
///   "run_id": "f47ac10b-58cc-4372-a567-0e02b2c3d479",
///   "created_at": 1700000000000000,
///   "metadata": {"name": "experiment-1"},
///   "state": "active"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Run identifier
    pub run_id: ApiRunId,

    /// Creation timestamp (microseconds since Unix epoch)
    pub created_at: u64,

    /// User-provided metadata
    pub metadata: Value,

    /// Current lifecycle state
    pub state: RunState,
}

impl RunInfo {
    /// Create new run info with the given parameters
    pub fn new(run_id: ApiRunId, created_at: u64, metadata: Value) -> Self {
        RunInfo {
            run_id,
            created_at,
            metadata,
            state: RunState::Active,
        }
    }

    /// Create run info for the default run
    pub fn default_run(created_at: u64) -> Self {
        RunInfo {
            run_id: ApiRunId::default_run_id(),
            created_at,
            metadata: Value::Null,
            state: RunState::Active,
        }
    }

    /// Check if this is the default run
    #[inline]
    pub fn is_default(&self) -> bool {
        self.run_id.is_default()
    }

    /// Check if the run is active
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Check if the run is closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Mark the run as closed
    pub fn close(&mut self) {
        self.state = RunState::Closed;
    }
}

// =============================================================================
// RetentionPolicy
// =============================================================================

/// Retention policy for version history
///
/// Controls how long historical versions are retained before being eligible
/// for garbage collection.
///
/// ## Variants
///
/// - `KeepAll`: Keep all versions indefinitely (default)
/// - `KeepLast(n)`: Keep the N most recent versions
/// - `KeepFor(duration)`: Keep versions within a time window
/// - `Composite(policies)`: Union of multiple policies (most permissive wins)
///
/// ## Examples
///
/// ```
/// use strata_api::substrate::RetentionPolicy;
/// use std::time::Duration;
///
/// // Keep all history (default)
/// let policy = RetentionPolicy::KeepAll;
///
/// // Keep last 100 versions
/// let policy = RetentionPolicy::KeepLast(100);
///
/// // Keep 7 days of history
/// let policy = RetentionPolicy::KeepFor(Duration::from_secs(7 * 24 * 60 * 60));
///
/// // Keep either last 100 or 7 days, whichever is more permissive
/// let policy = RetentionPolicy::Composite(vec![
///     RetentionPolicy::KeepLast(100),
///     RetentionPolicy::KeepFor(Duration::from_secs(7 * 24 * 60 * 60)),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RetentionPolicy {
    /// Keep all versions indefinitely
    #[serde(rename = "keep_all")]
    #[default]
    KeepAll,

    /// Keep the N most recent versions
    #[serde(rename = "keep_last")]
    KeepLast(u64),

    /// Keep versions within a time window
    #[serde(rename = "keep_for")]
    KeepFor(#[serde(with = "duration_micros")] Duration),

    /// Union of multiple policies (most permissive wins)
    #[serde(rename = "composite")]
    Composite(Vec<RetentionPolicy>),
}

impl RetentionPolicy {
    /// Create a policy to keep the last N versions
    pub fn keep_last(n: u64) -> Self {
        RetentionPolicy::KeepLast(n)
    }

    /// Create a policy to keep versions for a duration
    pub fn keep_for(duration: Duration) -> Self {
        RetentionPolicy::KeepFor(duration)
    }

    /// Create a composite policy
    pub fn composite(policies: Vec<RetentionPolicy>) -> Self {
        RetentionPolicy::Composite(policies)
    }

    /// Check if this is the default "keep all" policy
    pub fn is_keep_all(&self) -> bool {
        matches!(self, RetentionPolicy::KeepAll)
    }

    /// Check if a version count should be retained under KeepLast policy
    ///
    /// Returns true if the version at position `index` (0 = newest) should be kept.
    pub fn should_keep_by_count(&self, index: u64) -> bool {
        match self {
            RetentionPolicy::KeepAll => true,
            RetentionPolicy::KeepLast(n) => index < *n,
            RetentionPolicy::KeepFor(_) => true, // Count-based check doesn't apply
            RetentionPolicy::Composite(policies) => {
                policies.iter().any(|p| p.should_keep_by_count(index))
            }
        }
    }

    /// Check if a version with the given age should be retained
    ///
    /// Returns true if a version with the given age (from now) should be kept.
    pub fn should_keep_by_age(&self, age: Duration) -> bool {
        match self {
            RetentionPolicy::KeepAll => true,
            RetentionPolicy::KeepLast(_) => true, // Age-based check doesn't apply
            RetentionPolicy::KeepFor(max_age) => age <= *max_age,
            RetentionPolicy::Composite(policies) => {
                policies.iter().any(|p| p.should_keep_by_age(age))
            }
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::KeepAll => write!(f, "keep_all"),
            RetentionPolicy::KeepLast(n) => write!(f, "keep_last({})", n),
            RetentionPolicy::KeepFor(d) => write!(f, "keep_for({}s)", d.as_secs()),
            RetentionPolicy::Composite(policies) => {
                write!(f, "composite[")?;
                for (i, p) in policies.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Serde module for Duration as microseconds
mod duration_micros {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros as u64))
    }
}

// =============================================================================
// Tests
// =============================================================================
