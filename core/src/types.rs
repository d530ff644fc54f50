//! Shared primitive types used across the entire core.

/// Stable UUID-v4 identifier for a dispute record.
pub type DisputeId = String;

/// Stable UUID-v4 identifier for a violation record.
pub type ViolationId = String;

/// Stable UUID-v4 identifier for a canonicalized reporting entity.
pub type EntityId = String;

/// Stable UUID-v4 identifier for a dispute response.
pub type ResponseId = String;

/// Stable UUID-v4 identifier for a reinsertion watch.
pub type WatchId = String;

/// Stable identifier for "the same underlying account" across
/// bureaus and reports. Produced by the report-parsing collaborator.
pub type Fingerprint = String;
