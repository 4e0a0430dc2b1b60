//! # Record-Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure / malformed document                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← adds entity and id context                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (velo-engine) ← caller decides: retry or surface           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are always surfaced as a distinct kind, never silently
//! swallowed and never collapsed into the business-rule errors of
//! velo-core.

use thiserror::Error;

/// Record-store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found where one was required.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A stored document failed to decode into its domain type.
    ///
    /// ## When This Occurs
    /// - Another client wrote an incompatible document shape
    /// - A partial write corrupted a record
    #[error("Failed to decode record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend itself failed (connectivity, contention exhaustion).
    #[error("Record store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for record-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Voucher", "v-123");
        assert_eq!(err.to_string(), "Voucher not found: v-123");
    }

    #[test]
    fn test_serialization_wraps_serde() {
        let bad: Result<i64, _> = serde_json::from_str("not json");
        let err: StoreError = bad.unwrap_err().into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
