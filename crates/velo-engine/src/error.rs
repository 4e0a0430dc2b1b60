//! # Engine Error Type
//!
//! The single error type the presentation layer matches on. Business rule
//! violations come up as [`CoreError`], storage failures as [`StoreError`];
//! both keep their original messages via `transparent`.

use thiserror::Error;

use velo_core::error::CoreError;
use velo_store::StoreError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether this is a caller mistake (bad input, illegal transition)
    /// rather than an infrastructure failure.
    pub fn is_business_error(&self) -> bool {
        matches!(self, EngineError::Core(_))
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
