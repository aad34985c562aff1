//! # Error Types
//!
//! Domain-specific error types for shelfcode-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelfcode-core errors (this file)                                     │
//! │  ├── BarcodeError     - Issuance / validation / lookup outcomes        │
//! │  └── ValidationError  - Entity input validation failures               │
//! │                                                                         │
//! │  shelfcode-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps the two above          │
//! │                                                                         │
//! │  Flow: ValidationError / BarcodeError → DbError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, kind, scope)
//! 3. Errors are enum variants, never String
//! 4. Every barcode condition is recoverable and scoped to one request

use thiserror::Error;

use crate::code::BarcodeKind;

// =============================================================================
// Barcode Error
// =============================================================================

/// Outcomes of the barcode subsystem that callers are expected to handle.
///
/// None of these are fatal: each one affects only the request that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    /// Allocation was requested for a scope that does not resolve to a
    /// partition (unknown store/category, or an id that does not fit in
    /// two digits).
    #[error("Invalid scope {scope} for {kind} codes")]
    InvalidScope { kind: BarcodeKind, scope: i64 },

    /// Concurrent allocations kept colliding on the same partition.
    ///
    /// ## When This Occurs
    /// Only after the allocator exhausted its retry budget. The whole
    /// allocate-and-persist operation can be retried by the caller.
    #[error("Could not allocate a {kind} code in scope {scope:02} after {attempts} attempts")]
    AllocationConflict {
        kind: BarcodeKind,
        scope: u8,
        attempts: u32,
    },

    /// Input is not exactly 13 ASCII digits (or a payload is not 0-12 digits).
    #[error("Malformed barcode: '{0}'")]
    MalformedCode(String),

    /// Input is 13 digits but the trailing check digit is wrong.
    #[error("Checksum mismatch for {code}: expected {expected}, found {found}")]
    ChecksumMismatch { code: String, expected: u8, found: u8 },

    /// A syntactically valid code has no matching entity.
    #[error("No entity registered for barcode {0}")]
    NotFound(String),

    /// The 7-digit sequence space of a partition is used up.
    #[error("Sequence space exhausted for {kind} codes in scope {scope:02}")]
    PartitionExhausted { kind: BarcodeKind, scope: u8 },
}

impl BarcodeError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BarcodeError::AllocationConflict { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when entity input (title, price, IMEI) doesn't meet
/// requirements. Checked before any storage work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., IMEI with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with BarcodeError.
pub type BarcodeResult<T> = Result<T, BarcodeError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BarcodeError::ChecksumMismatch {
            code: "4006381333930".to_string(),
            expected: 1,
            found: 0,
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for 4006381333930: expected 1, found 0"
        );

        let err = BarcodeError::AllocationConflict {
            kind: BarcodeKind::Phone,
            scope: 7,
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "Could not allocate a phone code in scope 07 after 5 attempts"
        );
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        assert!(BarcodeError::AllocationConflict {
            kind: BarcodeKind::Product,
            scope: 0,
            attempts: 3,
        }
        .is_transient());
        assert!(!BarcodeError::NotFound("2000100000017".into()).is_transient());
        assert!(!BarcodeError::InvalidScope {
            kind: BarcodeKind::Phone,
            scope: 120,
        }
        .is_transient());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "title must be at most 200 characters");
    }
}
