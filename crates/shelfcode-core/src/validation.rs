//! # Validation Module
//!
//! Code validation and entity input validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (Rust, no I/O)                                   │
//! │  ├── check_code: 13 digits? check digit right?                         │
//! │  └── entity input: title, price, IMEI                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (shelfcode-db)                                    │
//! │  └── scope exists? (store / category row)                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (length(barcode) = 13)                                      │
//! │  ├── UNIQUE barcode per entity table                                   │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelfcode_core::validation::{validate, validate_title};
//!
//! assert!(validate("4006381333931"));
//! assert!(!validate("4006381333930"));
//! assert!(validate_title("name", "Galaxy S24").is_ok());
//! ```

use crate::checksum::{checksum, PAYLOAD_LEN};
use crate::code::{CODE_LEN, MAX_SCOPE};
use crate::error::{BarcodeError, BarcodeResult, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a phone model or product name.
pub const MAX_TITLE_LEN: usize = 200;

/// Length of an IMEI.
pub const IMEI_LEN: usize = 15;

// =============================================================================
// Code Validators
// =============================================================================

/// Checks a code and reports why it is invalid.
///
/// ## Rules (in order)
/// 1. Exactly 13 ASCII digits, otherwise `MalformedCode`
/// 2. Last digit equals `checksum(first 12)`, otherwise `ChecksumMismatch`
///
/// The input is not trimmed; callers handling scanner input trim first.
pub fn check_code(code: &str) -> BarcodeResult<()> {
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcodeError::MalformedCode(code.to_string()));
    }

    let (payload, check) = code.split_at(PAYLOAD_LEN);
    let expected = checksum(payload)?;
    let found = check.as_bytes()[0] - b'0';

    if expected != found {
        return Err(BarcodeError::ChecksumMismatch {
            code: code.to_string(),
            expected,
            found,
        });
    }

    Ok(())
}

/// Binary form of [`check_code`]: no partial credit.
#[inline]
pub fn validate(code: &str) -> bool {
    check_code(code).is_ok()
}

/// Returns true if `raw` has the shape of a code (13 digits), ignoring the
/// check digit.
///
/// Used by lookup, which dispatches without re-validating the checksum.
pub fn is_well_formed(raw: &str) -> bool {
    raw.len() == CODE_LEN && raw.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Entity Input Validators
// =============================================================================

/// Validates a display title (phone model, product name).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_title(field: &str, title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use shelfcode_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a store or category id that will be used as a code scope.
///
/// ## Rules
/// - 1 to 99 inclusive (`00` is reserved for uncategorized products)
pub fn validate_scope_id(field: &str, id: i64) -> ValidationResult<()> {
    if !(1..=i64::from(MAX_SCOPE)).contains(&id) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(MAX_SCOPE),
        });
    }

    Ok(())
}

/// Validates an IMEI: 15 ASCII digits.
pub fn validate_imei(imei: &str) -> ValidationResult<()> {
    if imei.len() != IMEI_LEN || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "imei".to_string(),
            reason: format!("must be exactly {} digits", IMEI_LEN),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_code_order_of_rules() {
        assert_eq!(check_code("4006381333931"), Ok(()));
        assert!(matches!(
            check_code("40063813339"),
            Err(BarcodeError::MalformedCode(_))
        ));
        // Non-digit wins over a wrong check digit.
        assert!(matches!(
            check_code("40063813339X0"),
            Err(BarcodeError::MalformedCode(_))
        ));
        assert_eq!(
            check_code("4006381333932"),
            Err(BarcodeError::ChecksumMismatch {
                code: "4006381333932".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_codes() {
        for input in [
            "",
            "1",
            "400638133393",
            "40063813339311",
            "400638133393a",
            "4006381333 31",
            "４００６３８１３３３９３１", // full-width digits
            "-006381333931",
        ] {
            assert!(!validate(input), "{input:?} should be invalid");
        }
    }

    #[test]
    fn test_is_well_formed_ignores_check_digit() {
        assert!(is_well_formed("9999999999999"));
        assert!(!validate("9999999999999"));
        assert!(!is_well_formed("999999999999"));
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("name", "Galaxy S24").is_ok());
        assert!(validate_title("name", "   ").is_err());
        assert!(validate_title("name", &"A".repeat(201)).is_err());
        assert!(validate_title("name", &"A".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_scope_id() {
        assert!(validate_scope_id("store_id", 1).is_ok());
        assert!(validate_scope_id("store_id", 99).is_ok());
        assert!(validate_scope_id("store_id", 0).is_err());
        assert_eq!(
            validate_scope_id("category_id", 100),
            Err(ValidationError::OutOfRange {
                field: "category_id".to_string(),
                min: 1,
                max: 99,
            })
        );
    }

    #[test]
    fn test_validate_imei() {
        assert!(validate_imei("490154203237518").is_ok());
        assert!(validate_imei("49015420323751").is_err());
        assert!(validate_imei("49015420323751X").is_err());
    }
}
