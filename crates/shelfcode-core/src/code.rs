//! # Barcode Code
//!
//! The 13-digit identifier issued to phones and products.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BarcodeCode (13 ASCII digits)                       │
//! │                                                                         │
//! │   2 0 0 │ 0 7 │ 0 0 0 0 0 0 1 │ 8                                       │
//! │   ─────   ───   ─────────────   ─                                       │
//! │   kind    scope    sequence       check digit                           │
//! │   prefix  (store   (7 digits,     (checksum of                          │
//! │   200 =   or       per kind +     the first 12)                         │
//! │   phone   category) scope)                                              │
//! │   300 =                                                                 │
//! │   product                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `BarcodeCode` value can only come from [`BarcodeCode::assemble`]
//! (issuing a new code) or [`BarcodeCode::parse`] (accepting an external
//! one), so every value in the program carries a correct check digit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::checksum::{checksum, PAYLOAD_LEN};
use crate::error::{BarcodeError, BarcodeResult, ValidationError};

/// Total length of a code, check digit included.
pub const CODE_LEN: usize = PAYLOAD_LEN + 1;

/// Width of the kind prefix.
pub const PREFIX_LEN: usize = 3;

/// Width of the scope field.
pub const SCOPE_LEN: usize = 2;

/// Offset of the sequence field (0-based).
pub const SEQUENCE_START: usize = PREFIX_LEN + SCOPE_LEN;

/// Width of the sequence field: whatever the payload leaves after prefix
/// and scope.
pub const SEQUENCE_LEN: usize = PAYLOAD_LEN - SEQUENCE_START;

/// Largest sequence value that fits in the 7-digit field.
pub const MAX_SEQUENCE: u32 = 9_999_999;

/// Largest scope id that fits in the 2-digit field.
pub const MAX_SCOPE: u8 = 99;

// =============================================================================
// Barcode Kind
// =============================================================================

/// The entity kind a code belongs to, selected by its 3-digit prefix.
///
/// The prefixes are protocol constants. Reusing one for another kind
/// requires a protocol version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeKind {
    /// Phones, scoped by the store that holds them.
    Phone,
    /// General products, scoped by category.
    Product,
}

impl BarcodeKind {
    /// All kinds, in prefix order.
    pub const ALL: [BarcodeKind; 2] = [BarcodeKind::Phone, BarcodeKind::Product];

    /// The 3-digit prefix for this kind.
    #[inline]
    pub const fn prefix(&self) -> &'static str {
        match self {
            BarcodeKind::Phone => "200",
            BarcodeKind::Product => "300",
        }
    }

    /// Resolves a 3-digit prefix to its kind, if registered.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }
}

impl fmt::Display for BarcodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarcodeKind::Phone => write!(f, "phone"),
            BarcodeKind::Product => write!(f, "product"),
        }
    }
}

impl FromStr for BarcodeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phone" | "phones" => Ok(BarcodeKind::Phone),
            "product" | "products" => Ok(BarcodeKind::Product),
            other => Err(ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("unknown kind '{}', expected phone or product", other),
            }),
        }
    }
}

// =============================================================================
// Scope
// =============================================================================

/// The 2-digit partition within a kind (store id or category id).
///
/// `Scope(0)` is the "no category" partition for products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Scope(u8);

impl Scope {
    /// Partition used by products without a category.
    pub const UNSCOPED: Scope = Scope(0);

    /// Builds a scope from a raw store/category id.
    ///
    /// ## Errors
    /// `InvalidScope` when the id does not fit in two digits.
    pub fn new(kind: BarcodeKind, id: i64) -> BarcodeResult<Self> {
        match u8::try_from(id) {
            Ok(value) if value <= MAX_SCOPE => Ok(Scope(value)),
            _ => Err(BarcodeError::InvalidScope { kind, scope: id }),
        }
    }

    /// Returns the raw scope value.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the zero-padded 2-digit form used inside codes.
    pub fn code(&self) -> String {
        format!("{:02}", self.0)
    }
}

impl TryFrom<i64> for Scope {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_SCOPE => Ok(Scope(v)),
            _ => Err(ValidationError::OutOfRange {
                field: "scope".to_string(),
                min: 0,
                max: i64::from(MAX_SCOPE),
            }),
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

// =============================================================================
// Barcode Code
// =============================================================================

/// A validated 13-digit code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarcodeCode(String);

impl BarcodeCode {
    /// Builds a new code from its parts and appends the check digit.
    ///
    /// ## Errors
    /// `PartitionExhausted` if `sequence` is 0 or does not fit in 7 digits.
    ///
    /// ## Example
    /// ```rust
    /// use shelfcode_core::code::{BarcodeCode, BarcodeKind, Scope};
    ///
    /// let scope = Scope::new(BarcodeKind::Phone, 7).unwrap();
    /// let code = BarcodeCode::assemble(BarcodeKind::Phone, scope, 1).unwrap();
    /// assert_eq!(code.as_str(), "2000700000018");
    /// ```
    pub fn assemble(kind: BarcodeKind, scope: Scope, sequence: u32) -> BarcodeResult<Self> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(BarcodeError::PartitionExhausted {
                kind,
                scope: scope.value(),
            });
        }

        let payload = format!(
            "{}{}{:0width$}",
            kind.prefix(),
            scope.code(),
            sequence,
            width = SEQUENCE_LEN
        );
        let check = checksum(&payload)?;
        Ok(BarcodeCode(format!("{}{}", payload, check)))
    }

    /// Accepts an external code after full validation.
    ///
    /// Surrounding whitespace (scanner line endings) is ignored.
    ///
    /// ## Errors
    /// - `MalformedCode` unless the input is exactly 13 ASCII digits
    /// - `ChecksumMismatch` if the last digit is wrong
    pub fn parse(raw: &str) -> BarcodeResult<Self> {
        let code = raw.trim();
        crate::validation::check_code(code)?;
        Ok(BarcodeCode(code.to_string()))
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 3-digit kind prefix.
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    /// Returns the kind selected by the prefix, or `None` for foreign codes.
    pub fn kind(&self) -> Option<BarcodeKind> {
        BarcodeKind::from_prefix(self.prefix())
    }

    /// Returns the 2-digit scope field.
    pub fn scope_code(&self) -> &str {
        &self.0[PREFIX_LEN..SEQUENCE_START]
    }

    /// Returns the 7-digit sequence field as a number.
    pub fn sequence(&self) -> u32 {
        // Digits only, guaranteed by construction.
        self.0[SEQUENCE_START..PAYLOAD_LEN].parse().unwrap_or(0)
    }

    /// Returns the check digit.
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[PAYLOAD_LEN] - b'0'
    }

    /// Consumes the code, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BarcodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BarcodeCode {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BarcodeCode::parse(s)
    }
}

impl TryFrom<String> for BarcodeCode {
    type Error = BarcodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BarcodeCode::parse(&value)
    }
}

impl From<BarcodeCode> for String {
    fn from(code: BarcodeCode) -> Self {
        code.0
    }
}

impl AsRef<str> for BarcodeCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
