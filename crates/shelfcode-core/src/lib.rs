//! # shelfcode-core: Pure Barcode Logic for Shelfcode
//!
//! Everything about shelf codes that does not touch storage: the check
//! digit, the code layout, validation, the bar drawing and the label.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shelfcode Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (seed / label binaries, POS UI)            │   │
//! │  │      allocate(kind, scope) ──► resolve(raw) ──► label_for()     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shelfcode-db (Storage Layer)                    │   │
//! │  │     sequence allocator, lookup dispatcher, repositories         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shelfcode-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────────────┐ │   │
//! │  │   │ checksum │ │   code   │ │validation │ │  render / label  │ │   │
//! │  │   │  digit   │ │ kind,    │ │ check_code│ │  bars, SVG       │ │   │
//! │  │   │  math    │ │ scope    │ │ titles    │ │                  │ │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checksum`] - Check digit over a 12-digit payload
//! - [`code`] - `BarcodeCode`, `BarcodeKind`, `Scope`
//! - [`validation`] - Code validator and entity input rules
//! - [`render`] - Bar pattern drawing and SVG output
//! - [`label`] - Printable label document
//! - [`types`] - Stores, categories, phones, products, lookup records
//! - [`money`] - Integer-cent prices
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shelfcode_core::{validate, BarcodeCode, BarcodeKind, Scope};
//!
//! let scope = Scope::new(BarcodeKind::Product, 3).unwrap();
//! let code = BarcodeCode::assemble(BarcodeKind::Product, scope, 1).unwrap();
//!
//! assert_eq!(code.as_str(), "3000300000011");
//! assert!(validate(code.as_str()));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checksum;
pub mod code;
pub mod error;
pub mod label;
pub mod money;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checksum::checksum;
pub use code::{BarcodeCode, BarcodeKind, Scope};
pub use error::{BarcodeError, BarcodeResult, ValidationError};
pub use label::{render_label, Label};
pub use money::Money;
pub use render::{render, BarcodeDrawing, LabelGeometry, SCANNER_COMPATIBLE};
pub use types::*;
pub use validation::{check_code, validate};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Title used when an allocation request does not name the entity.
pub const DEFAULT_TITLE: &str = "Untitled";
