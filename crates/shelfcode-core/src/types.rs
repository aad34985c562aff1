//! # Domain Types
//!
//! Entity records that own barcodes, plus the records returned by lookup.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Store       │   │    Category     │   ← scopes (2-digit ids)    │
//! │  │  id (1..=99)    │   │  id (1..=99)    │                             │
//! │  └────────┬────────┘   └────────┬────────┘                             │
//! │           │                     │                                       │
//! │  ┌────────▼────────┐   ┌────────▼────────┐                             │
//! │  │     Phone       │   │    Product      │   ← code owners             │
//! │  │  id (UUID)      │   │  id (UUID)      │                             │
//! │  │  barcode 200…   │   │  barcode 300…   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  LookupHit = Phone(PhoneRecord) | Product(ProductRecord)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every code owner has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `barcode`: the 13-digit business identifier, immutable once issued

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::code::BarcodeKind;
use crate::money::Money;

// =============================================================================
// Scopes
// =============================================================================

/// A physical store. Its id is the scope of phone codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product category. Its id is the scope of product codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Code Owners
// =============================================================================

/// A phone held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Phone {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store holding the phone (scope of its barcode).
    pub store_id: i64,

    /// Model name, printed on the label.
    pub model: String,

    /// IMEI, when known.
    pub imei: Option<String>,

    /// Price in cents.
    pub price_cents: Option<i64>,

    /// Issued 13-digit code (prefix 200).
    pub barcode: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Phone {
    /// Returns the price as Money, if set.
    #[inline]
    pub fn price(&self) -> Option<Money> {
        self.price_cents.map(Money::from_cents)
    }
}

/// A general catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category (scope of its barcode). `None` issues into scope `00`.
    pub category_id: Option<i64>,

    /// Display name, printed on the label.
    pub name: String,

    /// Price in cents.
    pub price_cents: Option<i64>,

    /// Issued 13-digit code (prefix 300).
    pub barcode: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money, if set.
    #[inline]
    pub fn price(&self) -> Option<Money> {
        self.price_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Creation Inputs
// =============================================================================

/// Input for creating a phone (its barcode is allocated on insert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPhone {
    pub store_id: i64,
    pub model: String,
    pub imei: Option<String>,
    pub price_cents: Option<i64>,
}

/// Input for creating a product (its barcode is allocated on insert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: Option<i64>,
    pub name: String,
    pub price_cents: Option<i64>,
}

// =============================================================================
// Lookup Records
// =============================================================================

/// A phone with its owning store's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PhoneRecord {
    pub phone: Phone,
    pub store_name: String,
}

/// A product with its category name and stock summed over all stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRecord {
    pub product: Product,
    pub category_name: Option<String>,
    pub total_stock: i64,
}

/// The entity a scanned code resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum LookupHit {
    Phone(PhoneRecord),
    Product(ProductRecord),
}

impl LookupHit {
    /// The kind tag of the hit.
    pub fn kind(&self) -> BarcodeKind {
        match self {
            LookupHit::Phone(_) => BarcodeKind::Phone,
            LookupHit::Product(_) => BarcodeKind::Product,
        }
    }

    /// The owning entity's id.
    pub fn entity_id(&self) -> &str {
        match self {
            LookupHit::Phone(record) => &record.phone.id,
            LookupHit::Product(record) => &record.product.id,
        }
    }

    /// The stored barcode.
    pub fn barcode(&self) -> &str {
        match self {
            LookupHit::Phone(record) => &record.phone.barcode,
            LookupHit::Product(record) => &record.product.barcode,
        }
    }

    /// Title printed on the entity's label.
    pub fn title(&self) -> &str {
        match self {
            LookupHit::Phone(record) => &record.phone.model,
            LookupHit::Product(record) => &record.product.name,
        }
    }

    /// Price printed on the entity's label.
    pub fn price(&self) -> Option<Money> {
        match self {
            LookupHit::Phone(record) => record.phone.price(),
            LookupHit::Product(record) => record.product.price(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
