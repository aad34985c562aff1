//! # shelfcode-db: Storage Layer for Shelfcode
//!
//! Issues shelf codes, stores them on the entities that own them, and
//! resolves scanned codes back to those entities. SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelfcode Data Flow                              │
//! │                                                                         │
//! │  seed / label binaries, POS front end                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shelfcode-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   BarcodeService ── allocate / resolve / label_for              │   │
//! │  │        │                    │                                   │   │
//! │  │        ▼                    ▼                                   │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │ Repositories │   │BarcodeLookup │   │   Migrations     │   │   │
//! │  │   │ phone/product│   │ prefix →     │   │   (embedded)     │   │   │
//! │  │   │ store/categ. │   │ repository   │   │ 001_initial      │   │   │
//! │  │   └──────┬───────┘   └──────────────┘   │ 002_sequences    │   │   │
//! │  │          │                               └──────────────────┘   │   │
//! │  │          ▼                                                      │   │
//! │  │   allocator::next_code ── barcode_sequences upsert, retries    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys, busy timeout)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`allocator`] - Partition counters and the retry loop
//! - [`repository`] - Stores, categories, phones, products
//! - [`lookup`] - Scanned code → owning entity
//! - [`service`] - Request-level facade
//! - [`config`] - Layered TOML/env configuration
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfcode_db::{AllocationRequest, Database, ShelfcodeConfig};
//!
//! let config = ShelfcodeConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let issued = db.barcodes().allocate(AllocationRequest::product(3, "USB-C Cable")).await?;
//! let hit = db.barcodes().resolve(issued.code.as_str()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod config;
pub mod error;
pub mod lookup;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocator::{last_sequence, next_code, RetryPolicy};
pub use config::{ConfigError, ConfigResult, ShelfcodeConfig};
pub use error::{DbError, DbResult};
pub use lookup::BarcodeLookup;
pub use pool::{Database, DbConfig};
pub use service::{AllocationRequest, BarcodeService, IssuedCode};

// Repository re-exports for convenience
pub use repository::{CategoryRepository, PhoneRepository, ProductRepository, StoreRepository};
