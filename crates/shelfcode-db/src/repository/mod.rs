//! # Repository Module
//!
//! Database repositories for the entities that own shelf codes and the
//! entities that scope them.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Who owns which codes                                │
//! │                                                                         │
//! │  StoreRepository ────── scope of ──────► PhoneRepository   (200SS…)    │
//! │  CategoryRepository ─── scope of ──────► ProductRepository (300CC…)    │
//! │                                                                         │
//! │  Phone / Product create():                                              │
//! │    validate input → resolve scope → allocate + insert (one txn)        │
//! │                                                                         │
//! │  find_record_by_barcode(): exact match, joined for display             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StoreRepository`] - Stores (phone scopes)
//! - [`CategoryRepository`] - Categories (product scopes)
//! - [`PhoneRepository`] - Phones and their codes
//! - [`ProductRepository`] - Products, codes and per-store stock

pub mod category;
pub mod phone;
pub mod product;
pub mod store;

pub use category::CategoryRepository;
pub use phone::PhoneRepository;
pub use product::ProductRepository;
pub use store::StoreRepository;
