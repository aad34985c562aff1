//! # Barcode Service
//!
//! Request-level entry points: issue a code for a new entity, resolve a
//! scanned code, print a label.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocate(AllocationRequest)                                            │
//! │     kind = phone   → PhoneRepository::create   (scope = store id)      │
//! │     kind = product → ProductRepository::create (scope = category id,   │
//! │                                                  0 = uncategorized)    │
//! │     → IssuedCode { kind, code, entity_id }                             │
//! │                                                                         │
//! │  resolve(raw)                                                           │
//! │     BarcodeCode::parse (malformed / checksum) → BarcodeLookup::lookup  │
//! │     → LookupHit, or BarcodeError::NotFound                             │
//! │                                                                         │
//! │  label_for(raw, geometry)                                               │
//! │     resolve → Label { code, title, price } → render_label → SVG        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use shelfcode_core::{
    render_label, BarcodeCode, BarcodeError, BarcodeKind, Label, LabelGeometry, LookupHit,
    NewPhone, NewProduct, ValidationError, DEFAULT_TITLE,
};
use tracing::info;

use crate::error::DbResult;
use crate::lookup::BarcodeLookup;
use crate::repository::{PhoneRepository, ProductRepository};

// =============================================================================
// Request / Response
// =============================================================================

/// A request to create an entity and issue its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub kind: BarcodeKind,

    /// Store id for phones, category id for products (0 = none).
    pub scope: i64,

    /// Phone model or product name; `"Untitled"` when absent.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub price_cents: Option<i64>,
}

impl AllocationRequest {
    /// A phone in `store_id`.
    pub fn phone(store_id: i64, model: impl Into<String>) -> Self {
        AllocationRequest {
            kind: BarcodeKind::Phone,
            scope: store_id,
            title: Some(model.into()),
            price_cents: None,
        }
    }

    /// A product in `category_id` (0 for uncategorized).
    pub fn product(category_id: i64, name: impl Into<String>) -> Self {
        AllocationRequest {
            kind: BarcodeKind::Product,
            scope: category_id,
            title: Some(name.into()),
            price_cents: None,
        }
    }

    pub fn with_price(mut self, cents: i64) -> Self {
        self.price_cents = Some(cents);
        self
    }

    fn title_or_default(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }
}

/// A code issued together with the entity that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
    pub kind: BarcodeKind,
    pub code: BarcodeCode,
    pub entity_id: String,
}

// =============================================================================
// Service
// =============================================================================

/// Facade over allocation, lookup and label rendering.
#[derive(Debug, Clone)]
pub struct BarcodeService {
    phones: PhoneRepository,
    products: ProductRepository,
    lookup: BarcodeLookup,
}

impl BarcodeService {
    pub fn new(phones: PhoneRepository, products: ProductRepository, lookup: BarcodeLookup) -> Self {
        BarcodeService {
            phones,
            products,
            lookup,
        }
    }

    /// Creates the requested entity and returns its new code.
    ///
    /// ## Returns
    /// * `Ok(IssuedCode)` - Entity persisted with the code
    /// * `Err(DbError::Barcode(InvalidScope))` - Unknown store/category
    /// * `Err(DbError::Barcode(AllocationConflict))` - Persistent contention
    /// * `Err(DbError::Validation(_))` - Bad title or price
    pub async fn allocate(&self, request: AllocationRequest) -> DbResult<IssuedCode> {
        let title = request.title_or_default().to_string();

        let (entity_id, barcode) = match request.kind {
            BarcodeKind::Phone => {
                let phone = self
                    .phones
                    .create(&NewPhone {
                        store_id: request.scope,
                        model: title,
                        imei: None,
                        price_cents: request.price_cents,
                    })
                    .await?;
                (phone.id, phone.barcode)
            }
            BarcodeKind::Product => {
                let product = self
                    .products
                    .create(&NewProduct {
                        category_id: (request.scope != 0).then_some(request.scope),
                        name: title,
                        price_cents: request.price_cents,
                    })
                    .await?;
                (product.id, product.barcode)
            }
        };

        let code = BarcodeCode::parse(&barcode)?;
        info!(kind = %request.kind, scope = request.scope, code = %code, "Issued code");

        Ok(IssuedCode {
            kind: request.kind,
            code,
            entity_id,
        })
    }

    /// Fully validates `raw`, then finds its owner.
    ///
    /// Unlike [`BarcodeLookup::lookup`], a wrong check digit is an error and
    /// an unknown code is `BarcodeError::NotFound` rather than `None`.
    pub async fn resolve(&self, raw: &str) -> DbResult<LookupHit> {
        let code = BarcodeCode::parse(raw)?;

        match self.lookup.lookup(code.as_str()).await? {
            Some(hit) => Ok(hit),
            None => Err(BarcodeError::NotFound(code.into_string()).into()),
        }
    }

    /// Resolves `raw` and renders the owner's label as SVG.
    pub async fn label_for(&self, raw: &str, geometry: &LabelGeometry) -> DbResult<String> {
        if let Some(field) = geometry.first_invalid_field() {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a positive length".to_string(),
            }
            .into());
        }

        let hit = self.resolve(raw).await?;
        let code = BarcodeCode::parse(hit.barcode())?;
        let label = Label::new(code, hit.title(), hit.price());

        Ok(render_label(&label, geometry))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
