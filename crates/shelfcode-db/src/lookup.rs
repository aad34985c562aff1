//! # Lookup Dispatcher
//!
//! Turns a scanned string into the entity that owns it.
//!
//! ```text
//!   raw scan ──trim──► 13 digits? ──no──► MalformedCode
//!                          │
//!                         yes
//!                          ▼
//!                  prefix → BarcodeKind ──unknown──► None
//!                          │
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//!      Phone: phones ⋈ stores     Product: products ⟕ categories + stock
//!            │                           │
//!            └──────────► Option<LookupHit>
//! ```
//!
//! The check digit is not re-validated here; the stored code is the
//! authority. Callers wanting the full check go through
//! [`BarcodeService::resolve`](crate::service::BarcodeService::resolve).

use shelfcode_core::validation::is_well_formed;
use shelfcode_core::{BarcodeError, BarcodeKind, LookupHit};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{PhoneRepository, ProductRepository};

/// Read-only dispatcher over the code-owning repositories.
#[derive(Debug, Clone)]
pub struct BarcodeLookup {
    phones: PhoneRepository,
    products: ProductRepository,
}

impl BarcodeLookup {
    pub fn new(phones: PhoneRepository, products: ProductRepository) -> Self {
        BarcodeLookup { phones, products }
    }

    /// Finds the entity owning `raw`.
    ///
    /// ## Returns
    /// * `Ok(Some(hit))` - A phone or product carries this exact code
    /// * `Ok(None)` - Unknown prefix, or no row with this code
    /// * `Err(DbError::Barcode(MalformedCode))` - Not 13 digits after trimming
    pub async fn lookup(&self, raw: &str) -> DbResult<Option<LookupHit>> {
        let code = raw.trim();
        if !is_well_formed(code) {
            return Err(BarcodeError::MalformedCode(code.to_string()).into());
        }

        let Some(kind) = BarcodeKind::from_prefix(&code[..3]) else {
            debug!(code = %code, "Unregistered prefix");
            return Ok(None);
        };

        let hit = match kind {
            BarcodeKind::Phone => self
                .phones
                .find_record_by_barcode(code)
                .await?
                .map(LookupHit::Phone),
            BarcodeKind::Product => self
                .products
                .find_record_by_barcode(code)
                .await?
                .map(LookupHit::Product),
        };

        debug!(code = %code, %kind, found = hit.is_some(), "Lookup");
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use shelfcode_core::{validate, NewPhone, NewProduct};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.stores().create(7, "Downtown", None).await.unwrap();
        db.categories().create(3, "Accessories", None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_product_round_trip() {
        let db = setup().await;
        let product = db
            .products()
            .create(&NewProduct {
                category_id: Some(3),
                name: "USB-C Cable".into(),
                price_cents: Some(1299),
            })
            .await
            .unwrap();

        let hit = db.lookup().lookup(&product.barcode).await.unwrap().unwrap();
        assert_eq!(hit.kind(), BarcodeKind::Product);
        assert_eq!(hit.entity_id(), product.id);
        match hit {
            LookupHit::Product(record) => {
                assert_eq!(record.category_name.as_deref(), Some("Accessories"))
            }
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_phone_scan_with_trailing_newline() {
        let db = setup().await;
        let phone = db
            .phones()
            .create(&NewPhone {
                store_id: 7,
                model: "Pixel 8".into(),
                imei: None,
                price_cents: None,
            })
            .await
            .unwrap();

        let scanned = format!("{}\r\n", phone.barcode);
        let hit = db.lookup().lookup(&scanned).await.unwrap().unwrap();
        assert_eq!(hit.kind(), BarcodeKind::Phone);
        assert_eq!(hit.title(), "Pixel 8");
    }

    #[tokio::test]
    async fn test_unregistered_prefix_is_not_found() {
        let db = setup().await;

        // Bad check digit as well; lookup does not care.
        assert!(!validate("9999999999999"));
        assert_eq!(db.lookup().lookup("9999999999999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unissued_code_is_not_found() {
        let db = setup().await;

        assert_eq!(db.lookup().lookup("3000300000011").await.unwrap(), None);
        // Wrong check digit on a known prefix: dispatched, simply absent.
        assert_eq!(db.lookup().lookup("3000300000012").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_input_is_an_error() {
        let db = setup().await;

        for raw in ["", "12345", "300030000001x", "30003000000111"] {
            assert!(
                matches!(
                    db.lookup().lookup(raw).await,
                    Err(DbError::Barcode(BarcodeError::MalformedCode(_)))
                ),
                "input {raw:?}"
            );
        }
    }
}
