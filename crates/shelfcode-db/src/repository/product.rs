//! # Product Repository
//!
//! Products own `300` codes scoped by category (`00` when uncategorized),
//! and carry per-store stock rows that lookup sums up.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: Absolute update (lost updates between registers)         │
//! │     UPDATE product_stock SET quantity = 7 WHERE ...                 │
//! │                                                                     │
//! │  ✅ CORRECT: Delta upsert                                           │
//! │     INSERT ... ON CONFLICT DO UPDATE SET quantity = quantity + ?    │
//! │                                                                     │
//! │  Register A: sells 3 → -3      Register B: sells 2 → -2             │
//! │  Both apply without conflict: -3 + -2 = -5 total                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use shelfcode_core::validation::{validate_price_cents, validate_title};
use shelfcode_core::{
    BarcodeError, BarcodeKind, NewProduct, Product, ProductRecord, Scope, DEFAULT_TITLE,
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::allocator::{next_code, with_retry, RetryPolicy};
use crate::error::{DbError, DbResult};
use crate::repository::category::CategoryRepository;

const PRODUCT_COLUMNS: &str = "id, category_id, name, price_cents, barcode, created_at, updated_at";

/// Lookup row: product columns plus category name and summed stock.
#[derive(Debug, sqlx::FromRow)]
struct ProductRecordRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
    total_stock: i64,
}

impl From<ProductRecordRow> for ProductRecord {
    fn from(row: ProductRecordRow) -> Self {
        ProductRecord {
            product: row.product,
            category_name: row.category_name,
            total_stock: row.total_stock,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        ProductRepository { pool, retry }
    }

    /// Creates a product and issues its barcode.
    ///
    /// `category_id` of `None` or `Some(0)` files the product under scope
    /// `00` with no category row. A blank name falls back to `"Untitled"`.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product carrying its new barcode
    /// * `Err(DbError::Barcode(InvalidScope))` - Category missing or not 1-99
    /// * `Err(DbError::Barcode(AllocationConflict))` - Contention outlasted
    ///   the retry policy
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let name = match input.name.trim() {
            "" => DEFAULT_TITLE,
            name => name,
        };
        validate_title("name", name)?;
        if let Some(cents) = input.price_cents {
            validate_price_cents(cents)?;
        }

        let category_id = input.category_id.filter(|id| *id != 0);
        let scope = self.resolve_scope(category_id).await?;

        let product = with_retry(&self.retry, BarcodeKind::Product, scope, move || {
            self.insert_with_code(name, category_id, input.price_cents, scope)
        })
        .await?;

        info!(id = %product.id, barcode = %product.barcode, ?category_id, "Product created");
        Ok(product)
    }

    /// Maps a category id onto its scope, checking the category exists.
    async fn resolve_scope(&self, category_id: Option<i64>) -> DbResult<Scope> {
        let Some(id) = category_id else {
            return Ok(Scope::UNSCOPED);
        };

        let scope = Scope::new(BarcodeKind::Product, id)?;

        if !CategoryRepository::new(self.pool.clone()).exists(id).await? {
            debug!(category_id = id, "Rejecting product for unknown category");
            return Err(BarcodeError::InvalidScope {
                kind: BarcodeKind::Product,
                scope: id,
            }
            .into());
        }

        Ok(scope)
    }

    /// One allocation attempt: counter bump + insert, committed together.
    async fn insert_with_code(
        &self,
        name: &str,
        category_id: Option<i64>,
        price_cents: Option<i64>,
        scope: Scope,
    ) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let code = next_code(&mut *tx, BarcodeKind::Product, scope).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            category_id,
            name: name.to_string(),
            price_cents,
            barcode: code.into_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, price_cents, barcode, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.barcode)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => BarcodeError::InvalidScope {
                kind: BarcodeKind::Product,
                scope: category_id.unwrap_or(0),
            }
            .into(),
            other => other,
        })?;

        tx.commit().await?;
        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets the lookup record (product + category name + total stock) for an
    /// exact barcode.
    pub async fn find_record_by_barcode(&self, barcode: &str) -> DbResult<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRecordRow>(
            r#"
            SELECT
                p.id, p.category_id, p.name, p.price_cents, p.barcode,
                p.created_at, p.updated_at,
                c.name AS category_name,
                COALESCE(
                    (SELECT SUM(ps.quantity) FROM product_stock ps WHERE ps.product_id = p.id),
                    0
                ) AS total_stock
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductRecord::from))
    }

    /// Applies a stock delta for one store.
    ///
    /// ## Arguments
    /// * `product_id` - Product ID
    /// * `store_id` - Store holding the stock
    /// * `delta` - Change in stock (negative for sales, positive for restocking)
    ///
    /// ## Returns
    /// * `Ok(i64)` - New quantity at that store
    pub async fn update_stock(&self, product_id: &str, store_id: i64, delta: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, store_id, delta, "Updating stock");

        let quantity: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO product_stock (product_id, store_id, quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (product_id, store_id) DO UPDATE SET
                quantity = product_stock.quantity + excluded.quantity,
                updated_at = excluded.updated_at
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(store_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => {
                DbError::not_found("Product or store", format!("{product_id}@{store_id}"))
            }
            other => other,
        })?;

        Ok(quantity)
    }

    /// Sums a product's stock over every store.
    pub async fn total_stock(&self, product_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM product_stock WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use shelfcode_core::BarcodeCode;

    fn new_product(category_id: Option<i64>, name: &str) -> NewProduct {
        NewProduct {
            category_id,
            name: name.to_string(),
            price_cents: Some(1299),
        }
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories().create(3, "Accessories", None).await.unwrap();
        db.stores().create(1, "Downtown", None).await.unwrap();
        db.stores().create(2, "Uptown", None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_first_product_in_category() {
        let db = setup().await;
        let product = db
            .products()
            .create(&new_product(Some(3), "USB-C Cable"))
            .await
            .unwrap();

        assert_eq!(product.barcode, "3000300000011");
        assert_eq!(product.category_id, Some(3));
    }

    #[tokio::test]
    async fn test_uncategorized_products_use_scope_zero() {
        let db = setup().await;
        let products = db.products();

        let a = products.create(&new_product(None, "Gift Card")).await.unwrap();
        let b = products.create(&new_product(Some(0), "")).await.unwrap();

        assert_eq!(a.barcode, "3000000000014");
        assert_eq!(b.category_id, None);
        assert_eq!(b.name, DEFAULT_TITLE);
        assert_eq!(BarcodeCode::parse(&b.barcode).unwrap().sequence(), 2);
    }

    #[tokio::test]
    async fn test_unknown_category_is_invalid_scope() {
        let db = setup().await;

        let err = db
            .products()
            .create(&new_product(Some(9), "Case"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Barcode(BarcodeError::InvalidScope { scope: 9, .. })
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_rows_seed_the_counter() {
        let db = setup().await;

        // A row inserted outside the allocator (e.g. imported data).
        let imported = BarcodeCode::assemble(
            BarcodeKind::Product,
            Scope::new(BarcodeKind::Product, 3).unwrap(),
            41,
        )
        .unwrap();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO products (id, category_id, name, price_cents, barcode, created_at, updated_at) \
             VALUES ('imported-1', 3, 'Legacy Cable', NULL, ?1, ?2, ?2)",
        )
        .bind(imported.as_str())
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        let product = db
            .products()
            .create(&new_product(Some(3), "New Cable"))
            .await
            .unwrap();
        assert_eq!(BarcodeCode::parse(&product.barcode).unwrap().sequence(), 42);
    }

    #[tokio::test]
    async fn test_stock_is_summed_across_stores() {
        let db = setup().await;
        let products = db.products();
        let product = products.create(&new_product(Some(3), "USB-C Cable")).await.unwrap();

        assert_eq!(products.update_stock(&product.id, 1, 10).await.unwrap(), 10);
        assert_eq!(products.update_stock(&product.id, 1, -3).await.unwrap(), 7);
        assert_eq!(products.update_stock(&product.id, 2, 5).await.unwrap(), 5);
        assert_eq!(products.total_stock(&product.id).await.unwrap(), 12);

        let record = products
            .find_record_by_barcode(&product.barcode)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.total_stock, 12);
        assert_eq!(record.category_name.as_deref(), Some("Accessories"));
    }

    #[tokio::test]
    async fn test_record_without_category_or_stock() {
        let db = setup().await;
        let product = db
            .products()
            .create(&new_product(None, "Gift Card"))
            .await
            .unwrap();

        let record = db
            .products()
            .find_record_by_barcode(&product.barcode)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.product, product);
        assert_eq!(record.category_name, None);
        assert_eq!(record.total_stock, 0);
    }

    #[tokio::test]
    async fn test_stock_for_unknown_product() {
        let db = setup().await;

        assert!(matches!(
            db.products().update_stock("missing", 1, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
