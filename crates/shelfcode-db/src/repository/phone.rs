//! # Phone Repository
//!
//! Phones own `200` codes scoped by their store. The code is allocated in
//! the same transaction that inserts the phone and never changes after.

use chrono::Utc;
use shelfcode_core::validation::{validate_imei, validate_price_cents, validate_title};
use shelfcode_core::{BarcodeError, BarcodeKind, NewPhone, Phone, PhoneRecord, Scope};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::allocator::{next_code, with_retry, RetryPolicy};
use crate::error::{DbError, DbResult};
use crate::repository::store::StoreRepository;

const PHONE_COLUMNS: &str =
    "id, store_id, model, imei, price_cents, barcode, created_at, updated_at";

/// Lookup row: phone columns plus the joined store name.
#[derive(Debug, sqlx::FromRow)]
struct PhoneRecordRow {
    #[sqlx(flatten)]
    phone: Phone,
    store_name: String,
}

impl From<PhoneRecordRow> for PhoneRecord {
    fn from(row: PhoneRecordRow) -> Self {
        PhoneRecord {
            phone: row.phone,
            store_name: row.store_name,
        }
    }
}

/// Repository for phone database operations.
#[derive(Debug, Clone)]
pub struct PhoneRepository {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl PhoneRepository {
    /// Creates a new PhoneRepository.
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        PhoneRepository { pool, retry }
    }

    /// Creates a phone and issues its barcode.
    ///
    /// ## Flow
    /// 1. Validate input (model, price, IMEI)
    /// 2. Resolve the store into a scope; unknown store → `InvalidScope`
    ///    before any counter is touched
    /// 3. Allocate + insert in one transaction, retried on contention
    ///
    /// ## Returns
    /// * `Ok(Phone)` - Inserted phone carrying its new barcode
    /// * `Err(DbError::Barcode(InvalidScope))` - Store missing or not 1-99
    /// * `Err(DbError::Barcode(AllocationConflict))` - Contention outlasted
    ///   the retry policy
    pub async fn create(&self, input: &NewPhone) -> DbResult<Phone> {
        validate_title("model", &input.model)?;
        if let Some(cents) = input.price_cents {
            validate_price_cents(cents)?;
        }
        if let Some(imei) = input.imei.as_deref() {
            validate_imei(imei)?;
        }

        let scope = self.resolve_scope(input.store_id).await?;

        let phone = with_retry(&self.retry, BarcodeKind::Phone, scope, move || {
            self.insert_with_code(input, scope)
        })
        .await?;

        info!(id = %phone.id, barcode = %phone.barcode, store_id = phone.store_id, "Phone created");
        Ok(phone)
    }

    /// Maps a store id onto its scope, checking the store exists.
    async fn resolve_scope(&self, store_id: i64) -> DbResult<Scope> {
        let invalid = BarcodeError::InvalidScope {
            kind: BarcodeKind::Phone,
            scope: store_id,
        };

        let scope = Scope::new(BarcodeKind::Phone, store_id)?;
        if scope == Scope::UNSCOPED {
            return Err(invalid.into());
        }

        if !StoreRepository::new(self.pool.clone()).exists(store_id).await? {
            debug!(store_id, "Rejecting phone for unknown store");
            return Err(invalid.into());
        }

        Ok(scope)
    }

    /// One allocation attempt: counter bump + insert, committed together.
    async fn insert_with_code(&self, input: &NewPhone, scope: Scope) -> DbResult<Phone> {
        let mut tx = self.pool.begin().await?;

        let code = next_code(&mut *tx, BarcodeKind::Phone, scope).await?;

        let now = Utc::now();
        let phone = Phone {
            id: Uuid::new_v4().to_string(),
            store_id: input.store_id,
            model: input.model.trim().to_string(),
            imei: input.imei.clone(),
            price_cents: input.price_cents,
            barcode: code.into_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO phones (
                id, store_id, model, imei, price_cents, barcode, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&phone.id)
        .bind(phone.store_id)
        .bind(&phone.model)
        .bind(&phone.imei)
        .bind(phone.price_cents)
        .bind(&phone.barcode)
        .bind(phone.created_at)
        .bind(phone.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            // Store deleted between the check and the insert.
            DbError::ForeignKeyViolation { .. } => BarcodeError::InvalidScope {
                kind: BarcodeKind::Phone,
                scope: input.store_id,
            }
            .into(),
            other => other,
        })?;

        tx.commit().await?;
        Ok(phone)
    }

    /// Gets a phone by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Phone>> {
        let sql = format!("SELECT {PHONE_COLUMNS} FROM phones WHERE id = ?1");
        let phone = sqlx::query_as::<_, Phone>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(phone)
    }

    /// Gets the lookup record (phone + store name) for an exact barcode.
    pub async fn find_record_by_barcode(&self, barcode: &str) -> DbResult<Option<PhoneRecord>> {
        let row = sqlx::query_as::<_, PhoneRecordRow>(
            r#"
            SELECT
                p.id, p.store_id, p.model, p.imei, p.price_cents, p.barcode,
                p.created_at, p.updated_at,
                s.name AS store_name
            FROM phones p
            INNER JOIN stores s ON s.id = p.store_id
            WHERE p.barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PhoneRecord::from))
    }

    /// Counts total phones (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phones")
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
    use shelfcode_core::{validate, BarcodeCode};

    fn new_phone(store_id: i64, model: &str) -> NewPhone {
        NewPhone {
            store_id,
            model: model.to_string(),
            imei: None,
            price_cents: Some(89_900),
        }
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.stores().create(7, "Downtown", None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_issues_sequential_codes() {
        let db = setup().await;
        let phones = db.phones();

        let first = phones.create(&new_phone(7, "Pixel 8")).await.unwrap();
        let second = phones.create(&new_phone(7, "Galaxy S24")).await.unwrap();

        assert_eq!(first.barcode, "2000700000018");
        assert!(validate(&second.barcode));
        assert_eq!(BarcodeCode::parse(&second.barcode).unwrap().sequence(), 2);
    }

    #[tokio::test]
    async fn test_unknown_store_consumes_no_sequence() {
        let db = setup().await;
        let phones = db.phones();

        let err = phones.create(&new_phone(8, "Pixel 8")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Barcode(BarcodeError::InvalidScope { scope: 8, .. })
        ));

        db.stores().create(8, "Uptown", None).await.unwrap();
        let phone = phones.create(&new_phone(8, "Pixel 8")).await.unwrap();
        assert_eq!(BarcodeCode::parse(&phone.barcode).unwrap().sequence(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_store_is_invalid_scope() {
        let db = setup().await;

        for store_id in [0, 100, -3] {
            let err = db.phones().create(&new_phone(store_id, "Pixel 8")).await.unwrap_err();
            assert!(
                matches!(err, DbError::Barcode(BarcodeError::InvalidScope { .. })),
                "store {store_id}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_input_is_validated_first() {
        let db = setup().await;

        let mut bad = new_phone(7, "   ");
        assert!(matches!(db.phones().create(&bad).await, Err(DbError::Validation(_))));

        bad.model = "Pixel 8".into();
        bad.imei = Some("12345".into());
        assert!(matches!(db.phones().create(&bad).await, Err(DbError::Validation(_))));

        assert_eq!(db.phones().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_record_by_barcode() {
        let db = setup().await;
        let phone = db.phones().create(&new_phone(7, "Pixel 8")).await.unwrap();

        let record = db
            .phones()
            .find_record_by_barcode(&phone.barcode)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.phone, phone);
        assert_eq!(record.store_name, "Downtown");

        assert!(db
            .phones()
            .find_record_by_barcode("2000700000025")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_barcode_column_is_immutable() {
        let db = setup().await;
        let phone = db.phones().create(&new_phone(7, "Pixel 8")).await.unwrap();

        let result = sqlx::query("UPDATE phones SET barcode = '2000700000995' WHERE id = ?1")
            .bind(&phone.id)
            .execute(db.pool())
            .await;
        assert!(result.is_err());

        let stored = db.phones().get_by_id(&phone.id).await.unwrap().unwrap();
        assert_eq!(stored.barcode, phone.barcode);
    }
}
