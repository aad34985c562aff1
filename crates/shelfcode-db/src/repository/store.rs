//! # Store Repository
//!
//! Stores are the scopes of phone codes: store `07` owns `20007…` codes.

use chrono::Utc;
use shelfcode_core::validation::{validate_scope_id, validate_title};
use shelfcode_core::Store;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for store database operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Creates a new StoreRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Inserts a store under an explicit store number.
    ///
    /// ## Arguments
    /// * `id` - Store number, 1-99 (it becomes the scope of its phone codes)
    /// * `name` - Display name
    /// * `address` - Optional street address
    ///
    /// ## Returns
    /// * `Ok(Store)` - Inserted store
    /// * `Err(DbError::Validation)` - Number outside 1-99 or empty name
    /// * `Err(DbError::UniqueViolation)` - Number already taken
    pub async fn create(&self, id: i64, name: &str, address: Option<&str>) -> DbResult<Store> {
        validate_scope_id("store_id", id)?;
        validate_title("name", name)?;

        debug!(id, name = %name, "Inserting store");

        let store = Store {
            id,
            name: name.trim().to_string(),
            address: address.map(|a| a.trim().to_string()),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO stores (id, name, address, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(store.id)
            .bind(&store.name)
            .bind(&store.address)
            .bind(store.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("store id", id.to_string()),
                other => other,
            })?;

        Ok(store)
    }

    /// Gets a store by its number.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, name, address, created_at FROM stores WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    /// Returns true if the store exists.
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Lists all stores ordered by number.
    pub async fn list(&self) -> DbResult<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT id, name, address, created_at FROM stores ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;

    #[tokio::test]
    async fn test_create_and_get_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stores = db.stores();

        let store = stores.create(7, " Downtown ", Some("1 Main St")).await.unwrap();
        assert_eq!(store.name, "Downtown");

        let fetched = stores.get_by_id(7).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Downtown");
        assert_eq!(fetched.address.as_deref(), Some("1 Main St"));
        assert!(stores.exists(7).await.unwrap());
        assert!(!stores.exists(8).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_number_must_fit_scope() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(matches!(
            db.stores().create(100, "Too Far", None).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.stores().create(0, "Nowhere", None).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_store_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.stores().create(3, "North", None).await.unwrap();

        let err = db.stores().create(3, "South", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.stores().list().await.unwrap().len(), 1);
    }
}
