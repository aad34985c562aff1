//! # Sequence Allocator
//!
//! Hands out the next code of a `(kind, scope)` partition, unique across all
//! concurrent callers.
//!
//! ## Allocation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               One attempt = one write transaction                       │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPSERT barcode_sequences (kind_prefix, scope_code)   ← takes the      │
//! │    first use:  seed = MAX(sequence on entity table) + 1  write lock    │
//! │    otherwise:  last_sequence + 1                                        │
//! │    RETURNING last_sequence                                              │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  assemble(kind, scope, sequence) + check digit                          │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  INSERT entity row (UNIQUE barcode)                                     │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT  ── counter and entity land together or not at all              │
//! │                                                                         │
//! │  Busy / unique violation / timeout ──► backoff, retry                   │
//! │  Retries exhausted ──► BarcodeError::AllocationConflict                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use shelfcode_core::code::{MAX_SEQUENCE, SEQUENCE_LEN, SEQUENCE_START};
use shelfcode_core::{BarcodeCode, BarcodeError, BarcodeKind, Scope};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

// =============================================================================
// Retry Policy
// =============================================================================

/// Bounds on how long a contended allocation keeps trying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up with `AllocationConflict`.
    pub max_attempts: u32,

    /// Wait after the first failed attempt.
    pub initial_backoff: Duration,

    /// Upper bound on any single wait.
    pub max_backoff: Duration,

    /// Time budget of one attempt (transaction included). Must exceed the
    /// pool's busy timeout, or a waiting attempt is cut off before SQLite
    /// reports the lock.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Creates the exponential backoff between attempts.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by max_attempts instead
            ..Default::default()
        }
    }
}

/// Runs `attempt` until it succeeds, fails for good, or the policy runs out.
///
/// ## Returns
/// * `Ok(T)` - An attempt succeeded
/// * `Err(DbError::Barcode(AllocationConflict))` - Every attempt hit a
///   retryable error
/// * `Err(e)` - The first non-retryable error, unchanged
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    kind: BarcodeKind,
    scope: Scope,
    mut attempt: F,
) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.create_backoff();

    for n in 1..=max_attempts {
        let outcome = match tokio::time::timeout(policy.attempt_timeout, attempt()).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout(policy.attempt_timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(value) => {
                if n > 1 {
                    debug!(%kind, %scope, attempts = n, "Allocation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() => {
                warn!(%kind, %scope, attempt = n, error = %err, "Allocation attempt failed");
                if n < max_attempts {
                    if let Some(wait) = backoff.next_backoff() {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(BarcodeError::AllocationConflict {
        kind,
        scope: scope.value(),
        attempts: max_attempts,
    }
    .into())
}

// =============================================================================
// Partition Counter
// =============================================================================

/// Entity table that owns codes of `kind`.
pub(crate) fn entity_table(kind: BarcodeKind) -> &'static str {
    match kind {
        BarcodeKind::Phone => "phones",
        BarcodeKind::Product => "products",
    }
}

/// Bumps the partition counter and returns the new sequence.
///
/// Must be the first statement of the caller's transaction so the write
/// lock is held before anything is read. On first use the counter is seeded
/// from the highest sequence already stored on the entity table.
async fn bump_sequence(
    conn: &mut SqliteConnection,
    kind: BarcodeKind,
    scope: Scope,
) -> DbResult<i64> {
    // Table name comes from a closed enum, never from input. SQLite substr is
    // 1-based.
    let sql = format!(
        r#"
        INSERT INTO barcode_sequences (kind_prefix, scope_code, last_sequence, updated_at)
        VALUES (
            ?1,
            ?2,
            (
                SELECT COALESCE(MAX(CAST(substr(barcode, {seq_from}, {seq_len}) AS INTEGER)), 0)
                FROM {table}
                WHERE substr(barcode, 1, {head_len}) = ?1 || ?2
            ) + 1,
            ?3
        )
        ON CONFLICT (kind_prefix, scope_code) DO UPDATE SET
            last_sequence = MAX(barcode_sequences.last_sequence + 1, excluded.last_sequence),
            updated_at = excluded.updated_at
        RETURNING last_sequence
        "#,
        table = entity_table(kind),
        seq_from = SEQUENCE_START + 1,
        seq_len = SEQUENCE_LEN,
        head_len = SEQUENCE_START,
    );

    let sequence: i64 = sqlx::query_scalar(&sql)
        .bind(kind.prefix())
        .bind(scope.code())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    Ok(sequence)
}

/// Allocates the next code of a partition inside the caller's transaction.
///
/// ## Arguments
/// * `conn` - The open transaction's connection (`&mut *tx`)
/// * `kind` - Entity kind (selects prefix and entity table)
/// * `scope` - Store or category partition
///
/// ## Returns
/// * `Ok(BarcodeCode)` - New code; persists only if the transaction commits
/// * `Err(PartitionExhausted)` - The 7-digit sequence space is used up
pub async fn next_code(
    conn: &mut SqliteConnection,
    kind: BarcodeKind,
    scope: Scope,
) -> DbResult<BarcodeCode> {
    let sequence = bump_sequence(conn, kind, scope).await?;

    let sequence = u32::try_from(sequence)
        .ok()
        .filter(|s| *s <= MAX_SEQUENCE)
        .ok_or(BarcodeError::PartitionExhausted {
            kind,
            scope: scope.value(),
        })?;

    let code = BarcodeCode::assemble(kind, scope, sequence)?;
    debug!(%kind, %scope, sequence, code = %code, "Allocated code");
    Ok(code)
}

/// Returns the last issued sequence of a partition (0 if none yet).
pub async fn last_sequence(
    conn: &mut SqliteConnection,
    kind: BarcodeKind,
    scope: Scope,
) -> DbResult<u32> {
    let last: Option<i64> = sqlx::query_scalar(
        "SELECT last_sequence FROM barcode_sequences WHERE kind_prefix = ?1 AND scope_code = ?2",
    )
    .bind(kind.prefix())
    .bind(scope.code())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(last.and_then(|s| u32::try_from(s).ok()).unwrap_or(0))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            attempt_timeout: Duration::from_millis(200),
        }
    }

    fn scope(kind: BarcodeKind, id: i64) -> Scope {
        Scope::new(kind, id).unwrap()
    }

    #[tokio::test]
    async fn test_sequences_start_at_one_and_increase() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let s = scope(BarcodeKind::Phone, 7);

        let first = next_code(&mut conn, BarcodeKind::Phone, s).await.unwrap();
        let second = next_code(&mut conn, BarcodeKind::Phone, s).await.unwrap();

        assert_eq!(first.as_str(), "2000700000018");
        assert_eq!(second.sequence(), 2);
        assert_eq!(last_sequence(&mut conn, BarcodeKind::Phone, s).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_partitions_are_independent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let phone = next_code(&mut conn, BarcodeKind::Phone, scope(BarcodeKind::Phone, 7))
            .await
            .unwrap();
        let product = next_code(&mut conn, BarcodeKind::Product, scope(BarcodeKind::Product, 7))
            .await
            .unwrap();
        let other = next_code(&mut conn, BarcodeKind::Phone, scope(BarcodeKind::Phone, 8))
            .await
            .unwrap();

        assert_eq!(phone.sequence(), 1);
        assert_eq!(product.sequence(), 1);
        assert_eq!(other.sequence(), 1);
        assert_ne!(phone, product);
    }

    #[tokio::test]
    async fn test_rolled_back_transaction_releases_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let s = scope(BarcodeKind::Product, 3);

        {
            let mut tx = db.pool().begin().await.unwrap();
            next_code(&mut *tx, BarcodeKind::Product, s).await.unwrap();
            tx.rollback().await.unwrap();
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(last_sequence(&mut conn, BarcodeKind::Product, s).await.unwrap(), 0);
        let code = next_code(&mut conn, BarcodeKind::Product, s).await.unwrap();
        assert_eq!(code.as_str(), "3000300000011");
    }

    #[tokio::test]
    async fn test_counter_is_seeded_from_stored_codes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let s = scope(BarcodeKind::Phone, 7);
        let now = Utc::now();

        sqlx::query("INSERT INTO stores (id, name, created_at) VALUES (7, 'Airport', ?1)")
            .bind(now)
            .execute(&mut *conn)
            .await
            .unwrap();

        // A read that runs into the check digit sees ten times these values.
        for (id, sequence) in [("p-3", 3), ("p-19", 19), ("p-120", 120)] {
            let stored = BarcodeCode::assemble(BarcodeKind::Phone, s, sequence).unwrap();
            sqlx::query(
                "INSERT INTO phones (id, store_id, model, barcode, created_at, updated_at) \
                 VALUES (?1, 7, 'Pixel 8', ?2, ?3, ?3)",
            )
            .bind(id)
            .bind(stored.as_str())
            .bind(now)
            .execute(&mut *conn)
            .await
            .unwrap();
        }

        let code = next_code(&mut conn, BarcodeKind::Phone, s).await.unwrap();
        assert_eq!(code.sequence(), 121);
        assert_eq!(code.scope_code(), "07");

        // Other partitions are not affected by those rows.
        let other = next_code(&mut conn, BarcodeKind::Phone, scope(BarcodeKind::Phone, 8))
            .await
            .unwrap();
        assert_eq!(other.sequence(), 1);
    }

    #[test]
    fn test_default_attempt_timeout_outlasts_busy_timeout() {
        let policy = RetryPolicy::default();
        assert!(policy.attempt_timeout > DbConfig::new("shelfcode.db").busy_timeout);
        assert!(policy.attempt_timeout > DbConfig::in_memory().busy_timeout);
    }

    #[tokio::test]
    async fn test_exhausted_partition_is_reported() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let s = scope(BarcodeKind::Product, 0);

        sqlx::query(
            "INSERT INTO barcode_sequences (kind_prefix, scope_code, last_sequence, updated_at) \
             VALUES ('300', '00', ?1, ?2)",
        )
        .bind(i64::from(MAX_SEQUENCE))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();

        let err = next_code(&mut conn, BarcodeKind::Product, s).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Barcode(BarcodeError::PartitionExhausted { scope: 0, .. })
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_allocation_conflict() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: DbResult<()> = with_retry(
            &fast_policy(3),
            BarcodeKind::Phone,
            scope(BarcodeKind::Phone, 7),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DbError::Busy("database is locked".into()))
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DbError::Barcode(err)) => {
                assert_eq!(
                    err,
                    BarcodeError::AllocationConflict {
                        kind: BarcodeKind::Phone,
                        scope: 7,
                        attempts: 3,
                    }
                );
                assert!(err.is_transient());
            }
            other => panic!("expected AllocationConflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(
            &fast_policy(5),
            BarcodeKind::Product,
            Scope::UNSCOPED,
            move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(DbError::duplicate("products.barcode", "3000000000014")),
                    1 => Err(DbError::Busy("database is locked".into())),
                    n => Ok(n),
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: DbResult<()> = with_retry(
            &fast_policy(5),
            BarcodeKind::Phone,
            scope(BarcodeKind::Phone, 1),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DbError::not_found("Store", "1"))
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: DbResult<()> = with_retry(
            &fast_policy(2),
            BarcodeKind::Phone,
            scope(BarcodeKind::Phone, 2),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(DbError::Barcode(BarcodeError::AllocationConflict { attempts: 2, .. }))
        ));
    }
}
