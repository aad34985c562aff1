//! Concurrent allocation against a file database with a real multi-connection
//! pool (the in-memory pool used by unit tests has a single connection).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use shelfcode_core::{validate, BarcodeCode, BarcodeKind, LookupHit};
use shelfcode_db::{AllocationRequest, Database, DbConfig};
use tempfile::TempDir;

/// Database file inside a scratch directory (removed with the WAL files on drop).
fn temp_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfcode.db");
    (dir, path)
}

async fn open(path: &Path) -> Database {
    let config = DbConfig::new(path).max_connections(8);
    let db = Database::new(config).await.unwrap();
    db.stores().create(7, "Downtown", None).await.unwrap();
    db.categories().create(7, "Cases", None).await.unwrap();
    db
}

async fn allocate_concurrently(db: &Database, requests: Vec<AllocationRequest>) -> Vec<BarcodeCode> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let service = db.barcodes();
            tokio::spawn(async move { service.allocate(request).await })
        })
        .collect();

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(handle.await.unwrap().unwrap().code);
    }
    codes
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_are_distinct_and_contiguous() {
    let (_dir, path) = temp_db();
    let db = open(&path).await;
    const N: u32 = 24;

    let requests = (0..N)
        .map(|n| AllocationRequest::phone(7, format!("Phone {n}")))
        .collect();
    let codes = allocate_concurrently(&db, requests).await;

    let distinct: HashSet<&str> = codes.iter().map(BarcodeCode::as_str).collect();
    assert_eq!(distinct.len(), N as usize);

    let mut sequences: Vec<u32> = codes.iter().map(BarcodeCode::sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=N).collect::<Vec<_>>());

    for code in &codes {
        assert!(validate(code.as_str()));
        assert_eq!(code.prefix(), "200");
        assert_eq!(code.scope_code(), "07");
    }

    assert_eq!(db.phones().count().await.unwrap(), i64::from(N));
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_kinds_in_same_scope_do_not_collide() {
    let (_dir, path) = temp_db();
    let db = open(&path).await;

    let requests = (0..16)
        .map(|n| {
            if n % 2 == 0 {
                AllocationRequest::phone(7, "Pixel 8")
            } else {
                AllocationRequest::product(7, "Clear Case")
            }
        })
        .collect();
    let codes = allocate_concurrently(&db, requests).await;

    let distinct: HashSet<&str> = codes.iter().map(BarcodeCode::as_str).collect();
    assert_eq!(distinct.len(), 16);

    for kind in BarcodeKind::ALL {
        let mut sequences: Vec<u32> = codes
            .iter()
            .filter(|c| c.kind() == Some(kind))
            .map(BarcodeCode::sequence)
            .collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=8).collect::<Vec<_>>(), "{kind}");
    }

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counter_survives_reopen_and_round_trips() {
    let (_dir, path) = temp_db();

    let first = {
        let db = open(&path).await;
        let issued = db
            .barcodes()
            .allocate(AllocationRequest::product(7, "Clear Case"))
            .await
            .unwrap();
        db.close().await;
        issued
    };

    let db = Database::new(DbConfig::new(&path).max_connections(8))
        .await
        .unwrap();

    let requests = (0..5)
        .map(|_| AllocationRequest::product(7, "Clear Case"))
        .collect();
    let codes = allocate_concurrently(&db, requests).await;

    let mut sequences: Vec<u32> = codes.iter().map(BarcodeCode::sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![2, 3, 4, 5, 6]);

    match db.barcodes().resolve(first.code.as_str()).await.unwrap() {
        LookupHit::Product(record) => {
            assert_eq!(record.product.id, first.entity_id);
            assert_eq!(record.category_name.as_deref(), Some("Cases"));
        }
        other => panic!("expected product, got {:?}", other),
    }

    db.close().await;
}
