//! # Seed Data Generator
//!
//! Creates demo stores and categories, then issues codes concurrently.
//!
//! ## Usage
//! ```bash
//! # Issue 20 codes (default) into the configured database
//! cargo run -p shelfcode-db --bin seed
//!
//! # Issue 200 codes into a scratch file
//! cargo run -p shelfcode-db --bin seed -- --db ./data/dev.db --count 200
//! ```
//!
//! Requests alternate between phones and products and are spread over the
//! demo scopes, so several tasks always race for the same partition.

use std::env;
use std::path::PathBuf;

use shelfcode_db::{AllocationRequest, Database, IssuedCode, ShelfcodeConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo stores (phone scopes).
const STORES: &[(i64, &str)] = &[(1, "Downtown"), (2, "Uptown"), (7, "Airport Kiosk")];

/// Demo categories (product scopes).
const CATEGORIES: &[(i64, &str)] = &[(1, "Chargers"), (3, "Accessories"), (12, "Cases")];

const PHONE_MODELS: &[&str] = &["Pixel 8", "Galaxy S24", "iPhone 15", "Moto G84", "Nothing Phone 2"];

const PRODUCT_NAMES: &[&str] = &["USB-C Cable", "20W Charger", "Clear Case", "Screen Protector"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 20;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shelfcode Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of codes to issue (default: 20)");
                println!("  -d, --db <PATH>      Database file path (default: from config)");
                println!("      --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = ShelfcodeConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("Shelfcode Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database.path.display());
    println!("Codes:    {}", count);
    println!();

    let db = Database::new(config.db_config()).await?;

    for (id, name) in STORES {
        if db.stores().get_by_id(*id).await?.is_none() {
            db.stores().create(*id, name, None).await?;
            println!("✓ Store {:02} {}", id, name);
        }
    }
    for (id, name) in CATEGORIES {
        if db.categories().get_by_id(*id).await?.is_none() {
            db.categories().create(*id, name, None).await?;
            println!("✓ Category {:02} {}", id, name);
        }
    }

    println!();
    println!("Issuing codes...");

    let start = std::time::Instant::now();
    let mut handles = Vec::with_capacity(count);

    for n in 0..count {
        let request = demo_request(n);
        let service = db.barcodes();
        handles.push(tokio::spawn(async move { service.allocate(request).await }));
    }

    let mut issued: Vec<IssuedCode> = Vec::with_capacity(count);
    let mut failed = 0;
    for handle in handles {
        match handle.await? {
            Ok(code) => issued.push(code),
            Err(e) => {
                eprintln!("Failed to issue code: {}", e);
                failed += 1;
            }
        }
    }

    issued.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
    for code in &issued {
        println!("  {:<7} {}  {}", code.kind.to_string(), code.code, code.entity_id);
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Issued {} codes in {:?} ({} failed)", issued.len(), elapsed, failed);
    info!(issued = issued.len(), failed, "Seed complete");

    db.close().await;
    Ok(())
}

/// Builds the `n`th demo request.
fn demo_request(n: usize) -> AllocationRequest {
    if n % 2 == 0 {
        let (store, _) = STORES[(n / 2) % STORES.len()];
        let model = PHONE_MODELS[n % PHONE_MODELS.len()];
        AllocationRequest::phone(store, model).with_price(49_900 + (n as i64 % 5) * 10_000)
    } else {
        let (category, _) = CATEGORIES[(n / 2) % CATEGORIES.len()];
        let name = PRODUCT_NAMES[n % PRODUCT_NAMES.len()];
        AllocationRequest::product(category, name).with_price(999 + (n as i64 % 4) * 500)
    }
}

/// Initializes the tracing subscriber (`RUST_LOG` wins over the default).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shelfcode_db=info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
