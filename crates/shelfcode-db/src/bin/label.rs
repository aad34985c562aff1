//! # Label Printer
//!
//! Resolves an issued code and writes its SVG label.
//!
//! ## Usage
//! ```bash
//! # Print the label to stdout
//! cargo run -p shelfcode-db --bin label -- 3000300000011
//!
//! # Write it to a file, using a specific database
//! cargo run -p shelfcode-db --bin label -- --db ./data/dev.db 3000300000011 --out cable.svg
//! ```
//!
//! Label geometry comes from the `[label]` section of the config file.

use std::env;
use std::path::PathBuf;

use shelfcode_db::{Database, ShelfcodeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut code: Option<String> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--out" | "-o" => {
                if i + 1 < args.len() {
                    out_path = Some(PathBuf::from(&args[i + 1]));
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
                print_help();
                return Ok(());
            }
            other => code = Some(other.to_string()),
        }
        i += 1;
    }

    let Some(code) = code else {
        print_help();
        return Err("missing <CODE> argument".into());
    };

    let mut config = ShelfcodeConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    let db = Database::new(config.db_config()).await?;
    let svg = db.barcodes().label_for(&code, &config.label).await?;
    db.close().await;

    match out_path {
        Some(path) => {
            std::fs::write(&path, &svg)?;
            info!(?path, code = %code.trim(), "Label written");
        }
        None => print!("{}", svg),
    }

    Ok(())
}

fn print_help() {
    println!("Shelfcode Label Printer");
    println!();
    println!("Usage: label [OPTIONS] <CODE>");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>      Database file path (default: from config)");
    println!("  -o, --out <FILE>     Write the SVG here (default: stdout)");
    println!("      --config <PATH>  Config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shelfcode_db=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
