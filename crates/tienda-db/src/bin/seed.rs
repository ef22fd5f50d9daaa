//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tienda_dev.db with the default catalog
//! cargo run -p tienda-db --bin seed
//!
//! # Larger catalog, different file
//! cargo run -p tienda-db --bin seed -- --count 200 --db ./data/tienda.db
//! ```
//!
//! ## Generated Data
//! - One admin user (`admin`) linked to an employee record
//! - One walk-in client
//! - Products built from `{base} {presentation}` pairs, with every seventh
//!   one stocked at or below its minimum so critical inventory isn't empty

use chrono::Utc;
use std::env;
use tienda_core::{Employee, NewClient, NewProduct, Product, RecordStatus, User};
use tienda_db::{Database, DbConfig};
use uuid::Uuid;

/// Base products by SKU prefix.
const BASES: &[(&str, &[&str])] = &[
    ("ABR", &["Arroz", "Azucar", "Fideos", "Aceite", "Harina", "Sal", "Lentejas"]),
    ("LAC", &["Leche", "Yogurt", "Queso", "Mantequilla"]),
    ("BEB", &["Agua", "Gaseosa", "Jugo", "Cafe", "Te"]),
    ("LIM", &["Detergente", "Jabon", "Lejia", "Papel Higienico"]),
];

/// Presentations with their price add-on in cents.
const PRESENTATIONS: &[(&str, i64)] = &[
    ("250g", 0),
    ("500g", 120),
    ("1kg", 260),
    ("5kg", 1100),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./tienda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tienda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./tienda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tienda Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    if db.users().get_by_username("admin").await?.is_some() {
        println!("⚠ Database already seeded (user 'admin' exists)");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    let admin = User {
        id: Uuid::new_v4().to_string(),
        username: "admin".to_string(),
        email: Some("admin@tienda.local".to_string()),
        full_name: "Administrador".to_string(),
        status: RecordStatus::Active,
        created_at: now,
    };
    db.users().insert(&admin).await?;

    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        user_id: Some(admin.id.clone()),
        full_name: admin.full_name.clone(),
        phone: Some("70000000".to_string()),
        document_id: "0000001".to_string(),
        position: "Administrador".to_string(),
        status: RecordStatus::Active,
        created_at: now,
    };
    db.employees().insert(&employee).await?;

    let client = NewClient {
        full_name: "Cliente Mostrador".to_string(),
        phone: "000000000".to_string(),
        address: None,
        document_id: "00000000".to_string(),
    }
    .into_client(now)?;
    db.clients().insert(&client).await?;

    println!("✓ User 'admin' (id {})", admin.id);
    println!("✓ Employee (id {})", employee.id);
    println!("✓ Client '{}' (id {})", client.full_name, client.id);
    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (prefix, names) in BASES {
        for name in names.iter() {
            for (presentation, addon) in PRESENTATIONS {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(prefix, name, presentation, *addon, generated)?;
                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    let critical = db.products().critical_inventory().await?;

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    println!("  {} at or below minimum stock", critical.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic price and stock.
fn generate_product(
    prefix: &str,
    name: &str,
    presentation: &str,
    price_addon: i64,
    seed: usize,
) -> Result<Product, tienda_core::ValidationError> {
    let base_price = 150 + ((seed * 37) % 900) as i64;
    let stock = if seed % 7 == 0 {
        (seed % 4) as i64
    } else {
        10 + ((seed * 13) % 90) as i64
    };

    NewProduct {
        sku: format!("{}-{:04}", prefix, seed),
        name: format!("{} {}", name, presentation),
        description: None,
        price_cents: base_price + price_addon,
        stock,
        min_stock: None,
    }
    .into_product(Utc::now())
}
