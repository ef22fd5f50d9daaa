//! Fixtures shared by the repository and checkout tests.

use chrono::Utc;
use tienda_core::{Client, NewClient, NewProduct, Product, RecordStatus, User};
use uuid::Uuid;

use crate::pool::{Database, DbConfig};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) async fn seed_user(db: &Database, username: &str) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: None,
        full_name: format!("{} Test", username),
        status: RecordStatus::Active,
        created_at: Utc::now(),
    };
    db.users().insert(&user).await.unwrap();
    user
}

pub(crate) async fn seed_client(db: &Database, phone: &str) -> Client {
    let client = NewClient {
        full_name: "Rosa Quispe".to_string(),
        phone: phone.to_string(),
        address: None,
        document_id: format!("DNI{}", phone),
    }
    .into_client(Utc::now())
    .unwrap();
    db.clients().insert(&client).await.unwrap();
    client
}

pub(crate) async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> Product {
    let product = NewProduct {
        sku: sku.to_string(),
        name: format!("Producto {}", sku),
        description: None,
        price_cents,
        stock,
        min_stock: None,
    }
    .into_product(Utc::now())
    .unwrap();
    db.products().insert(&product).await.unwrap();
    product
}
