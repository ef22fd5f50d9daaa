//! # Catalog
//!
//! Products, partial updates and inventory movements.
//!
//! ## Stock Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Movements                                │
//! │                                                                         │
//! │  Entry       stock + qty          (goods received)                     │
//! │  Exit        stock - qty          (breakage, internal use)             │
//! │                └── never below 0                                       │
//! │  Adjustment  stock = qty          (physical count)                     │
//! │                                                                         │
//! │  Sales never create movements: checkout decrements stock directly      │
//! │  inside its own transaction.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::RecordStatus;
use crate::MAX_STOCK;
use crate::validation::{
    validate_price_cents, validate_product_name, validate_sku, validate_stock_level,
    ValidationResult,
};

/// Default threshold for the critical-inventory report.
pub const DEFAULT_MIN_STOCK: i64 = 5;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Critical-inventory threshold.
    pub min_stock: i64,

    pub status: RecordStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Stock at or below the minimum.
    pub fn is_critical(&self) -> bool {
        self.stock <= self.min_stock
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Soft-deletes the product. Sales history keeps referencing it.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.status = RecordStatus::Inactive;
        self.updated_at = now;
    }

    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.status = RecordStatus::Active;
        self.updated_at = now;
    }

    /// Checks every field rule on the record as a whole.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_sku(&self.sku)?;
        validate_product_name(&self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock_level("stock", self.stock)?;
        validate_stock_level("min_stock", self.min_stock)
    }
}

/// Creation payload for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub min_stock: Option<i64>,
}

impl NewProduct {
    /// Validates the payload and builds an active product with a fresh id.
    pub fn into_product(self, now: DateTime<Utc>) -> ValidationResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            price_cents: self.price_cents,
            stock: self.stock,
            min_stock: self.min_stock.unwrap_or(DEFAULT_MIN_STOCK),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }
}

// =============================================================================
// Product Patch
// =============================================================================

/// Partial update of a product.
///
/// Only fields that are `Some` change. Stock is deliberately absent: it
/// moves only through inventory movements and checkouts.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tienda_core::catalog::{NewProduct, ProductPatch};
///
/// let mut product = NewProduct {
///     sku: "ARZ-1KG".into(),
///     name: "Arroz 1kg".into(),
///     description: None,
///     price_cents: 850,
///     stock: 10,
///     min_stock: None,
/// }
/// .into_product(Utc::now())
/// .unwrap();
///
/// let patch = ProductPatch { price_cents: Some(900), ..Default::default() };
/// patch.apply(&mut product, Utc::now()).unwrap();
/// assert_eq!(product.price_cents, 900);
/// assert_eq!(product.name, "Arroz 1kg");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, with = "double_option")]
    #[ts(as = "Option<String>")]
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub min_stock: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.sku.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.min_stock.is_none()
    }

    /// Applies present fields, then validates the merged record.
    ///
    /// On error the product is left untouched.
    pub fn apply(&self, product: &mut Product, now: DateTime<Utc>) -> ValidationResult<()> {
        let mut merged = product.clone();

        if let Some(sku) = &self.sku {
            merged.sku = sku.trim().to_string();
        }
        if let Some(name) = &self.name {
            merged.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            merged.description = description.as_ref().map(|d| d.trim().to_string());
        }
        if let Some(price) = self.price_cents {
            merged.price_cents = price;
        }
        if let Some(min_stock) = self.min_stock {
            merged.min_stock = min_stock;
        }

        merged.validate()?;
        merged.updated_at = now;
        *product = merged;
        Ok(())
    }
}

/// Serde helper telling "field absent" apart from "field set to null".
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

// =============================================================================
// Inventory Movements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
    Adjustment,
}

impl MovementKind {
    /// Computes the stock after applying a movement of `quantity` units.
    ///
    /// ```rust
    /// use tienda_core::catalog::MovementKind;
    ///
    /// assert_eq!(MovementKind::Entry.apply(5, 3).unwrap(), 8);
    /// assert_eq!(MovementKind::Exit.apply(5, 3).unwrap(), 2);
    /// assert_eq!(MovementKind::Adjustment.apply(5, 3).unwrap(), 3);
    /// assert!(MovementKind::Exit.apply(2, 3).is_err());
    /// ```
    pub fn apply(&self, current: i64, quantity: i64) -> CoreResult<i64> {
        match self {
            MovementKind::Entry | MovementKind::Exit if quantity <= 0 => {
                Err(CoreError::InvalidStockMovement {
                    reason: "quantity must be positive".to_string(),
                })
            }
            MovementKind::Entry => current
                .checked_add(quantity)
                .filter(|stock| *stock <= MAX_STOCK)
                .ok_or_else(|| CoreError::InvalidStockMovement {
                    reason: format!("stock cannot exceed {} units", MAX_STOCK),
                }),
            MovementKind::Exit if quantity > current => Err(CoreError::InvalidStockMovement {
                reason: format!("cannot remove {} units, only {} in stock", quantity, current),
            }),
            MovementKind::Exit => Ok(current - quantity),
            MovementKind::Adjustment if quantity < 0 => Err(CoreError::InvalidStockMovement {
                reason: "adjusted stock cannot be negative".to_string(),
            }),
            MovementKind::Adjustment if quantity > MAX_STOCK => Err(CoreError::InvalidStockMovement {
                reason: format!("stock cannot exceed {} units", MAX_STOCK),
            }),
            MovementKind::Adjustment => Ok(quantity),
        }
    }
}

/// A recorded change to a product's stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    /// User who recorded the movement.
    pub user_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        NewProduct {
            sku: " ARZ-1KG ".to_string(),
            name: "Arroz 1kg".to_string(),
            description: Some("Grano largo".to_string()),
            price_cents: 850,
            stock: 10,
            min_stock: None,
        }
        .into_product(Utc::now())
        .unwrap()
    }

    #[test]
    fn test_new_product_defaults() {
        let product = sample();
        assert_eq!(product.sku, "ARZ-1KG");
        assert_eq!(product.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(product.status, RecordStatus::Active);
        assert!(!product.is_critical());
    }

    #[test]
    fn test_new_product_rejects_negative_stock() {
        let result = NewProduct {
            sku: "X".to_string(),
            name: "X".to_string(),
            description: None,
            price_cents: 100,
            stock: -1,
            min_stock: None,
        }
        .into_product(Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_critical_at_threshold() {
        let mut product = sample();
        product.stock = product.min_stock;
        assert!(product.is_critical());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut product = sample();
        let patch = ProductPatch {
            name: Some("Arroz Extra 1kg".to_string()),
            ..Default::default()
        };
        patch.apply(&mut product, Utc::now()).unwrap();
        assert_eq!(product.name, "Arroz Extra 1kg");
        assert_eq!(product.price_cents, 850);
        assert_eq!(product.description.as_deref(), Some("Grano largo"));
    }

    #[test]
    fn test_patch_can_clear_description() {
        let mut product = sample();
        let patch: ProductPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert!(!patch.is_empty());
        patch.apply(&mut product, Utc::now()).unwrap();
        assert!(product.description.is_none());

        let absent: ProductPatch = serde_json::from_str("{}").unwrap();
        assert!(absent.is_empty());
    }

    #[test]
    fn test_invalid_patch_leaves_product_untouched() {
        let mut product = sample();
        let patch = ProductPatch {
            name: Some("Nuevo".to_string()),
            price_cents: Some(-5),
            ..Default::default()
        };
        assert!(patch.apply(&mut product, Utc::now()).is_err());
        assert_eq!(product.name, "Arroz 1kg");
        assert_eq!(product.price_cents, 850);
    }

    #[test]
    fn test_deactivate_and_restore() {
        let mut product = sample();
        product.deactivate(Utc::now());
        assert!(!product.is_active());
        product.restore(Utc::now());
        assert!(product.is_active());
    }

    #[test]
    fn test_movement_rules() {
        assert_eq!(MovementKind::Entry.apply(0, 12).unwrap(), 12);
        assert_eq!(MovementKind::Exit.apply(12, 12).unwrap(), 0);
        assert_eq!(MovementKind::Adjustment.apply(12, 0).unwrap(), 0);

        assert!(MovementKind::Entry.apply(5, 0).is_err());
        assert!(MovementKind::Exit.apply(5, 6).is_err());
        assert!(MovementKind::Adjustment.apply(5, -1).is_err());
    }

    #[test]
    fn test_movement_cannot_exceed_max_stock() {
        assert_eq!(MovementKind::Entry.apply(MAX_STOCK - 1, 1).unwrap(), MAX_STOCK);
        assert!(matches!(
            MovementKind::Entry.apply(MAX_STOCK, 1),
            Err(CoreError::InvalidStockMovement { .. })
        ));
        assert!(MovementKind::Entry.apply(i64::MAX, i64::MAX).is_err());
        assert!(MovementKind::Adjustment.apply(0, MAX_STOCK + 1).is_err());
    }

    #[test]
    fn test_new_product_rejects_unbounded_price() {
        let result = NewProduct {
            sku: "BIG".to_string(),
            name: "Big".to_string(),
            description: None,
            price_cents: i64::MAX / 100,
            stock: 1000,
            min_stock: None,
        }
        .into_product(Utc::now());
        assert!(result.is_err());

        let mut product = sample();
        let patch = ProductPatch {
            price_cents: Some(crate::MAX_PRICE_CENTS + 1),
            ..Default::default()
        };
        assert!(patch.apply(&mut product, Utc::now()).is_err());
    }

    #[test]
    fn test_patch_binding_clears_with_null() {
        let decl = ProductPatch::decl();
        assert!(decl.contains("description: string | null"), "{}", decl);
    }
}
