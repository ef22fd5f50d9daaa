//! # Validation Module
//!
//! Input validation rules shared by every module.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request DTO (serde)                                          │
//! │  └── Shape and type of the JSON payload                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules (lengths, ranges, formats)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE (sku, username, phone, document_id)                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("ARZ-1KG").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a trimmed string is present and no longer than `max`.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_sku;
///
/// assert!(validate_sku("ARZ-1KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required_text("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-150 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 150)
}

/// Validates a person's full name (1-150 characters).
pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    required_text("full_name", name, 150)
}

/// Validates a login username.
///
/// ## Rules
/// - 1-50 characters
/// - Letters, numbers, `.`, `_`, `-`
pub fn validate_username(username: &str) -> ValidationResult<()> {
    required_text("username", username, 50)?;

    if !username
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - 6-20 characters
/// - Digits plus an optional leading `+`, spaces and hyphens
///
/// ```rust
/// use tienda_core::validation::validate_phone;
///
/// assert!(validate_phone("+591 71234567").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required_text("phone", phone, 20)?;

    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();

    if digits < 6 || !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain at least 6 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a national identity document number (1-20 alphanumerics).
pub fn validate_document_id(document_id: &str) -> ValidationResult<()> {
    required_text("document_id", document_id, 20)?;

    if !document_id
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "document_id".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional payment reference (at most 100 characters).
pub fn validate_payment_reference(reference: Option<&str>) -> ValidationResult<()> {
    match reference {
        Some(r) if r.trim().chars().count() > 100 => Err(ValidationError::TooLong {
            field: "payment_reference".to_string(),
            max: 100,
        }),
        _ => Ok(()),
    }
}

/// Validates a notification title and message.
pub fn validate_notification(title: &str, message: &str) -> ValidationResult<()> {
    required_text("title", title, 200)?;
    required_text("message", message, 2000)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → Proceed with add_item                                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents: `0..=MAX_PRICE_CENTS`. Zero is allowed (free items).
///
/// ```rust
/// use tienda_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX / 100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock figure (`stock` or `min_stock`): `0..=MAX_STOCK`.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a forecast horizon or list limit: `1..=max`.
pub fn validate_horizon(field: &str, value: u32, max: u32) -> ValidationResult<()> {
    if value == 0 || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: max as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
