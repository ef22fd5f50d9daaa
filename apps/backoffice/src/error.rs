//! # API Error Type
//!
//! Unified error type for request handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Backoffice                         │
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                           │
//! │         │                                                               │
//! │         ├── ValidationError ─────────────► VALIDATION_ERROR             │
//! │         │                                                               │
//! │         ├── CoreError (business rule) ───► NOT_FOUND, CART_ERROR,       │
//! │         │                                  INSUFFICIENT_STOCK, ...      │
//! │         │                                                               │
//! │         ├── StoreError::Rejected(core) ──► same as CoreError            │
//! │         │                                                               │
//! │         └── DbError / StoreError::Storage ► DATABASE_ERROR              │
//! │                                             (logged, generic message)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transport turns `code` into a protocol status and shows `message`
//! to the user.

use serde::Serialize;
use tienda_core::{CoreError, ValidationError};
use tienda_db::{DbError, StoreError};

use crate::state::ForecastError;

/// Error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Arroz 1kg: 3 available, 5 requested"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Business logic error (422)
    BusinessLogic,

    /// Internal server error (500)
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Payment method or reference rejected
    PaymentError,

    /// No forecast model could be produced
    ForecastUnavailable,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Storage failures keep their detail in the log, not in the response.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value violates a constraint")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::ProductInactive { .. } | CoreError::InvalidStockMovement { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
            CoreError::InvalidPaymentMethod(_) => ApiError::new(ErrorCode::PaymentError, message),
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::QuantityTooLarge { .. } => ApiError::validation(message),
            CoreError::ForecastUnavailable { .. } => {
                ApiError::new(ErrorCode::ForecastUnavailable, message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(e) => e.into(),
            StoreError::Storage(e) => e.into(),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Model(e) => e.into(),
            ForecastError::Storage(e) => e.into(),
            ForecastError::Io(e) => {
                tracing::error!("Forecast model file error: {}", e);
                ApiError::internal("Could not save the forecast model")
            }
            ForecastError::Format(e) => {
                tracing::error!("Forecast model encoding error: {}", e);
                ApiError::internal("Could not save the forecast model")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rejections_keep_their_message() {
        let err: ApiError = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            product_name: "Arroz 1kg".to_string(),
            available: 1,
            requested: 4,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Insufficient stock for Arroz 1kg: available 1, requested 4"
        );

        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: ApiError = CoreError::InvalidPaymentMethod("bitcoin".to_string()).into();
        assert_eq!(err.code, ErrorCode::PaymentError);
    }

    #[test]
    fn test_storage_faults_are_generic() {
        let err: ApiError =
            StoreError::Storage(DbError::TransactionFailed("disk I/O error".to_string())).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Transaction failed");
    }

    #[test]
    fn test_not_found_from_either_layer() {
        let from_db: ApiError = DbError::not_found("Sale", "s-1").into();
        let from_core: ApiError =
            StoreError::Rejected(CoreError::not_found("Client", "c-1")).into();

        assert_eq!(from_db.code, ErrorCode::NotFound);
        assert_eq!(from_db.message, "Sale not found: s-1");
        assert_eq!(from_core.code, ErrorCode::NotFound);
        assert_eq!(from_core.message, "Client not found: c-1");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::validation("sku is required")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "sku is required");
    }
}
