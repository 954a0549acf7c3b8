//! # Error Types
//!
//! Domain-specific error types for orderdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderdesk-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── PaymentError     - Payment reconciliation failures                │
//! │                                                                         │
//! │  orderdesk-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What the client sees (JSON body + status)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::payment::PaymentMethod;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The tax configuration cannot be used for a calculation.
    ///
    /// ## When This Occurs
    /// - Negative rate (e.g. `-5%` typed into the settings form)
    /// - Rate above 100%
    /// - NaN / infinite rate coming from a bad float parse
    #[error("Invalid tax configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Order has exceeded the maximum number of lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A product referenced by the draft is not on it.
    #[error("Product {0} is not on the order")]
    LineNotFound(String),

    /// The operation requires an invoice but got another document kind.
    #[error("Transaction {id} is a {kind}, expected an invoice")]
    NotAnInvoice { id: String, kind: String },

    /// Payment reconciliation failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        CoreError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Payment Error
// =============================================================================

/// Reasons a proposed payment is not admissible against a pending balance.
///
/// None of these are partially applied: a rejected payment changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// One of the per-method amounts is negative.
    #[error("{method} amount cannot be negative")]
    NegativeAmount { method: PaymentMethod },

    /// The pending balance handed in is negative.
    #[error("Pending balance cannot be negative")]
    NegativeBalance,

    /// All amounts are zero.
    #[error("Payment total must be greater than zero")]
    NothingToApply,

    /// The payment is larger than what is owed.
    #[error("Payment total {total} exceeds pending balance {pending}")]
    ExceedsPending { total: Money, pending: Money },

    /// The tenders add up to more than an amount can hold.
    #[error("Payment total is out of range")]
    TotalOutOfRange,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid RNC).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::Negative {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 12_000,
            max: 9_999,
        };
        assert_eq!(
            err.to_string(),
            "Quantity 12000 exceeds maximum allowed (9999)"
        );

        let err = CoreError::invalid_config("rate cannot be negative");
        assert_eq!(
            err.to_string(),
            "Invalid tax configuration: rate cannot be negative"
        );
    }

    #[test]
    fn test_payment_error_messages() {
        let err = PaymentError::ExceedsPending {
            total: Money::from_cents(11_000),
            pending: Money::from_cents(10_000),
        };
        assert_eq!(
            err.to_string(),
            "Payment total 110.00 exceeds pending balance 100.00"
        );

        let err = PaymentError::NegativeAmount {
            method: PaymentMethod::Cash,
        };
        assert_eq!(err.to_string(), "cash amount cannot be negative");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("code");
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::negative("price");
        assert_eq!(err.to_string(), "price cannot be negative");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = PaymentError::NothingToApply.into();
        assert!(matches!(core_err, CoreError::Payment(PaymentError::NothingToApply)));
        assert_eq!(core_err.to_string(), "Payment total must be greater than zero");
    }
}
