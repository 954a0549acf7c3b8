//! Client-side error classification.
//!
//! Every store reports failures in the same six buckets, whether the
//! failure came from the in-memory rules or from an HTTP status.

use orderdesk_core::{CoreError, PaymentError, ValidationError};
use serde::Deserialize;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// Input rejected by a business rule (bad field, rejected payment).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend could not be reached or returned an unreadable body.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Not logged in, bad credentials, or an expired session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl ClientError {
    /// Classifies a non-success HTTP status and its message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => ClientError::Validation(message),
            401 | 403 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            _ => ClientError::Server(message),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ClientError::NotFound(format!("{entity} {id}"))
    }
}

/// Error body returned by the API: `{ "code": "...", "message": "..." }`.
/// Only the message is kept; the status already carries the class.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Network(format!("invalid url: {err}"))
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LineNotFound(id) => ClientError::NotFound(format!("line {id}")),
            other => ClientError::Validation(other.to_string()),
        }
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<PaymentError> for ClientError {
    fn from(err: PaymentError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let msg = || "x".to_string();
        assert!(matches!(ClientError::from_status(400, msg()), ClientError::Validation(_)));
        assert!(matches!(ClientError::from_status(422, msg()), ClientError::Validation(_)));
        assert!(matches!(ClientError::from_status(401, msg()), ClientError::Unauthorized(_)));
        assert!(matches!(ClientError::from_status(404, msg()), ClientError::NotFound(_)));
        assert!(matches!(ClientError::from_status(409, msg()), ClientError::Conflict(_)));
        assert!(matches!(ClientError::from_status(503, msg()), ClientError::Server(_)));
    }

    #[test]
    fn test_payment_error_is_validation() {
        let err: ClientError = CoreError::from(PaymentError::NothingToApply).into();
        assert_eq!(
            err,
            ClientError::Validation("Payment total must be greater than zero".to_string())
        );
    }
}
