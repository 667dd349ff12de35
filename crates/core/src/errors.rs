//! Core error types for the coinhub gateway.
//!
//! This module defines storage-agnostic and venue-agnostic error types. Venue
//! clients report failures as [`AdapterError`], which the exchange layer wraps
//! into [`Error::BadRequest`] with the original cause attached.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the gateway.
///
/// Authentication failures deliberately carry no detail; the reason is logged
/// at the point of rejection instead of being returned to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Exchange not found: {0}")]
    ExchangeNotFound(String),

    #[error("Trader not found: {0}")]
    TraderNotFound(String),

    #[error("Trader is disabled: {0}")]
    TraderDisabled(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Bad request: {0}")]
    BadRequest(#[from] AdapterError),

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

/// Failure reported by an exchange client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Transport failure (connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The venue answered with an error payload.
    #[error("Exchange error {code}: {message}")]
    Exchange { code: i64, message: String },

    /// Credentials were missing or rejected by the venue.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The venue answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The operation is not offered by this venue.
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn bad_request_keeps_adapter_cause() {
        let err: Error = AdapterError::Exchange {
            code: -1121,
            message: "Invalid symbol.".to_string(),
        }
        .into();

        assert_eq!(err.to_string(), "Bad request: Exchange error -1121: Invalid symbol.");
        let source = err.source().expect("cause should be attached");
        assert_eq!(source.to_string(), "Exchange error -1121: Invalid symbol.");
    }

    #[test]
    fn auth_errors_carry_no_detail() {
        assert_eq!(Error::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(Error::InvalidToken.to_string(), "Invalid token");
    }
}
