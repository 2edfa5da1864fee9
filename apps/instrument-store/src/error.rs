//! Service errors surfaced at the API boundary.
//!
//! Every use case returns [`ServiceError`]. The HTTP adapter turns it into a
//! status code and a `{"error": "<message>"}` body.
//!
//! # HTTP Status Codes
//!
//! | Code | Status | Usage |
//! |------|--------|-------|
//! | `VALIDATION` | 400 | Bad input or business rule violation |
//! | `INSUFFICIENT_STOCK` | 400 | Requested units exceed stock on hand |
//! | `UNAUTHORIZED` | 401 | Missing, malformed or unknown identity |
//! | `FORBIDDEN` | 403 | Role lacks the required capability |
//! | `NOT_FOUND` | 404 | Referenced entity does not exist |
//! | `INTERNAL` | 500 | Store failure or unexpected error |

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::StoreError;
use crate::domain::shared::DomainError;

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid input or business rule violation.
    Validation,
    /// Entity not found.
    NotFound,
    /// Not enough stock for an order line.
    InsufficientStock,
    /// Caller identity missing or unknown.
    Unauthorized,
    /// Caller lacks the capability.
    Forbidden,
    /// Unexpected failure.
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation | Self::InsufficientStock => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Error returned by every use case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Bad input shape or business rule violation.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Requested quantity exceeds the stock on hand.
    #[error("Insufficient stock for {instrument}. Available stock: {available}")]
    InsufficientStock {
        /// Instrument name.
        instrument: String,
        /// Units on hand when the check failed.
        available: u32,
    },

    /// Missing or unknown caller identity.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller's role lacks the required capability.
    #[error("{0}")]
    Forbidden(String),

    /// Persistence or unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`ServiceError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message safe to show a client. Internal details stay in the log.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}
