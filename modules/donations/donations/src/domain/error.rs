use donations_sdk::UnknownVariant;
use marketplace_security::{AccessDenied, UnknownRole};
use thiserror::Error;

/// Errors raised by the donations domain services.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The entity is absent or the caller may not learn that it exists.
    #[error("{detail}")]
    NotFound { entity: &'static str, detail: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    BadRequest(String),

    /// A status transition whose precondition no longer holds.
    #[error("{0}")]
    Conflict(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound {
            entity,
            detail: format!("{entity} not found"),
        }
    }

    pub fn not_found_with(entity: &'static str, detail: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            detail: detail.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<AccessDenied> for DomainError {
    fn from(e: AccessDenied) -> Self {
        Self::Forbidden(e.to_string())
    }
}

/// A stored enum column holding an unknown value means the row is corrupt.
impl From<UnknownVariant> for DomainError {
    fn from(e: UnknownVariant) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<UnknownRole> for DomainError {
    fn from(e: UnknownRole) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("json: {e}"))
    }
}
