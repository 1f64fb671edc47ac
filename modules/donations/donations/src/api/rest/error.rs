//! `DomainError` to Problem mapping.

use marketplace_errors::{ErrDef, Problem};

use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, Problem>;

macro_rules! err_def {
    ($name:ident, $status:literal, $title:literal, $code:literal, $slug:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://docs.marketplace.dev/problems/", $slug),
        };
    };
}

/// Error catalog of the donations API.
pub mod catalog {
    use super::ErrDef;

    err_def!(NOT_FOUND, 404, "Not Found", "donations.not_found", "not-found");
    err_def!(FORBIDDEN, 403, "Forbidden", "donations.forbidden", "forbidden");
    err_def!(VALIDATION, 400, "Validation Failed", "donations.validation", "validation");
    err_def!(BAD_REQUEST, 400, "Bad Request", "donations.bad_request", "bad-request");
    err_def!(CONFLICT, 409, "Conflict", "donations.conflict", "conflict");
    err_def!(GATEWAY, 500, "Payment Gateway Error", "donations.gateway", "gateway");
    err_def!(INTERNAL, 500, "Internal Server Error", "donations.internal", "internal");
}

/// Problem for a malformed request that never reached a service.
pub fn bad_request(detail: impl Into<String>) -> Problem {
    catalog::BAD_REQUEST.as_problem(detail)
}

pub fn validation(field: &str, message: impl Into<String>) -> Problem {
    let message = message.into();
    catalog::VALIDATION
        .as_problem(format!("Validation error on '{field}': {message}"))
        .with_violation(field, message)
}

pub fn domain_error_to_problem(e: &DomainError) -> Problem {
    match e {
        DomainError::NotFound { detail, .. } => catalog::NOT_FOUND.as_problem(detail.as_str()),
        DomainError::Forbidden(msg) => {
            tracing::debug!(reason = %msg, "access forbidden");
            catalog::FORBIDDEN.as_problem(msg.as_str())
        }
        DomainError::Validation { field, message } => validation(field, message.as_str()),
        DomainError::BadRequest(msg) => catalog::BAD_REQUEST.as_problem(msg.as_str()),
        DomainError::Conflict(msg) => catalog::CONFLICT.as_problem(msg.as_str()),
        DomainError::Gateway(msg) => {
            tracing::error!(error = %msg, "payment gateway error");
            catalog::GATEWAY.as_problem("The payment gateway could not process the request")
        }
        DomainError::Database(msg) => {
            tracing::error!(error = %msg, "database error");
            catalog::INTERNAL.as_problem("An internal database error occurred")
        }
        DomainError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            catalog::INTERNAL.as_problem("An internal error occurred")
        }
    }
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(&e)
    }
}
