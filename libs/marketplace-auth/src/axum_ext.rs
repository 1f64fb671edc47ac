//! Axum middleware and extractor for authenticated routes.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use marketplace_security::SecurityContext;

use crate::{
    errors::AuthError,
    traits::{SubjectResolver, TokenValidator},
};

/// Caller identity placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct Authz(pub SecurityContext);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(Authz)
            .ok_or_else(|| AuthError::Internal("SecurityContext missing: auth middleware not installed".to_owned()))
    }
}

#[derive(Clone)]
pub struct AuthState {
    validator: Arc<dyn TokenValidator>,
    resolver: Arc<dyn SubjectResolver>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn TokenValidator>, resolver: Arc<dyn SubjectResolver>) -> Self {
        Self { validator, resolver }
    }
}

/// Reject requests without a valid bearer token; otherwise attach the caller's
/// [`SecurityContext`] and continue.
///
/// CORS preflight requests pass through untouched.
pub async fn require_auth(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    if is_preflight_request(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        return AuthError::Unauthenticated.into_response();
    };

    let claims = match state.validator.validate(token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            return err.into_response();
        }
    };

    let ctx = match state.resolver.resolve(claims.sub).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::debug!(subject_id = %claims.sub, error = %err, "subject rejected");
            return err.into_response();
        }
    };

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_trimmed_and_required_non_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer  abc "));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
