//! Per-request tenant resolution.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::middleware::Next;
use axum::response::Response;
use donations_sdk::SiteMode;

use crate::domain::service::Services;

const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Host the client asked for: the first `X-Forwarded-Host` entry, else `Host`.
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    let forwarded = headers
        .get(X_FORWARDED_HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded.or_else(|| headers.get(HOST).and_then(|v| v.to_str().ok()))
}

/// Attach the request's [`SiteMode`]. Never rejects a request.
pub async fn resolve_site(State(services): State<Arc<Services>>, mut request: Request, next: Next) -> Response {
    let site = match request_host(request.headers()) {
        Some(host) => services.tenants.resolve_host(host).await,
        None => SiteMode::Marketplace,
    };
    if let Some(tenant) = site.tenant() {
        tracing::trace!(tenant_id = %tenant.id, "serving microsite");
    }
    request.extensions_mut().insert(site);
    next.run(request).await
}
