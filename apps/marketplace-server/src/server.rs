//! HTTP host: middleware stack, health probe and graceful shutdown.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use donations::DonationsModule;
use sea_orm::DatabaseConnection;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::config::ServerConfig;

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

async fn health(State(db): State<DatabaseConnection>) -> Response {
    match db.ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "degraded" }))).into_response()
        }
    }
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin");
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}

fn apply_trace_layer(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                let rid = req
                    .headers()
                    .get(request_id_header())
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    request_id = %rid,
                    status = Empty,
                    latency_ms = Empty,
                )
            })
            .on_response(|res: &Response, latency: Duration, span: &tracing::Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis());
            }),
    )
}

/// Full application router.
///
/// Runtime order, outermost first: `SetRequestId` → `PropagateRequestId` → Trace →
/// Timeout → CORS → module routes.
pub fn build_app(module: &DonationsModule, db: DatabaseConnection, cfg: &ServerConfig) -> Router {
    let health_routes = Router::new().route("/health", get(health)).with_state(db);
    let mut router = module.register_rest(Router::new()).merge(health_routes);

    if !cfg.cors_allowed_origins.is_empty() {
        router = router.layer(build_cors_layer(&cfg.cors_allowed_origins));
    }
    router = router.layer(TimeoutLayer::with_status_code(
        StatusCode::GATEWAY_TIMEOUT,
        cfg.request_timeout(),
    ));
    router = apply_trace_layer(router);
    router = router.layer(PropagateRequestIdLayer::new(request_id_header()));
    router.layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
}

/// Serve until Ctrl-C or SIGTERM, then drain in-flight requests.
///
/// # Errors
/// Fails when the address cannot be bound or the server stops abnormally.
pub async fn serve(app: Router, cfg: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "marketplace server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated abnormally")?;
    tracing::info!("marketplace server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        () = wait_ctrl_c() => {}
        () = wait_sigterm() => {}
    }
    tracing::info!("Shutdown signal received, initiating graceful shutdown");
}

async fn wait_ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(%e, "Error handling Ctrl+C signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_sigterm() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        Err(e) => {
            tracing::error!(%e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_sigterm() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use donations::{DonationsConfig, PaymentsConfig};
    use marketplace_auth::JwtSettings;
    use sea_orm::{ConnectOptions, Database};
    use secrecy::SecretString;
    use tower::ServiceExt;

    async fn app(cfg: &ServerConfig) -> Router {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.unwrap();
        DonationsModule::migrate(&db).await.unwrap();
        let jwt = JwtSettings {
            secret: SecretString::from("server-test"),
            issuer: None,
            leeway_secs: 0,
        };
        let module =
            DonationsModule::from_config(db.clone(), &jwt, &PaymentsConfig::default(), DonationsConfig::default())
                .unwrap();
        build_app(&module, db, cfg)
    }

    #[tokio::test]
    async fn health_and_request_id() {
        let app = app(&ServerConfig::default()).await;
        let res = app
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let rid = res.headers().get("x-request-id").expect("request id propagated");
        assert!(!rid.is_empty());
    }

    #[tokio::test]
    async fn incoming_request_id_is_kept() {
        let app = app(&ServerConfig::default()).await;
        let res = app
            .oneshot(
                HttpRequest::get("/api/v1/public/categories")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn cors_preflight_for_allowed_origin() {
        let cfg = ServerConfig {
            cors_allowed_origins: vec!["https://hopetrust.org".to_owned()],
            ..ServerConfig::default()
        };
        let app = app(&cfg).await;
        let res = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/public/causes")
                    .header("origin", "https://hopetrust.org")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["access-control-allow-origin"], "https://hopetrust.org");
    }
}
