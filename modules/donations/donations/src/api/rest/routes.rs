//! `/api/v1` route table.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use marketplace_auth::{AuthState, require_auth};

use super::handlers::{audit, catalog, donations, identity, invoices, payouts, receipts, tenants, vendors};
use super::site::resolve_site;
use crate::domain::service::Services;

pub const API_PREFIX: &str = "/api/v1";

/// Anonymous endpoints: storefront reads and the gateway webhook.
fn public_routes() -> Router {
    Router::new()
        .route("/public/ngos", get(tenants::list_public_tenants))
        .route("/public/tenants/by-host", get(tenants::site_by_host))
        .route("/public/tenants/{slug}", get(tenants::tenant_by_slug))
        .route("/public/causes", get(catalog::list_public_causes))
        .route("/public/causes/{id}", get(catalog::get_public_cause))
        .route("/public/categories", get(catalog::list_categories))
        .route("/donations/webhook", post(donations::payment_webhook))
}

fn protected_routes(auth: AuthState) -> Router {
    Router::new()
        .route("/me", get(identity::get_me))
        .route("/memberships", post(identity::grant_membership))
        .route("/admin/tenants", post(tenants::create_tenant))
        .route("/tenants/{id}/domains", post(tenants::add_domain))
        .route("/admin/domains/{id}/status", patch(tenants::set_domain_status))
        .route("/tenants/{id}/policy", get(tenants::get_policy))
        .route("/admin/categories", post(catalog::create_category))
        .route("/causes", post(catalog::create_cause))
        .route("/causes/{id}/status", patch(catalog::set_cause_status))
        .route("/causes/{id}/vendors", post(vendors::link_vendor))
        .route("/donations", get(donations::list_my_donations))
        .route("/donations/init", post(donations::init_donation))
        .route("/donations/{id}/receipt", get(donations::donation_receipt))
        .route("/ngo/donations", get(donations::list_tenant_donations))
        .route("/vendors", get(vendors::list_vendors).post(vendors::create_vendor))
        .route("/vendor-invoices", get(invoices::list_invoices).post(invoices::submit_invoice))
        .route("/vendor-invoices/{id}", get(invoices::get_invoice))
        .route("/vendor-invoices/{id}/approve", patch(invoices::approve_invoice))
        .route("/vendor-invoices/{id}/reject", patch(invoices::reject_invoice))
        .route("/ngo-receipts", get(receipts::list_receipts).post(receipts::submit_receipt))
        .route("/ngo-receipts/{id}", get(receipts::get_receipt))
        .route("/ngo-receipts/{id}/approve", patch(receipts::approve_receipt))
        .route("/ngo-receipts/{id}/reject", patch(receipts::reject_receipt))
        .route("/payouts", get(payouts::list_payouts))
        .route("/payouts/{id}", get(payouts::get_payout))
        .route("/payouts/{id}/status", patch(payouts::update_payout_status))
        .route("/admin/audit", get(audit::list_audit))
        .route_layer(from_fn_with_state(auth, require_auth))
}

/// Build the module router, nested under [`API_PREFIX`].
pub fn register_routes(router: Router, services: Arc<Services>, auth: AuthState, max_upload_bytes: usize) -> Router {
    let api = public_routes()
        .merge(protected_routes(auth))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(from_fn_with_state(Arc::clone(&services), resolve_site))
        .layer(Extension(services));
    router.nest(API_PREFIX, api)
}
