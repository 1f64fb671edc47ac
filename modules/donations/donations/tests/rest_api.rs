#![allow(clippy::unwrap_used, clippy::expect_used)]

//! The `/api/v1` router end to end: bearer auth, site resolution, JSON and
//! multipart bodies, and Problem responses.

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use common::{BASE_URL, config, connect};
use donations::DonationsModule;
use donations::config::{PaymentProvider, PaymentsConfig};
use donations::infra::storage::seed::{SeedReport, seed_demo};
use hmac::{Hmac, Mac};
use httpmock::MockServer;
use jsonwebtoken::{EncodingKey, Header};
use marketplace_auth::{Claims, JwtSettings};
use marketplace_security::Role;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "rest-test-secret";
const WEBHOOK_SECRET: &str = "whsec_rest";
const BOUNDARY: &str = "----donations-test-boundary";

struct Api {
    router: Router,
    seed: SeedReport,
}

impl Api {
    async fn new() -> Self {
        Self::with_payments(&PaymentsConfig::default()).await
    }

    async fn with_payments(payments: &PaymentsConfig) -> Self {
        let db = connect().await;
        let seed = seed_demo(&db, BASE_URL).await.unwrap();
        let jwt = JwtSettings {
            secret: SecretString::from(JWT_SECRET.to_owned()),
            issuer: None,
            leeway_secs: 0,
        };
        let module = DonationsModule::from_config(db, &jwt, payments, config()).unwrap();
        Self {
            router: module.register_rest(Router::new()),
            seed,
        }
    }

    fn token(&self, role: Role) -> String {
        let id = self.seed.users.iter().find(|u| u.role == role).unwrap().id;
        token_for(id)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, role: Option<Role>) -> (StatusCode, Value) {
        let mut req = Request::builder().uri(uri);
        if let Some(role) = role {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", self.token(role)));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: Method, uri: &str, role: Role, body: &Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(role)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn webhook(&self, body: &str, signature: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/donations/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            req = req.header("x-razorpay-signature", signature);
        }
        self.send(req.body(Body::from(body.to_owned())).unwrap()).await
    }
}

fn token_for(user_id: Uuid) -> String {
    let claims = Claims::for_subject(user_id, time::Duration::minutes(5));
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

fn captured(order_id: &str) -> String {
    json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": { "id": "pay_rest", "order_id": order_id } } }
    })
    .to_string()
}

fn multipart(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let api = Api::new().await;

    let (status, body) = api.get("/api/v1/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let req = Request::builder()
        .uri("/api/v1/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Uuid::now_v7())))
        .body(Body::empty())
        .unwrap();
    let (status, _) = api.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = api.get("/api/v1/me", Some(Role::Vendor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "vendor.alpha@example.com");
    assert_eq!(body["memberships"][0]["role"], "VENDOR");
    assert_eq!(body["memberships"][0]["vendor_id"], api.seed.vendor_id.to_string());
}

#[tokio::test]
async fn test_public_routes_resolve_the_site() {
    let api = Api::new().await;

    let (status, body) = api.get("/api/v1/public/tenants/by-host?host=hopetrust.local", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "microsite");
    assert_eq!(body["tenant"]["slug"], "hope-trust");
    assert_eq!(body["theme"]["brand_name"], "Hope Trust");

    let (_, body) = api.get("/api/v1/public/tenants/by-host?host=unknown.local", None).await;
    assert_eq!(body, json!({ "mode": "marketplace" }));

    let (status, body) = api.get("/api/v1/public/causes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["type"], "VENDOR");
    assert_eq!(body[0]["status"], "LIVE");

    let req = Request::builder()
        .uri("/api/v1/public/causes")
        .header("x-forwarded-host", "careworks.local")
        .header(header::HOST, "internal:8080")
        .body(Body::empty())
        .unwrap();
    let (status, body) = api.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = api.get("/api/v1/public/ngos", None).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, ["care-works", "hope-trust"]);

    let (status, body) = api.get("/api/v1/public/tenants/no-such-ngo", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "donations.not_found");
}

#[tokio::test]
async fn test_donation_checkout_and_webhook() {
    let api = Api::new().await;
    let cause_id = api.seed.cause_id;

    let (status, init) = api
        .json(
            Method::POST,
            "/api/v1/donations/init",
            Role::Donor,
            &json!({ "cause_id": cause_id, "amount": "500.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{init}");
    assert_eq!(init["amount"], 50_000);
    assert_eq!(init["currency"], "INR");
    let donation_id = init["donation_id"].as_str().unwrap().to_owned();
    let order_id = init["order_id"].as_str().unwrap().to_owned();

    let receipt_uri = format!("/api/v1/donations/{donation_id}/receipt");
    let (status, body) = api.get(&receipt_uri, Some(Role::Donor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Donation not completed");

    for _ in 0..2 {
        let (status, body) = api.webhook(&captured(&order_id), Some("ignored-in-test-mode")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success" }));
    }

    let (status, receipt) = api.get(&receipt_uri, Some(Role::Donor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["payment_id"], "pay_rest");
    assert_eq!(receipt["donor_name"], "Arya Donor");

    let (_, cause) = api.get(&format!("/api/v1/public/causes/{cause_id}"), None).await;
    assert_eq!(cause["raised_amount"].as_str().unwrap().parse::<Decimal>().unwrap(), Decimal::new(500, 0));

    let (status, _) = api.get(&receipt_uri, Some(Role::NgoStaff)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = api.webhook("{not json", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "donations.bad_request");
}

#[tokio::test]
async fn test_out_of_range_amounts_are_validation_problems() {
    let api = Api::new().await;
    let cause_id = api.seed.cause_id;

    for amount in ["79228162514264337593543950335", "10000000000000", "0.001"] {
        let (status, body) = api
            .json(
                Method::POST,
                "/api/v1/donations/init",
                Role::Donor,
                &json!({ "cause_id": cause_id, "amount": amount }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}: {body}");
        assert_eq!(body["code"], "donations.validation");
    }
}

#[tokio::test]
async fn test_ngo_members_list_tenant_donations() {
    let api = Api::new().await;
    let (status, init) = api
        .json(
            Method::POST,
            "/api/v1/donations/init",
            Role::Donor,
            &json!({ "cause_id": api.seed.cause_id, "amount": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{init}");
    let donor_id = api.seed.users.iter().find(|u| u.role == Role::Donor).unwrap().id;

    let (status, body) = api.get("/api/v1/ngo/donations", Some(Role::NgoStaff)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], init["donation_id"]);
    assert_eq!(body[0]["donor_user_id"], donor_id.to_string());
    assert_eq!(body[0]["status"], "INIT");

    let (status, body) = api.get("/api/v1/ngo/donations?status=CAPTURED", Some(Role::NgoAdmin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    for role in [Role::Donor, Role::Vendor] {
        let (status, body) = api.get("/api/v1/ngo/donations", Some(role)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}: {body}");
    }
}

#[tokio::test]
async fn test_invoice_submission_and_approval_over_http() {
    let api = Api::new().await;
    let cause_id = api.seed.cause_id.to_string();
    let vendor_id = api.seed.vendor_id.to_string();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/vendor-invoices")
        .header(header::AUTHORIZATION, format!("Bearer {}", api.token(Role::Vendor)))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart(
            &[
                ("cause_id", cause_id.as_str()),
                ("vendor_id", vendor_id.as_str()),
                ("number", "INV-77"),
                ("amount", "1250.50"),
            ],
            &[("bill.pdf", &b"%PDF-1.4 bill"[..])],
        ))
        .unwrap();
    let (status, invoice) = api.send(req).await;
    assert_eq!(status, StatusCode::OK, "{invoice}");
    assert_eq!(invoice["status"], "SUBMITTED");
    assert_eq!(invoice["files"].as_array().unwrap().len(), 1);
    let invoice_id = invoice["id"].as_str().unwrap().to_owned();

    let approve = format!("/api/v1/vendor-invoices/{invoice_id}/approve");
    let (status, _) = api.json(Method::PATCH, &approve, Role::NgoStaff, &json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, outcome) = api.json(Method::PATCH, &approve, Role::NgoAdmin, &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["invoice_id"], invoice_id);
    assert_eq!(outcome["status"], "NGO_APPROVED");
    assert_eq!(outcome["payout_status"], "QUEUED");

    let (status, body) = api.json(Method::PATCH, &approve, Role::NgoAdmin, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "donations.conflict");

    let payout_uri = format!("/api/v1/payouts/{}", outcome["payout_id"].as_str().unwrap());
    let (status, payout) = api.get(&payout_uri, Some(Role::Vendor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payout["to_type"], "VENDOR");
    assert_eq!(payout["source_type"], "VENDOR_INVOICE");

    let (status, _) = api.get(&payout_uri, Some(Role::Donor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, list) = api.get("/api/v1/vendor-invoices?status=NGO_APPROVED", Some(Role::Vendor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_multipart_validation_errors_are_problems() {
    let api = Api::new().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/vendor-invoices")
        .header(header::AUTHORIZATION, format!("Bearer {}", api.token(Role::Vendor)))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart(&[("cause_id", "not-a-uuid")], &[]))
        .unwrap();
    let (status, body) = api.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "donations.validation");
    assert_eq!(body["errors"][0]["field"], "cause_id");
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let api = Api::new().await;

    let (status, _) = api
        .json(
            Method::POST,
            "/api/v1/admin/tenants",
            Role::NgoAdmin,
            &json!({ "name": "River Aid", "slug": "river-aid" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, tenant) = api
        .json(
            Method::POST,
            "/api/v1/admin/tenants",
            Role::PlatformAdmin,
            &json!({ "name": "River Aid", "slug": "river-aid" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tenant["slug"], "river-aid");

    let (status, _) = api.get("/api/v1/admin/audit?entity=tenant", Some(Role::NgoAdmin)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, audit) = api.get("/api/v1/admin/audit?entity=tenant", Some(Role::PlatformAdmin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit[0]["action"], "create");
    assert_eq!(audit[0]["entity_id"], tenant["id"]);
}

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn test_razorpay_webhook_signature_is_enforced() {
    let server = MockServer::start_async().await;
    let payments = PaymentsConfig {
        provider: PaymentProvider::Razorpay,
        key_id: Some("rzp_test_key".to_owned()),
        key_secret: Some(SecretString::from("rzp_secret".to_owned())),
        webhook_secret: Some(SecretString::from(WEBHOOK_SECRET.to_owned())),
        api_base_url: server.base_url(),
        request_timeout_secs: 5,
    };
    let api = Api::with_payments(&payments).await;
    let body = captured("order_unknown");

    let (status, _) = api.webhook(&body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api.webhook(&body, Some(&sign("tampered"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ack) = api.webhook(&body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
}
