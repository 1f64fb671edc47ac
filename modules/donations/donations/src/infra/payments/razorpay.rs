//! Razorpay Orders API client and webhook signature check.

use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::PaymentsConfig;
use crate::domain::ports::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway, WebhookRejection};

type HmacSha256 = Hmac<Sha256>;

pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: SecretString,
    webhook_secret: SecretString,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
    notes: OrderNotes,
}

#[derive(Serialize)]
struct OrderNotes {
    donation_id: String,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
}

impl RazorpayGateway {
    /// # Errors
    /// Missing `key_id`/`key_secret`, or an HTTP client that cannot be built.
    pub fn from_config(cfg: &PaymentsConfig) -> anyhow::Result<Self> {
        let Some(key_id) = cfg.key_id.clone().filter(|k| !k.is_empty()) else {
            bail!("payments.key_id is required for the razorpay provider");
        };
        let Some(key_secret) = cfg.key_secret.clone() else {
            bail!("payments.key_secret is required for the razorpay provider");
        };
        let webhook_secret = cfg.webhook_secret.clone().unwrap_or_else(|| key_secret.clone());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_owned(),
            key_id,
            key_secret,
            webhook_secret,
        })
    }

    fn signature_of(&self, body: &[u8]) -> Result<HmacSha256, WebhookRejection> {
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.expose_secret().as_bytes())
            .map_err(|_| WebhookRejection::InvalidSignature)?;
        mac.update(body);
        Ok(mac)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let body = CreateOrderBody {
            amount: request.amount_minor,
            currency: &request.currency,
            receipt: request.receipt(),
            notes: OrderNotes {
                donation_id: request.donation_id.to_string(),
            },
        };
        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let order: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        tracing::debug!(order_id = %order.id, donation_id = %request.donation_id, "razorpay order created");
        Ok(GatewayOrder {
            order_id: order.id,
            key_id: self.key_id.clone(),
        })
    }

    fn verify_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookRejection> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookRejection::MissingSignature)?;
        let expected = hex::decode(signature).map_err(|_| WebhookRejection::InvalidSignature)?;
        self.signature_of(body)?
            .verify_slice(&expected)
            .map_err(|_| WebhookRejection::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::PaymentProvider;
    use httpmock::prelude::*;
    use uuid::Uuid;

    fn config(base_url: &str) -> PaymentsConfig {
        PaymentsConfig {
            provider: PaymentProvider::Razorpay,
            key_id: Some("rzp_test_key".to_owned()),
            key_secret: Some(SecretString::from("rzp_secret")),
            webhook_secret: Some(SecretString::from("whsec")),
            api_base_url: base_url.to_owned(),
            request_timeout_secs: 5,
        }
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn creates_order_with_minor_units_and_basic_auth() {
        let server = MockServer::start_async().await;
        let donation_id = Uuid::now_v7();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/orders")
                    .header_exists("authorization")
                    .json_body_includes(format!(
                        r#"{{"amount": 50000, "currency": "INR", "receipt": "donation_{donation_id}"}}"#
                    ));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({"id": "order_Abc123", "amount": 50000, "currency": "INR"}));
            })
            .await;

        let gateway = RazorpayGateway::from_config(&config(&server.base_url())).unwrap();
        let order = gateway
            .create_order(&OrderRequest {
                donation_id,
                amount_minor: 50_000,
                currency: "INR".to_owned(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(order.order_id, "order_Abc123");
        assert_eq!(order.key_id, "rzp_test_key");
    }

    #[tokio::test]
    async fn gateway_rejection_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/orders");
                then.status(401).body(r#"{"error":{"code":"BAD_REQUEST_ERROR"}}"#);
            })
            .await;

        let gateway = RazorpayGateway::from_config(&config(&server.base_url())).unwrap();
        let err = gateway
            .create_order(&OrderRequest {
                donation_id: Uuid::now_v7(),
                amount_minor: 100,
                currency: "INR".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 401, .. }));
    }

    #[test]
    fn webhook_signature_is_hmac_sha256_hex() {
        let gateway = RazorpayGateway::from_config(&config("http://localhost")).unwrap();
        let body = br#"{"event":"payment.captured"}"#;

        assert!(gateway.verify_webhook(body, Some(&sign("whsec", body))).is_ok());
        assert_eq!(
            gateway.verify_webhook(body, Some(&sign("other", body))),
            Err(WebhookRejection::InvalidSignature)
        );
        assert_eq!(
            gateway.verify_webhook(body, Some("not-hex")),
            Err(WebhookRejection::InvalidSignature)
        );
        assert_eq!(gateway.verify_webhook(body, None), Err(WebhookRejection::MissingSignature));
    }

    #[test]
    fn webhook_secret_defaults_to_key_secret() {
        let mut cfg = config("http://localhost");
        cfg.webhook_secret = None;
        let gateway = RazorpayGateway::from_config(&cfg).unwrap();
        let body = b"{}";
        assert!(gateway.verify_webhook(body, Some(&sign("rzp_secret", body))).is_ok());
    }

    #[test]
    fn credentials_are_required() {
        let mut cfg = config("http://localhost");
        cfg.key_id = None;
        assert!(RazorpayGateway::from_config(&cfg).is_err());
    }
}
