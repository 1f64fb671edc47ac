//! Outbound ports of the domain.

use async_trait::async_trait;
use uuid::Uuid;

/// Order to open at the payment gateway for one donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub donation_id: Uuid,
    /// Minor units (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
}

impl OrderRequest {
    /// Merchant-side reference sent along with the order.
    #[must_use]
    pub fn receipt(&self) -> String {
        format!("donation_{}", self.donation_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub order_id: String,
    /// Public key the client-side checkout is opened with.
    pub key_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Transport(String),
    #[error("gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected gateway response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookRejection {
    #[error("missing webhook signature")]
    MissingSignature,
    #[error("invalid webhook signature")]
    InvalidSignature,
}

/// Payment gateway used by the donation flow.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Check the signature of a raw webhook body.
    ///
    /// # Errors
    /// [`WebhookRejection`] when the body must not be trusted.
    fn verify_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookRejection>;
}
