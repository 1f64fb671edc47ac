use async_trait::async_trait;

use crate::domain::ports::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway, WebhookRejection};

/// Gateway stand-in for development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestModeGateway;

#[async_trait]
impl PaymentGateway for TestModeGateway {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            order_id: format!("test_order_{}", request.donation_id),
            key_id: "test_key".to_owned(),
        })
    }

    fn verify_webhook(&self, _body: &[u8], _signature: Option<&str>) -> Result<(), WebhookRejection> {
        Ok(())
    }
}
