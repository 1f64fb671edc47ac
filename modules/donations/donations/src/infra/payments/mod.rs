use std::sync::Arc;

use anyhow::Context;

use crate::config::{PaymentProvider, PaymentsConfig};
use crate::domain::ports::PaymentGateway;

pub mod razorpay;
pub mod test_mode;

pub use razorpay::RazorpayGateway;
pub use test_mode::TestModeGateway;

/// Build the gateway selected by `cfg.provider`.
///
/// # Errors
/// Fails when Razorpay is selected without credentials.
pub fn build_gateway(cfg: &PaymentsConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match cfg.provider {
        PaymentProvider::Test => {
            tracing::warn!("payment provider is 'test': orders are simulated and webhook signatures are not verified");
            Ok(Arc::new(TestModeGateway))
        }
        PaymentProvider::Razorpay => {
            let gateway = RazorpayGateway::from_config(cfg).context("invalid razorpay configuration")?;
            Ok(Arc::new(gateway))
        }
    }
}
