use async_trait::async_trait;

use crate::domain::payment::{PaymentEvent, PaymentIntentHandle, PaymentIntentRequest};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
    #[error("payment processor error: {0}")]
    Processor(String),
}

/// Outbound port to the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Asks the processor for a new intent tagged with the order id.
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentHandle, GatewayError>;

    /// Authenticates a webhook delivery and decodes it. Nothing from an
    /// unverified payload is ever returned.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, GatewayError>;
}
