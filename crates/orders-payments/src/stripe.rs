//! Stripe over its REST API; no SDK.

use std::time::Duration;

use async_trait::async_trait;
use orders_types::domain::payment::{PaymentEvent, PaymentIntentHandle, PaymentIntentRequest};
use orders_types::ports::payment_gateway::{GatewayError, PaymentGateway};
use serde::Deserialize;

use crate::event::ORDER_ID_METADATA_KEY;
use crate::signature::DEFAULT_TOLERANCE_SECS;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub api_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub timeout: Duration,
    pub tolerance_secs: i64,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }
}

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Processor(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentHandle, GatewayError> {
        let amount = request.amount.to_string();
        let order_id = request.order_id.to_string();
        let metadata_key = format!("metadata[{ORDER_ID_METADATA_KEY}]");
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            (metadata_key.as_str(), order_id.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let res = self
            .client
            .post(self.endpoint("/v1/payment_intents"))
            .basic_auth(&self.config.api_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Processor(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("status {status}"));
            tracing::warn!(%status, order_id = %request.order_id, %message, "payment intent rejected");
            return Err(GatewayError::Processor(message));
        }

        let intent: IntentResponse = res
            .json()
            .await
            .map_err(|e| GatewayError::Processor(e.to_string()))?;
        tracing::info!(
            order_id = %request.order_id,
            payment_intent_id = %intent.id,
            "payment intent created"
        );
        Ok(PaymentIntentHandle {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, GatewayError> {
        crate::verify_and_decode(
            payload,
            signature_header,
            &self.config.webhook_secret,
            self.config.tolerance_secs,
        )
    }
}
