use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::ValidationError;

pub const DEFAULT_CURRENCY: &str = "usd";

/// Processor event kinds the reconciler understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl PaymentEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => PaymentEventKind::Succeeded,
            "payment_intent.payment_failed" => PaymentEventKind::Failed,
            "payment_intent.canceled" => PaymentEventKind::Canceled,
            other => PaymentEventKind::Other(other.to_string()),
        }
    }

    pub fn as_type(&self) -> &str {
        match self {
            PaymentEventKind::Succeeded => "payment_intent.succeeded",
            PaymentEventKind::Failed => "payment_intent.payment_failed",
            PaymentEventKind::Canceled => "payment_intent.canceled",
            PaymentEventKind::Other(t) => t,
        }
    }
}

/// A webhook event whose signature has already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_id: String,
    pub kind: PaymentEventKind,
    pub payment_intent_id: Option<String>,
    /// Raw `metadata.order_id`; the reconciler decides whether it is usable.
    pub order_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub order_id: Uuid,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl PaymentIntentRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

/// What the processor hands back for a new intent; `client_secret` goes to the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntentHandle {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_from_processor_types() {
        assert_eq!(
            PaymentEventKind::from_type("payment_intent.succeeded"),
            PaymentEventKind::Succeeded
        );
        assert_eq!(
            PaymentEventKind::from_type("payment_intent.payment_failed"),
            PaymentEventKind::Failed
        );
        assert_eq!(
            PaymentEventKind::from_type("charge.refunded"),
            PaymentEventKind::Other("charge.refunded".into())
        );
        assert_eq!(PaymentEventKind::Canceled.as_type(), "payment_intent.canceled");
    }

    #[test]
    fn intent_request_defaults_currency_and_validates() {
        let req: PaymentIntentRequest = serde_json::from_str(
            r#"{"order_id":"550e8400-e29b-41d4-a716-446655440000","amount":5000}"#,
        )
        .unwrap();
        assert_eq!(req.currency, "usd");
        assert!(req.validate().is_ok());

        let zero = PaymentIntentRequest {
            amount: 0,
            ..req.clone()
        };
        assert!(zero.validate().is_err());

        let bad_currency = PaymentIntentRequest {
            currency: "dollars".into(),
            ..req
        };
        assert!(bad_currency.validate().is_err());
    }
}
