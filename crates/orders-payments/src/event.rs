//! Processor JSON event envelope.

use std::collections::HashMap;

use orders_types::domain::payment::{PaymentEvent, PaymentEventKind};
use serde::{Deserialize, Serialize};

pub const ORDER_ID_METADATA_KEY: &str = "order_id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub object: PaymentIntentObject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentIntentObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl EventEnvelope {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Builds a payment-intent event; handy for fixtures.
    pub fn payment_intent(event_id: &str, event_type: &str, order_ref: Option<&str>) -> Self {
        let mut metadata = HashMap::new();
        if let Some(order_ref) = order_ref {
            metadata.insert(ORDER_ID_METADATA_KEY.to_string(), order_ref.to_string());
        }
        Self {
            id: event_id.to_string(),
            event_type: event_type.to_string(),
            data: EventData {
                object: PaymentIntentObject {
                    id: Some(format!("pi_{event_id}")),
                    metadata,
                    amount: None,
                    currency: None,
                },
            },
        }
    }

    pub fn into_event(self) -> PaymentEvent {
        let PaymentIntentObject { id, mut metadata, .. } = self.data.object;
        PaymentEvent {
            event_id: self.id,
            kind: PaymentEventKind::from_type(&self.event_type),
            payment_intent_id: id,
            order_ref: metadata.remove(ORDER_ID_METADATA_KEY),
        }
    }
}
