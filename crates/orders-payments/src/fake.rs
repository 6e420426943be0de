//! In-process gateway for tests and local development. Same signature scheme as the real one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orders_types::domain::payment::{PaymentEvent, PaymentIntentHandle, PaymentIntentRequest};
use orders_types::ports::payment_gateway::{GatewayError, PaymentGateway};

use crate::event::EventEnvelope;
use crate::signature::{self, DEFAULT_TOLERANCE_SECS};

#[derive(Clone)]
pub struct FakeGateway {
    secret: String,
    intents: Arc<Mutex<Vec<PaymentIntentRequest>>>,
    unavailable: Arc<AtomicBool>,
}

impl FakeGateway {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            intents: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes subsequent intent creation fail with a processor error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Intent requests received so far.
    pub fn intents(&self) -> Vec<PaymentIntentRequest> {
        self.intents.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Serialises and signs an envelope; returns `(body, signature_header)`.
    pub fn sign_event(&self, envelope: &EventEnvelope) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(envelope).unwrap_or_default();
        let header = self.sign_raw(&body);
        (body, header)
    }

    pub fn sign_raw(&self, body: &[u8]) -> String {
        signature::sign(body, &self.secret, chrono::Utc::now().timestamp())
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentHandle, GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Processor("fake processor unavailable".into()));
        }
        let mut intents = self
            .intents
            .lock()
            .map_err(|_| GatewayError::Processor("fake intent log poisoned".into()))?;
        let payment_intent_id = format!("pi_fake_{}", intents.len() + 1);
        intents.push(request.clone());
        Ok(PaymentIntentHandle {
            client_secret: format!("{payment_intent_id}_secret"),
            payment_intent_id,
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, GatewayError> {
        crate::verify_and_decode(payload, signature_header, &self.secret, DEFAULT_TOLERANCE_SECS)
    }
}
