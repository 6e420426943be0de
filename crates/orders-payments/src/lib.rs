//! orders-payments: payment processor adapters for the `PaymentGateway` port.

#[cfg(not(any(feature = "stripe", feature = "fake")))]
compile_error!("Enable a gateway feature: `stripe` or `fake`.");

pub mod event;
pub mod signature;

#[cfg(feature = "fake")]
pub mod fake;
#[cfg(feature = "stripe")]
pub mod stripe;

use orders_types::domain::payment::PaymentEvent;
use orders_types::ports::payment_gateway::GatewayError;

use crate::event::EventEnvelope;

/// Shared webhook path for every adapter: authenticate first, then decode.
pub fn verify_and_decode(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<PaymentEvent, GatewayError> {
    let now = chrono::Utc::now().timestamp();
    if let Err(e) = signature::verify(payload, signature_header, secret, tolerance_secs, now) {
        tracing::warn!(error = %e, payload_len = payload.len(), "webhook signature rejected");
        return Err(GatewayError::InvalidSignature(e.to_string()));
    }
    let envelope =
        EventEnvelope::parse(payload).map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;
    Ok(envelope.into_event())
}
