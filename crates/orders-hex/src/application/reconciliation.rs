//! Turns signed processor webhooks into lifecycle transitions.
//!
//! Only a verified `succeeded` event mutates state, and that transition is
//! idempotent, so at-least-once and out-of-order delivery are harmless.

use std::sync::Arc;

use orders_types::domain::order::PaymentStatus;
use orders_types::domain::payment::PaymentEventKind;
use orders_types::ports::order_repository::OrderRepository;
use orders_types::ports::payment_gateway::PaymentGateway;
use serde::Serialize;
use uuid::Uuid;

use crate::application::lifecycle::OrderLifecycle;
use crate::errors::AppError;

/// What happened to an accepted event. Every variant is acknowledged to the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    PaymentCompleted { order_id: Uuid },
    /// Failed or canceled attempt; the order keeps its current payment status.
    PaymentNotSettled { order_id: Uuid, kind: String },
    Ignored { kind: String },
    /// The event names an order this store does not have.
    OrderMissing { order_id: Uuid },
}

pub struct PaymentReconciler<R: OrderRepository, P: PaymentGateway> {
    lifecycle: OrderLifecycle<R>,
    gateway: Arc<P>,
}

impl<R: OrderRepository, P: PaymentGateway> PaymentReconciler<R, P> {
    pub fn new(lifecycle: OrderLifecycle<R>, gateway: Arc<P>) -> Self {
        Self { lifecycle, gateway }
    }

    pub async fn handle_event(
        &self,
        raw_payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<Outcome, AppError> {
        let event = self.gateway.verify_webhook(raw_payload, signature_header)?;
        tracing::info!(
            event_id = %event.event_id,
            kind = event.kind.as_type(),
            "webhook verified"
        );

        if let PaymentEventKind::Other(kind) = &event.kind {
            tracing::debug!(event_id = %event.event_id, kind = %kind, "event kind not handled");
            return Ok(Outcome::Ignored { kind: kind.clone() });
        }

        let order_ref = event.order_ref.as_deref().ok_or_else(|| {
            tracing::warn!(event_id = %event.event_id, "event metadata has no order_id");
            AppError::MalformedEvent(format!("event {} has no order_id metadata", event.event_id))
        })?;
        let order_id = Uuid::parse_str(order_ref).map_err(|_| {
            tracing::warn!(event_id = %event.event_id, order_ref, "order_id metadata is not a uuid");
            AppError::MalformedEvent(format!(
                "event {} carries invalid order_id {:?}",
                event.event_id, order_ref
            ))
        })?;

        match &event.kind {
            PaymentEventKind::Succeeded => {
                match self
                    .lifecycle
                    .transition_payment(order_id, PaymentStatus::Completed)
                    .await
                {
                    Ok(_) => Ok(Outcome::PaymentCompleted { order_id }),
                    Err(AppError::NotFound(_)) => {
                        tracing::warn!(
                            event_id = %event.event_id,
                            %order_id,
                            "payment succeeded for an unknown order; acknowledging"
                        );
                        Ok(Outcome::OrderMissing { order_id })
                    }
                    Err(e) => Err(e),
                }
            }
            PaymentEventKind::Failed | PaymentEventKind::Canceled => {
                tracing::info!(
                    event_id = %event.event_id,
                    %order_id,
                    kind = event.kind.as_type(),
                    "payment not settled; order left unchanged"
                );
                Ok(Outcome::PaymentNotSettled {
                    order_id,
                    kind: event.kind.as_type().to_string(),
                })
            }
            PaymentEventKind::Other(kind) => Ok(Outcome::Ignored { kind: kind.clone() }),
        }
    }
}
