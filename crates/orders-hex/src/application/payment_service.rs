use std::sync::Arc;

use orders_types::domain::payment::{PaymentIntentHandle, PaymentIntentRequest};
use orders_types::ports::order_repository::OrderRepository;
use orders_types::ports::payment_gateway::PaymentGateway;

use crate::errors::AppError;

/// Hands out processor payment handles. Never touches order state; only a
/// verified webhook does that.
pub struct PaymentService<R: OrderRepository, P: PaymentGateway> {
    repo: Arc<R>,
    gateway: Arc<P>,
}

impl<R: OrderRepository, P: PaymentGateway> PaymentService<R, P> {
    pub fn new(repo: Arc<R>, gateway: Arc<P>) -> Self {
        Self { repo, gateway }
    }

    pub async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentHandle, AppError> {
        request.validate()?;
        let order = self
            .repo
            .get(request.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", request.order_id)))?;

        if order.is_paid() {
            tracing::info!(order_id = %order.order_id, "intent refused; order already paid");
            return Err(AppError::AlreadyPaid(format!("order {}", order.order_id)));
        }

        let handle = self.gateway.create_payment_intent(request).await?;
        tracing::info!(
            order_id = %order.order_id,
            payment_intent_id = %handle.payment_intent_id,
            amount = handle.amount,
            currency = %handle.currency,
            "payment intent issued"
        );
        Ok(handle)
    }
}
