//! The only code path allowed to change `payment_status` or `order_status`.
//!
//! Payment is monotonic: `Incomplete -> Completed`, never back, and re-applying
//! `Completed` is a no-op so duplicate webhook deliveries converge. Order status
//! moves freely; going backwards is allowed but logged for an operator.

use std::sync::Arc;

use orders_types::domain::order::{Order, OrderStatus, PaymentStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

use crate::errors::AppError;

pub struct OrderLifecycle<R: OrderRepository> {
    repo: Arc<R>,
}

impl<R: OrderRepository> Clone for OrderLifecycle<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: OrderRepository> OrderLifecycle<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    async fn load(&self, id: Uuid) -> Result<Order, AppError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))
    }

    pub async fn transition_payment(
        &self,
        id: Uuid,
        target: PaymentStatus,
    ) -> Result<Order, AppError> {
        let current = self.load(id).await?;

        match (current.payment_status, target) {
            (PaymentStatus::Completed, PaymentStatus::Completed) => {
                tracing::debug!(order_id = %id, "payment already completed; nothing to apply");
                return Ok(current);
            }
            (PaymentStatus::Completed, PaymentStatus::Incomplete) => {
                tracing::warn!(order_id = %id, "refusing to revert a completed payment");
                return Err(AppError::InvalidTransition(format!(
                    "order {} payment is Completed and cannot return to Incomplete",
                    id
                )));
            }
            _ => {}
        }

        let updated = match self.repo.update_payment_status(id, target).await {
            Ok(Some(order)) => order,
            // Vanished between read and write.
            Ok(None) => return Err(AppError::NotFound(format!("order {}", id))),
            Err(e @ RepoError::PaymentRegression(_)) => {
                tracing::warn!(order_id = %id, "payment completed concurrently; revert refused");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            order_id = %id,
            from = %current.payment_status,
            to = %updated.payment_status,
            "payment status changed"
        );
        Ok(updated)
    }

    pub async fn transition_order_status(
        &self,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, AppError> {
        let current = self.load(id).await?;

        if current.order_status.is_regression_to(target) {
            tracing::warn!(
                order_id = %id,
                from = %current.order_status,
                to = %target,
                "order status moved backwards; flagging for review"
            );
        }

        let updated = self
            .repo
            .update_order_status(id, target)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
        tracing::info!(
            order_id = %id,
            from = %current.order_status,
            to = %updated.order_status,
            paid = updated.is_paid(),
            "order status changed"
        );
        Ok(updated)
    }
}
