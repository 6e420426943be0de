use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus, PaymentStatus};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("order {0} already exists")]
    AlreadyExists(Uuid),
    #[error("order {0} payment is Completed and cannot return to Incomplete")]
    PaymentRegression(Uuid),
    #[error("db error: {0}")]
    DbError(String),
}

/// Storage for orders. `Ok(None)` from an update means no such order and nothing was written.
///
/// `update_payment_status` must check and write in one step: a stored `Completed`
/// is never overwritten with `Incomplete`, the write is refused with
/// `RepoError::PaymentRegression` instead.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn list(&self) -> Result<Vec<Order>, RepoError>;
    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Order>, RepoError>;
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError>;
}
