use std::sync::Arc;

use crate::application::lifecycle::OrderLifecycle;
use crate::errors::AppError;
use orders_types::domain::order::{NewOrder, Order, OrderStatus};
use orders_types::ports::order_repository::OrderRepository;
use uuid::Uuid;

/// Order intake and read paths, plus the staff-facing status update.
pub struct OrderService<R: OrderRepository> {
    repo: Arc<R>,
    lifecycle: OrderLifecycle<R>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        let lifecycle = OrderLifecycle::new(repo.clone());
        Self { repo, lifecycle }
    }

    pub fn lifecycle(&self) -> &OrderLifecycle<R> {
        &self.lifecycle
    }

    pub async fn create_order(&self, input: NewOrder) -> Result<Order, AppError> {
        let order = Order::new(input)?;
        let created = self.repo.create(order).await?;
        tracing::info!(
            order_id = %created.order_id,
            items = created.items.len(),
            "order created"
        );
        Ok(created)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        match self.repo.get(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        self.lifecycle.transition_order_status(id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orders_types::domain::order::{ItemSize, NewItem, PaymentStatus};

    fn submission(name: &str, items: Vec<NewItem>) -> NewOrder {
        NewOrder {
            items,
            buyer_full_name: name.into(),
            buyer_email: "a@b.com".into(),
            buyer_phone: "555-0199".into(),
            delivery_address: "7 Rose Street".into(),
        }
    }

    fn bouquet() -> NewItem {
        NewItem {
            main_colours: vec!["red".into(), "pink".into()],
            size: ItemSize::M,
            comments: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_order_in_memory() {
        let repo = Arc::new(orders_repo::memory::InMemoryRepo::new());
        let svc = OrderService::new(repo.clone());
        let res = svc.create_order(submission("Alice", vec![bouquet()])).await;
        assert!(res.is_ok());
        let order = res.unwrap();
        let got = svc.get_order(order.order_id).await.unwrap();
        assert_eq!(got.buyer_full_name, "Alice");
        assert_eq!(got.payment_status, PaymentStatus::Incomplete);
        assert_eq!(got.order_status, OrderStatus::NotStarted);
    }

    #[tokio::test]
    async fn update_status_goes_through_lifecycle() {
        let repo = Arc::new(orders_repo::memory::InMemoryRepo::new());
        let svc = OrderService::new(repo.clone());
        let order = svc
            .create_order(submission("Bob", vec![bouquet()]))
            .await
            .unwrap();

        let updated = svc
            .update_order_status(order.order_id, OrderStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::InProgress);
        assert_eq!(updated.payment_status, PaymentStatus::Incomplete);
    }

    #[tokio::test]
    async fn validation_errors_propagate() {
        let repo = Arc::new(orders_repo::memory::InMemoryRepo::new());
        let svc = OrderService::new(repo.clone());
        let res = svc.create_order(submission("", vec![])).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert!(repo.map.is_empty());
    }

    #[tokio::test]
    async fn not_found_paths() {
        let repo = Arc::new(orders_repo::memory::InMemoryRepo::new());
        let svc = OrderService::new(repo.clone());
        let missing = svc.get_order(uuid::Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let updated = svc
            .update_order_status(uuid::Uuid::new_v4(), OrderStatus::Completed)
            .await;
        assert!(matches!(updated, Err(AppError::NotFound(_))));
    }
}
