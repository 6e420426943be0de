use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use orders_types::domain::order::{Order, OrderStatus, PaymentStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub map: Arc<DashMap<Uuid, Order>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
        }
    }

    fn mutate<F>(&self, id: Uuid, apply: F) -> Option<Order>
    where
        F: FnOnce(&mut Order),
    {
        // get_mut holds the shard lock, so each update is atomic per order.
        let mut entry = self.map.get_mut(&id)?;
        apply(entry.value_mut());
        Some(entry.value().clone())
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        match self.map.entry(order.order_id) {
            Entry::Occupied(_) => Err(RepoError::AlreadyExists(order.order_id)),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(order)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.map.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self.map.iter().map(|kv| kv.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Order>, RepoError> {
        let Some(mut entry) = self.map.get_mut(&id) else {
            return Ok(None);
        };
        // Checked under the shard lock so a concurrent completion cannot be undone.
        if entry.payment_status.is_terminal() && !status.is_terminal() {
            return Err(RepoError::PaymentRegression(id));
        }
        entry.set_payment_status(status);
        Ok(Some(entry.value().clone()))
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        Ok(self.mutate(id, |o| o.set_order_status(status)))
    }
}
