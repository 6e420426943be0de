pub mod lifecycle;
pub mod order_service;
pub mod payment_service;
pub mod reconciliation;
