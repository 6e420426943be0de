pub mod order_repository;
pub mod payment_gateway;
