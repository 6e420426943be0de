//! orders-types: domain model and ports shared by the storefront adapters.

pub mod domain;
pub mod ports;
