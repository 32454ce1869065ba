//! HTTP handlers, one module per resource.

pub mod categories;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
