//! Application services.
//!
//! Each operation runs in exactly one unit of work: it is committed when the
//! operation succeeds, and dropped (rolled back) on any early return.

pub mod category;
pub mod customer;
pub mod order;

use domain::{OrderError, UnknownCode};
use store::StoreError;
use thiserror::Error;

pub use category::CategoryService;
pub use customer::CustomerService;
pub use order::{ItemLine, OrderChanges, OrderService, PlaceOrder};

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The request broke a business rule (bad code, bad quantity, ...).
    #[error("{0}")]
    InvalidArgument(String),

    /// The order aggregate rejected a change.
    #[error(transparent)]
    Order(OrderError),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowNotFound { entity, id } => ServiceError::NotFound { entity, id },
            other => ServiceError::Store(other),
        }
    }
}

impl From<UnknownCode> for ServiceError {
    fn from(err: UnknownCode) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidQuantity { .. } | OrderError::QuantityOverflow { .. } => {
                ServiceError::InvalidArgument(err.to_string())
            }
            OrderError::MissingPayment => ServiceError::Order(err),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
