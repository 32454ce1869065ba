//! Domain error types.

use thiserror::Error;

/// A wire code that does not name any variant of a code-backed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid {kind} code: {code}")]
pub struct UnknownCode {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected code.
    pub code: i32,
}

/// Errors raised by the order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Quantities must be strictly positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    /// Merging a line would push its quantity past `i32::MAX`.
    #[error("Quantity for product {product_id} exceeds {max}", max = i32::MAX)]
    QuantityOverflow { product_id: i64 },

    /// The order has no payment attached, so it is not a complete aggregate.
    #[error("Order has no associated payment")]
    MissingPayment,
}
