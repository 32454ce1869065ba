//! Order aggregate and related types.

mod aggregate;
mod item;
mod payment;

pub use aggregate::Order;
pub use item::OrderItem;
pub use payment::{Payment, PaymentKind, PaymentMethod, PaymentState};
