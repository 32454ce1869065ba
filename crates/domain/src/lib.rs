//! Domain layer for the storefront.
//!
//! This crate holds the entities and their invariants, free of any I/O:
//! - catalog entities (categories and products) and locations (states, cities)
//! - customers with their addresses and phones
//! - the `Order` aggregate, which owns its items and its payment
//! - `Money` and the code-backed enums exchanged with clients

pub mod catalog;
pub mod customer;
pub mod error;
pub mod location;
pub mod money;
pub mod order;

pub use catalog::{Category, NewCategory, NewProduct, Product};
pub use common::{AddressId, CategoryId, CityId, CustomerId, OrderId, ProductId, StateId};
pub use customer::{Address, Customer, CustomerKind, CustomerUpdate, NewAddress, NewCustomer};
pub use error::{OrderError, UnknownCode};
pub use location::{City, State};
pub use money::Money;
pub use order::{Order, OrderItem, Payment, PaymentKind, PaymentMethod, PaymentState};
