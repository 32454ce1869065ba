//! Shared types used across the storefront crates.

pub mod paging;
pub mod types;

pub use paging::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest, SortDirection};
pub use types::{AddressId, CategoryId, CityId, CustomerId, OrderId, ProductId, StateId};
