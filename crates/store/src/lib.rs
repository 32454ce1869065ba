//! Persistence for the storefront.
//!
//! Every service operation goes through one [`UnitOfWork`] opened from a
//! [`Store`]. Writes become visible to other units of work only after
//! [`UnitOfWork::commit`]; dropping a unit of work without committing rolls
//! it back.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PostgresStore, PostgresUnitOfWork};
pub use seed::{SeedSummary, seed_reference_data};
pub use store::{
    CategoryRepository, CustomerRepository, LocationRepository, OrderRepository,
    ProductRepository, Store, UnitOfWork,
};
