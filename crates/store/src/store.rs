use async_trait::async_trait;
use common::{
    AddressId, CategoryId, CityId, CustomerId, OrderId, Page, PageRequest, ProductId, StateId,
};
use domain::{
    Address, Category, City, Customer, NewAddress, NewCategory, NewCustomer, NewProduct, Order,
    Product, State,
};

use crate::Result;

/// Entry point to persistence: opens units of work.
///
/// Implementations are cheap to clone and safe to share between request
/// handlers.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type UnitOfWork: UnitOfWork;

    /// Opens a new unit of work (a transaction).
    async fn begin(&self) -> Result<Self::UnitOfWork>;
}

/// A transaction-scoped handle to every repository.
///
/// Reads observe the unit of work's own uncommitted writes. Dropping the
/// unit of work without calling `commit` discards its writes.
#[async_trait]
pub trait UnitOfWork:
    CategoryRepository
    + ProductRepository
    + LocationRepository
    + CustomerRepository
    + OrderRepository
    + Send
{
    /// Makes every write of this unit of work durable and visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit of work.
    async fn rollback(self) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send {
    async fn insert_category(&mut self, category: &NewCategory) -> Result<Category>;

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists categories ordered by id.
    async fn list_categories(&mut self, page: PageRequest) -> Result<Page<Category>>;

    async fn update_category(&mut self, category: &Category) -> Result<()>;

    /// Fails with `Conflict` while products still reference the category.
    async fn delete_category(&mut self, id: CategoryId) -> Result<()>;
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product>;

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Returns the products that exist among `ids`, ordered by id.
    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait LocationRepository: Send {
    async fn insert_state(&mut self, name: &str) -> Result<State>;

    async fn insert_city(&mut self, name: &str, state_id: StateId) -> Result<City>;

    async fn find_city(&mut self, id: CityId) -> Result<Option<City>>;
}

#[async_trait]
pub trait CustomerRepository: Send {
    /// Inserts the customer with its phones and its first address.
    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<Customer>;

    async fn insert_address(
        &mut self,
        customer_id: CustomerId,
        address: &NewAddress,
    ) -> Result<Address>;

    /// Loads a customer with phones and addresses.
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>>;

    /// Lists customers ordered by name, phones and addresses included.
    async fn list_customers(&mut self, page: PageRequest) -> Result<Page<Customer>>;

    /// Persists the customer's name and email.
    async fn update_customer(&mut self, customer: &Customer) -> Result<()>;

    /// Deletes the customer with its phones and addresses. Fails with
    /// `Conflict` while orders reference the customer or its addresses.
    async fn delete_customer(&mut self, id: CustomerId) -> Result<()>;

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>>;
}

#[async_trait]
pub trait OrderRepository: Send {
    /// Inserts the order, its payment and its items, returning the new id.
    async fn insert_order(&mut self, order: &Order) -> Result<OrderId>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Like `find_order`, but holds the order's row lock until the unit of
    /// work ends, so concurrent updates of the same order run one after the
    /// other.
    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders ordered by placement time.
    async fn list_orders(&mut self, page: PageRequest) -> Result<Page<Order>>;

    /// Saves the aggregate: header, payment and items. Stored items that the
    /// aggregate no longer holds are deleted.
    async fn update_order(&mut self, order: &Order) -> Result<()>;

    /// Deletes the order together with its payment and items.
    async fn delete_order(&mut self, id: OrderId) -> Result<()>;
}
