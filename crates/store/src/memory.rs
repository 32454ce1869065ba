use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    AddressId, CategoryId, CityId, CustomerId, OrderId, Page, PageRequest, ProductId,
    SortDirection, StateId,
};
use domain::{
    Address, Category, City, Customer, NewAddress, NewCategory, NewCustomer, NewProduct, Order,
    Product, State,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    store::{
        CategoryRepository, CustomerRepository, LocationRepository, OrderRepository,
        ProductRepository, Store, UnitOfWork,
    },
};

/// Every table of the in-memory store.
#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    states: BTreeMap<StateId, State>,
    cities: BTreeMap<CityId, City>,
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, Order>,
    sequences: Sequences,
}

/// Last identifier handed out per table.
#[derive(Debug, Clone, Default)]
struct Sequences {
    category: i64,
    product: i64,
    state: i64,
    city: i64,
    customer: i64,
    address: i64,
    order: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

impl Tables {
    fn address(&self, id: AddressId) -> Option<&Address> {
        self.customers
            .values()
            .flat_map(|c| c.addresses.iter())
            .find(|a| a.id == id)
    }

    fn check_order_references(&self, order: &Order) -> Result<()> {
        if !self.customers.contains_key(&order.customer_id()) {
            return Err(StoreError::Conflict(format!(
                "customer {} does not exist",
                order.customer_id()
            )));
        }
        if self.address(order.delivery_address_id()).is_none() {
            return Err(StoreError::Conflict(format!(
                "address {} does not exist",
                order.delivery_address_id()
            )));
        }
        if let Some(item) = order
            .items()
            .find(|item| !self.products.contains_key(&item.product_id))
        {
            return Err(StoreError::Conflict(format!(
                "product {} does not exist",
                item.product_id
            )));
        }
        Ok(())
    }
}

/// In-memory store for tests and local development.
///
/// A unit of work holds the tables exclusively for its whole lifetime and
/// writes to a private copy, which replaces the tables on commit. Units of
/// work are therefore fully serialized.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();
        Ok(InMemoryUnitOfWork { committed, working })
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self) -> Result<()> {
        let InMemoryUnitOfWork {
            mut committed,
            working,
        } = self;
        *committed = working;
        tracing::debug!("in-memory unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!("in-memory unit of work rolled back");
        Ok(())
    }
}

fn sorted_page<T>(mut rows: Vec<T>, page: PageRequest) -> Page<T> {
    if page.sort_direction() == SortDirection::Desc {
        rows.reverse();
    }
    page.slice(rows)
}

#[async_trait]
impl CategoryRepository for InMemoryUnitOfWork {
    async fn insert_category(&mut self, category: &NewCategory) -> Result<Category> {
        let id = CategoryId::new(next(&mut self.working.sequences.category));
        let category = Category {
            id,
            name: category.name.clone(),
        };
        self.working.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn list_categories(&mut self, page: PageRequest) -> Result<Page<Category>> {
        let rows = self.working.categories.values().cloned().collect();
        Ok(sorted_page(rows, page))
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        let stored = self
            .working
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| StoreError::row_not_found("Category", category.id))?;
        *stored = category.clone();
        Ok(())
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        if self.working.products.values().any(|p| p.in_category(id)) {
            return Err(StoreError::Conflict(format!(
                "category {id} is referenced by products"
            )));
        }
        self.working
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::row_not_found("Category", id))
    }
}

#[async_trait]
impl ProductRepository for InMemoryUnitOfWork {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product> {
        if let Some(missing) = product
            .category_ids
            .iter()
            .find(|id| !self.working.categories.contains_key(*id))
        {
            return Err(StoreError::Conflict(format!(
                "category {missing} does not exist"
            )));
        }
        let id = ProductId::new(next(&mut self.working.sequences.product));
        let product = Product {
            id,
            name: product.name.clone(),
            price: product.price,
            category_ids: product.category_ids.clone(),
        };
        self.working.products.insert(id, product.clone());
        Ok(product)
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>> {
        Ok(self
            .working
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LocationRepository for InMemoryUnitOfWork {
    async fn insert_state(&mut self, name: &str) -> Result<State> {
        let id = StateId::new(next(&mut self.working.sequences.state));
        let state = State {
            id,
            name: name.to_string(),
        };
        self.working.states.insert(id, state.clone());
        Ok(state)
    }

    async fn insert_city(&mut self, name: &str, state_id: StateId) -> Result<City> {
        if !self.working.states.contains_key(&state_id) {
            return Err(StoreError::Conflict(format!(
                "state {state_id} does not exist"
            )));
        }
        let id = CityId::new(next(&mut self.working.sequences.city));
        let city = City {
            id,
            name: name.to_string(),
            state_id,
        };
        self.working.cities.insert(id, city.clone());
        Ok(city)
    }

    async fn find_city(&mut self, id: CityId) -> Result<Option<City>> {
        Ok(self.working.cities.get(&id).cloned())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryUnitOfWork {
    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<Customer> {
        let id = CustomerId::new(next(&mut self.working.sequences.customer));
        self.working.customers.insert(
            id,
            Customer {
                id,
                name: customer.name.clone(),
                email: customer.email.clone(),
                document: customer.document.clone(),
                kind: customer.kind,
                phones: customer.phones.clone(),
                addresses: Vec::new(),
            },
        );
        self.insert_address(id, &customer.address).await?;

        self.working
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::row_not_found("Customer", id))
    }

    async fn insert_address(
        &mut self,
        customer_id: CustomerId,
        address: &NewAddress,
    ) -> Result<Address> {
        if !self.working.cities.contains_key(&address.city_id) {
            return Err(StoreError::Conflict(format!(
                "city {} does not exist",
                address.city_id
            )));
        }
        let id = AddressId::new(next(&mut self.working.sequences.address));
        let customer = self
            .working
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| StoreError::Conflict(format!("customer {customer_id} does not exist")))?;
        let address = Address {
            id,
            customer_id,
            street: address.street.clone(),
            number: address.number.clone(),
            complement: address.complement.clone(),
            district: address.district.clone(),
            postal_code: address.postal_code.clone(),
            city_id: address.city_id,
        };
        customer.addresses.push(address.clone());
        Ok(address)
    }

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn list_customers(&mut self, page: PageRequest) -> Result<Page<Customer>> {
        let mut rows: Vec<Customer> = self.working.customers.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(sorted_page(rows, page))
    }

    async fn update_customer(&mut self, customer: &Customer) -> Result<()> {
        let stored = self
            .working
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| StoreError::row_not_found("Customer", customer.id))?;
        stored.name = customer.name.clone();
        stored.email = customer.email.clone();
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        let customer = self
            .working
            .customers
            .get(&id)
            .ok_or_else(|| StoreError::row_not_found("Customer", id))?;

        let referenced = self.working.orders.values().any(|order| {
            order.customer_id() == id || customer.address(order.delivery_address_id()).is_some()
        });
        if referenced {
            return Err(StoreError::Conflict(format!(
                "customer {id} is referenced by orders"
            )));
        }

        self.working.customers.remove(&id);
        Ok(())
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>> {
        Ok(self.working.address(id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryUnitOfWork {
    async fn insert_order(&mut self, order: &Order) -> Result<OrderId> {
        self.working.check_order_references(order)?;

        let id = OrderId::new(next(&mut self.working.sequences.order));
        let mut stored = order.clone();
        stored.assign_id(id);
        self.working.orders.insert(id, stored);
        Ok(id)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>> {
        // The unit of work already holds the tables exclusively.
        self.find_order(id).await
    }

    async fn list_orders(&mut self, page: PageRequest) -> Result<Page<Order>> {
        let mut rows: Vec<Order> = self.working.orders.values().cloned().collect();
        rows.sort_by_key(|o| (o.placed_at(), o.id()));
        Ok(sorted_page(rows, page))
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        let id = order.id().ok_or(StoreError::Unpersisted("Order"))?;
        if !self.working.orders.contains_key(&id) {
            return Err(StoreError::row_not_found("Order", id));
        }
        self.working.check_order_references(order)?;

        // The aggregate is stored whole, so detached items disappear with it.
        self.working.orders.insert(id, order.clone());
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<()> {
        self.working
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::row_not_found("Order", id))
    }
}
