use common::{CustomerId, Page, PageRequest};
use domain::{Customer, CustomerUpdate, NewCustomer};
use store::{CustomerRepository, LocationRepository, Store, UnitOfWork};

use super::{Result, ServiceError};

/// Service for managing customers, their phones and their addresses.
#[derive(Clone)]
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the customer together with its phones and first address.
    #[tracing::instrument(skip(self, customer), fields(name = %customer.name))]
    pub async fn insert(&self, customer: NewCustomer) -> Result<Customer> {
        let mut uow = self.store.begin().await?;

        let city_id = customer.address.city_id;
        if uow.find_city(city_id).await?.is_none() {
            return Err(ServiceError::not_found("City", city_id));
        }

        let customer = uow.insert_customer(&customer).await?;
        uow.commit().await?;

        metrics::counter!("customers_created_total").increment(1);
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Lists customers sorted by name.
    #[tracing::instrument(skip(self))]
    pub async fn find_page(&self, page: PageRequest) -> Result<Page<Customer>> {
        let mut uow = self.store.begin().await?;
        let customers = uow.list_customers(page).await?;
        uow.commit().await?;
        Ok(customers)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Customer> {
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))?;
        uow.commit().await?;
        Ok(customer)
    }

    /// Changes the customer's name and email. Nothing else is touched.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: CustomerId, update: CustomerUpdate) -> Result<Customer> {
        let mut uow = self.store.begin().await?;
        let mut customer = uow
            .find_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))?;
        customer.apply(update);
        uow.update_customer(&customer).await?;
        uow.commit().await?;

        tracing::info!(customer_id = %id, "customer updated");
        Ok(customer)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        uow.delete_customer(id).await?;
        uow.commit().await?;

        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}
